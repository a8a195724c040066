use super::problem::ProjectionProblem;
use super::settings::DasaSettings;
use super::status::DasaStatus;
use crate::algebra::*;
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use crate::timers::Timers;
use std::io::Write;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters and phase times accumulated over every engine run of one
/// context.  Times are in seconds.

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DasaStats {
    pub runs: u32,
    pub sweeps: u64,
    pub jobs: u64,
    pub factorizations: u32,
    /// incremental row and column modifications of the factor
    pub updates: u64,
    pub rows_added: u64,
    pub rows_dropped: u64,
    pub cols_freed: u64,
    pub cols_bound: u64,
    /// forward and back solve pairs
    pub solves: u64,
    pub factor_time: f64,
    pub update_time: f64,
    pub solve_time: f64,
    pub linesearch_time: f64,
    pub total_time: f64,
}

impl DasaStats {
    pub(crate) fn collect_times(&mut self, timers: &Timers) {
        self.factor_time = timers.elapsed("factor").as_secs_f64();
        self.update_time = timers.elapsed("update").as_secs_f64();
        self.solve_time = timers.elapsed("solve").as_secs_f64();
        self.linesearch_time = timers.elapsed("linesearch").as_secs_f64();
        self.total_time = timers.total_time().as_secs_f64();
    }
}

/// Statistics of an engine context together with its verbose output sink.
#[derive(Default, Debug)]
pub struct DasaInfo {
    pub stats: DasaStats,
    pub(crate) stream: PrintTarget,
}

impl ConfigurablePrintTarget for DasaInfo {
    fn print_to_stdout(&mut self) {
        self.stream.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.stream.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.stream.print_to_stream(stream)
    }
    fn print_to_sink(&mut self) {
        self.stream.print_to_sink()
    }
    fn print_to_buffer(&mut self) {
        self.stream.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.stream.get_print_buffer()
    }
}

impl DasaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn print_configuration<T: FloatT>(
        &mut self,
        settings: &DasaSettings<T>,
        prob: &ProjectionProblem<T>,
        sigma: T,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;

        writeln!(out, "\nproblem:")?;
        writeln!(out, "  variables     = {}", prob.ncols())?;
        writeln!(out, "  constraints   = {}", prob.nrows())?;
        writeln!(out, "  nnz(A)        = {}", prob.A.nnz())?;
        writeln!(out, "  blocks        = {}", prob.tree.nblocks())?;
        writeln!(out)?;

        writeln!(out, "settings:")?;
        writeln!(
            out,
            "  sigma = {:.1e} (scaled {:.1e}), tol_feas = {:.1e}",
            settings.sigma, sigma, settings.tol_feas
        )?;
        writeln!(
            out,
            "  max sweeps = {}, max outer iter = {}",
            settings.max_sweeps, settings.max_outer_iter
        )?;
        writeln!(
            out,
            "  cheap inner: {}, coorcost = {:.3}, ssorcost = {:.3}",
            _bool_on_off(settings.use_cheap_inner_method),
            settings.coorcost,
            settings.ssorcost
        )?;
        writeln!(out)?;
        Ok(())
    }

    pub(crate) fn print_run_header<T: FloatT>(
        &mut self,
        settings: &DasaSettings<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose || settings.print_level < 2 {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(out, "sweep  jobs  active   dropped  freed   refactor")?;
        writeln!(out, "-----------------------------------------------")?;
        Ok(())
    }

    pub(crate) fn print_sweep<T: FloatT>(
        &mut self,
        settings: &DasaSettings<T>,
        sweep: u32,
        njobs: usize,
        nactive: usize,
        ndropped: usize,
        nfreed: usize,
        refactored: bool,
    ) -> std::io::Result<()> {
        if !settings.verbose || settings.print_level < 2 {
            return Ok(());
        }
        writeln!(
            self.stream,
            "{:>5}  {:>4}  {:>6}  {:>8}  {:>5}   {}",
            sweep,
            njobs,
            nactive,
            ndropped,
            nfreed,
            _bool_on_off(refactored)
        )
    }

    pub(crate) fn print_run_footer<T: FloatT>(
        &mut self,
        settings: &DasaSettings<T>,
        status: DasaStatus,
        sweeps: u32,
    ) -> std::io::Result<()> {
        if !settings.verbose || settings.print_level < 1 {
            return Ok(());
        }
        writeln!(
            self.stream,
            "dasa run {}: {} after {} sweep(s)",
            self.stats.runs, status, sweeps
        )
    }

    pub(crate) fn print_footer<T: FloatT>(
        &mut self,
        settings: &DasaSettings<T>,
        status: DasaStatus,
        timers: &Timers,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let s = &self.stats;
        let out = &mut self.stream;

        writeln!(out, "-----------------------------------------------")?;
        writeln!(out, "Terminated with status = {}", status)?;
        writeln!(
            out,
            "runs = {}, sweeps = {}, factorizations = {}, updates = {}",
            s.runs, s.sweeps, s.factorizations, s.updates
        )?;
        writeln!(
            out,
            "rows added = {}, dropped = {}; columns freed = {}, bound = {}",
            s.rows_added, s.rows_dropped, s.cols_freed, s.cols_bound
        )?;
        writeln!(
            out,
            "solve time = {:?}",
            Duration::from_secs_f64(s.total_time)
        )?;
        if settings.print_level >= 2 {
            timers.print(out)?;
        }
        out.flush()
    }
}

fn _bool_on_off(v: bool) -> &'static str {
    match v {
        true => "on",
        false => "off",
    }
}
