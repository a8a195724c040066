//! Refactor-versus-update decisions from observed flop rates.

use crate::factor::FactorFlops;

/// Running flop counts of the factorization and its modifications.
///
/// Updates performed while processing the root block are "root" updates,
/// all others are "partial" updates.  Partial updates since the last
/// refactorization are charged to the estimated refactor cost.
#[derive(Debug, Clone, Default)]
pub struct FlopHistory {
    /// numeric flops of the last factorization
    pub cholflops: f64,
    /// flops to form `A_F·A_Fᵀ` at the last factorization
    pub aatflops: f64,
    /// live nonzeros of the factor after the last factorization
    pub lnnz: f64,
    pub rupflops: f64,
    pub nrup: usize,
    pub pupflops: f64,
    pub npup: usize,
    /// partial updates since the last factorization
    pub npup_old: usize,
    /// set once a factorization exists
    pub factored: bool,
}

/// Which cheap inner methods to try before the factorization based engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheapInnerAdvice {
    pub coordinate_ascent: bool,
    pub ssor: bool,
}

impl CheapInnerAdvice {
    pub fn any(&self) -> bool {
        self.coordinate_ascent || self.ssor
    }
}

/// Relative speed of an update flop against a factorization flop, from
/// the flops per nonzero of the prior factorization.
pub fn update_speed(flops: f64, lnz: f64) -> f64 {
    if lnz <= 0. {
        return 1.;
    }
    let ratio = flops / lnz;
    if ratio < 100. {
        1.
    } else if ratio < 500. {
        0.6
    } else {
        0.3333
    }
}

impl FlopHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_refactor(&mut self, flops: FactorFlops, lnnz: usize) {
        self.cholflops = flops.numeric;
        self.aatflops = flops.aat;
        self.lnnz = lnnz as f64;
        self.npup_old = 0;
        self.factored = true;
    }

    /// Charge a batch of `count` modifications costing `flops` in total.
    pub fn record_update(&mut self, flops: f64, count: usize, partial: bool) {
        if count == 0 {
            return;
        }
        if partial {
            self.pupflops += flops;
            self.npup += count;
            self.npup_old += count;
        } else {
            self.rupflops += flops;
            self.nrup += count;
        }
    }

    /// average flops of one root update
    fn root_rate(&self) -> f64 {
        if self.nrup > 0 {
            self.rupflops / self.nrup as f64
        } else {
            self.lnnz
        }
    }

    /// average flops of one partial update
    fn partial_rate(&self) -> f64 {
        if self.npup > 0 {
            self.pupflops / self.npup as f64
        } else {
            0.
        }
    }

    /// Decide whether `nmod` pending modifications on a system with
    /// `nactive` active rows are cheaper as a fresh factorization.
    pub fn should_refactor(&self, nactive: usize, nmod: usize) -> bool {
        if !self.factored || nactive <= 5 {
            return true;
        }
        let rate = self.root_rate();
        let npup_old = self.npup_old as f64;

        let refactor = 2. * self.aatflops
            + update_speed(self.cholflops, self.lnnz) * self.cholflops
            + npup_old * self.partial_rate();
        let update = (nmod as f64 + npup_old) * rate;

        update >= refactor
    }

    /// Flops spent on one update, from whichever history exists.
    pub fn flops_per_update(&self) -> f64 {
        if self.npup > 0 {
            self.pupflops / self.npup as f64
        } else if self.nrup > 0 {
            self.rupflops / self.nrup as f64
        } else {
            4. * self.lnnz
        }
    }

    /// Whether coordinate ascent or SSOR sweeps are expected to be cheaper
    /// than factor updates, given `annz` nonzeros in `A`, `nactive` active
    /// rows and `nrowadd` rows added since the last engine run.
    pub fn should_use_cheap_inner_method(
        &self,
        coorcost: f64,
        ssorcost: f64,
        annz: usize,
        nactive: usize,
        nrowadd: usize,
    ) -> CheapInnerAdvice {
        let upflops = self.flops_per_update();
        let annz = annz as f64;

        let mut advice = CheapInnerAdvice {
            coordinate_ascent: coorcost * annz <= upflops,
            ssor: ssorcost * annz <= upflops,
        };
        if nactive > 10 && (nrowadd as f64) >= 0.1 * (nactive as f64) {
            advice.coordinate_ascent = true;
            advice.ssor = true;
        }
        advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factored(chol: f64, aat: f64, lnnz: usize) -> FlopHistory {
        let mut h = FlopHistory::new();
        h.record_refactor(
            FactorFlops {
                aat,
                numeric: chol,
            },
            lnnz,
        );
        h
    }

    #[test]
    fn test_update_speed_buckets() {
        assert_eq!(update_speed(1e3, 0.), 1.);
        assert_eq!(update_speed(99., 1.), 1.);
        assert_eq!(update_speed(100., 1.), 0.6);
        assert_eq!(update_speed(499., 1.), 0.6);
        assert_eq!(update_speed(500., 1.), 0.3333);
    }

    #[test]
    fn test_refactor_without_factor_or_small_system() {
        let h = FlopHistory::new();
        assert!(h.should_refactor(100, 0));

        let h = factored(1e6, 1e6, 100);
        assert!(h.should_refactor(5, 1));
        assert!(!h.should_refactor(6, 1));
    }

    #[test]
    fn test_refactor_threshold() {
        // 5000 flops per nonzero: updates count a third of a refactor flop
        let h = factored(1e6, 0., 200);
        let refactor: f64 = 0.3333 * 1e6;

        // no update history, so one update costs lnnz flops
        let breakeven = (refactor / 200.).ceil() as usize;
        assert!(!h.should_refactor(50, breakeven - 1));
        assert!(h.should_refactor(50, breakeven));
    }

    #[test]
    fn test_partial_updates_raise_both_estimates() {
        let mut h = factored(1000., 0., 100);
        h.record_update(500., 5, false);
        assert_eq!(h.root_rate(), 100.);

        // refactor = 1000, update = 9 * 100
        assert!(!h.should_refactor(20, 9));

        // three partial updates of 10 flops each: refactor = 1030,
        // update = (9 + 3) * 100
        h.record_update(30., 3, true);
        assert_eq!(h.npup_old, 3);
        assert!(h.should_refactor(20, 9));

        // a new factorization forgets them
        h.record_refactor(
            FactorFlops {
                aat: 0.,
                numeric: 1000.,
            },
            100,
        );
        assert_eq!(h.npup_old, 0);
        assert!(!h.should_refactor(20, 9));
    }

    #[test]
    fn test_cheap_inner_advice() {
        let mut h = factored(1e4, 0., 1000);

        // no update history: 4 * lnnz = 4000 flops per update
        let a = h.should_use_cheap_inner_method(0.125, 0.5, 10000, 5, 0);
        assert_eq!(
            a,
            CheapInnerAdvice {
                coordinate_ascent: true,
                ssor: false
            }
        );
        assert!(a.any());

        h.record_update(100., 10, false);
        let a = h.should_use_cheap_inner_method(0.125, 0.5, 10000, 5, 0);
        assert!(!a.any());

        // many recently added rows force both
        let a = h.should_use_cheap_inner_method(0.125, 0.5, 10000, 20, 2);
        assert!(a.coordinate_ascent && a.ssor);
        let a = h.should_use_cheap_inner_method(0.125, 0.5, 10000, 20, 1);
        assert!(!a.any());
    }
}
