#![allow(non_snake_case)]
use super::*;
use crate::dasa::DasaSettingsBuilder;

const INF: f64 = f64::INFINITY;

// one row x₀ + x₁ over two nonnegative columns
fn single_row(bl: f64, bu: f64, y: [f64; 2]) -> ProjectionProblem<f64> {
    let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);
    ProjectionProblem::new(&A, &[bl], &[bu], &[0., 0.], &[INF, INF], &y).unwrap()
}

fn context(prob: ProjectionProblem<f64>) -> DasaContext<f64> {
    DasaContext::new(prob, DasaSettings::default()).unwrap()
}

#[test]
fn test_fresh_context() {
    let ctx = context(single_row(1., INF, [3., 1.]));
    assert_eq!(ctx.last_status(), None);
    assert_eq!(ctx.active_set().n_active_rows(), 0);
    assert_eq!(ctx.primal(), &[3., 1.]);
    assert_eq!(ctx.sigma(), 1e-8);
}

#[test]
fn test_bad_settings() {
    let mut settings = DasaSettings::<f64>::default();
    settings.max_sweeps = 0;
    let err = DasaContext::new(single_row(1., 1., [0., 0.]), settings).err();
    assert_eq!(
        err,
        Some(DasaError::Settings(SettingsError::BadFieldValue("max_sweeps")))
    );
}

#[test]
fn test_modification_requests() {
    let mut ctx = context(single_row(1., INF, [3., 1.]));

    // no finite upper side
    assert!(!ctx.add_row(0, BoundSide::Upper));
    assert!(ctx.add_row(0, BoundSide::Lower));
    assert!(!ctx.add_row(0, BoundSide::Lower));
    assert_eq!(ctx.active_set().row_status(0), RowStatus::AtLower);

    assert!(!ctx.bind_column(1, BoundSide::Upper));
    assert!(!ctx.free_column(1));
    assert!(ctx.bind_column(1, BoundSide::Lower));
    assert!(ctx.free_column(1));

    assert_eq!(ctx.log.rows_added, vec![0]);
    assert_eq!(ctx.log.cols_bound, vec![1]);
    assert_eq!(ctx.log.cols_freed, vec![1]);
}

#[test]
fn test_forced_row_drop_rhs() {
    // the row is satisfied at y, so its multiplier wants to go negative
    let mut ctx = context(single_row(1., INF, [3., 1.]));
    ctx.add_row(0, BoundSide::Lower);

    ctx.rebase();
    ctx.commit_modifications(false);
    let before = ctx.work.rhs[0];
    assert_eq!(before, -3.);

    ctx.scheduler.seed(&ctx.prob.tree, ctx.set.rows());
    let job = ctx.scheduler.jobs()[0].clone();
    let (changed, mark) = ctx.process_job(&job);

    assert!(changed);
    assert_eq!(mark, Some(0));
    assert!(!ctx.set.is_row_active(0));
    assert_eq!(ctx.lambda[0], 0.);
    assert_eq!(ctx.dlambda[0], 0.);
    assert_eq!(ctx.work.rhs[0], before - 1.);
    assert_eq!(ctx.set.recently_dropped(), &[0]);
    assert_eq!(ctx.stats().rows_dropped, 1);
}

#[test]
fn test_run_all_rows_dropped() {
    let mut ctx = context(single_row(1., INF, [3., 1.]));
    ctx.add_row(0, BoundSide::Lower);

    let status = run_dasa(&mut ctx);
    assert_eq!(status, DasaStatus::AllRowsDropped);
    assert_eq!(ctx.last_status(), Some(DasaStatus::AllRowsDropped));
    assert_eq!(ctx.stats().rows_dropped, 1);
    assert_eq!(ctx.dual(), &[0.]);
    assert_eq!(ctx.primal(), &[3., 1.]);
}

#[test]
fn test_equality_row_never_drops() {
    let mut ctx = context(single_row(1., 1., [3., 1.]));
    ctx.add_row(0, BoundSide::Upper);
    assert_eq!(ctx.active_set().row_status(0), RowStatus::Equality);

    assert_eq!(ctx.run_dasa(), DasaStatus::SolutionFound);
    assert!(ctx.active_set().is_row_active(0));
    assert!((ctx.dual()[0] + 1.5).abs() < 1e-6);

    // both columns stay free, so the primal leaves the box
    let x = ctx.primal();
    assert!((x[0] - 1.5).abs() < 1e-6);
    assert!((x[1] + 0.5).abs() < 1e-6);
}

#[test]
fn test_rerun_is_idempotent() {
    let mut ctx = context(single_row(1., 1., [3., 1.]));
    ctx.add_row(0, BoundSide::Lower);
    ctx.run_dasa();
    let stats = ctx.stats().clone();

    assert_eq!(ctx.run_dasa(), DasaStatus::SolutionFound);
    let again = ctx.stats();
    assert_eq!(again.rows_dropped, stats.rows_dropped);
    assert_eq!(again.cols_freed, stats.cols_freed);
    assert_eq!(again.factorizations, stats.factorizations);
    assert_eq!(again.updates, stats.updates);
    assert_eq!(again.runs, 2);
}

#[test]
fn test_bound_column_frees_in_line_search() {
    // projection of (3, -0.5) onto x₀ + x₁ = 4 is (3.75, 0.25)
    let mut ctx = context(single_row(4., 4., [3., -0.5]));
    ctx.add_row(0, BoundSide::Lower);
    ctx.bind_column(1, BoundSide::Lower);

    assert_eq!(ctx.run_dasa(), DasaStatus::SolutionFound);
    assert!(ctx.active_set().is_free(1));
    assert_eq!(ctx.stats().cols_freed, 1);

    let x = ctx.primal();
    assert!((x[0] - 3.75).abs() < 1e-6);
    assert!((x[1] - 0.25).abs() < 1e-6);
    assert!((ctx.dual()[0] - 0.75).abs() < 1e-6);
    assert!(ctx.factor().min_active_diagonal().unwrap() >= ctx.sigma());
}

#[test]
fn test_sweep_budget() {
    let settings = DasaSettingsBuilder::default().max_sweeps(1).build().unwrap();
    let mut ctx = DasaContext::new(single_row(4., 4., [3., -0.5]), settings).unwrap();
    ctx.add_row(0, BoundSide::Lower);
    ctx.bind_column(1, BoundSide::Lower);

    // the first sweep frees a column and needs a second one
    assert_eq!(ctx.run_dasa(), DasaStatus::MaxIterations);
    assert_eq!(ctx.stats().sweeps, 1);
}

#[test]
fn test_empty_constraints() {
    let A = CscMatrix::<f64>::spalloc(0, 3, 0);
    let prob =
        ProjectionProblem::new(&A, &[], &[], &[0.; 3], &[INF; 3], &[-1., 2., -3.]).unwrap();
    let mut ctx = context(prob);
    assert_eq!(ctx.run_dasa(), DasaStatus::AllRowsDropped);
    assert_eq!(ctx.stats().sweeps, 0);
}

#[test]
fn test_verbose_output() {
    let settings = DasaSettingsBuilder::default()
        .verbose(true)
        .print_level(2)
        .build()
        .unwrap();
    let mut ctx = DasaContext::new(single_row(1., 1., [3., 1.]), settings).unwrap();
    ctx.print_to_buffer();
    ctx.add_row(0, BoundSide::Lower);
    ctx.run_dasa();

    let text = ctx.get_print_buffer().unwrap();
    assert!(text.contains("constraints   = 1"));
    assert!(text.contains("SolutionFound"));
}

#[test]
fn test_row_drop_never_moves_step_back() {
    // x₀ + x₁ ≥ 1 and x₁ + x₂ = 1, with column 1 held at its lower bound
    // while y + Aᵀλ puts it inside the box
    let A = CscMatrix::new(2, 3, vec![0, 1, 3, 4], vec![0, 0, 1, 1], vec![1.; 4]);
    let prob = ProjectionProblem::new(
        &A,
        &[1., 1.],
        &[INF, 1.],
        &[0.; 3],
        &[INF; 3],
        &[3., 1., 0.],
    )
    .unwrap();
    let mut ctx = context(prob);
    ctx.add_row(0, BoundSide::Lower);
    ctx.add_row(1, BoundSide::Lower);
    ctx.bind_column(1, BoundSide::Lower);
    ctx.dual_mut()[0] = 1.;

    ctx.rebase();
    ctx.commit_modifications(false);
    assert_eq!(ctx.work.c[1], 2.);

    ctx.scheduler.seed(&ctx.prob.tree, ctx.set.rows());
    let job = ctx.scheduler.jobs()[0].clone();
    ctx.solve_job(&job);
    let outcome = ctx.line_search(job.rows.clone(), job.cols.clone());

    // row 0 drops at 1/3, after which column 1 frees at the same step
    assert!(outcome.changed);
    assert_eq!(outcome.flag, LineFlag::Interior);
    assert!(outcome.step > 1. / 3.);
    assert!((outcome.step - 2. / 3.).abs() < 1e-6);
    assert!(!ctx.set.is_row_active(0));
    assert!(ctx.set.is_free(1));
    assert_eq!(ctx.stats().rows_dropped, 1);
}
