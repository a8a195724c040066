#![allow(non_snake_case)]

use dasa::{algebra::*, dasa::*};

const INF: f64 = f64::INFINITY;

// Two leaf blocks coupled through a separator row in the root:
//
//   block 0 : row 0,  columns 0-1    x₀ + x₁ ≥ 2
//   block 1 : row 1,  columns 2-3    x₂ - x₃ = 1
//   root    : row 2,  column 4       x₀ + x₂ + x₄ ≤ 3
fn dissected_problem() -> ProjectionProblem<f64> {
    let A = CscMatrix::new(
        3,
        5,
        vec![0, 2, 3, 5, 6, 7],
        vec![0, 2, 0, 1, 2, 1, 2],
        vec![1., 1., 1., 1., 1., -1., 1.],
    );
    ProjectionProblem::new(
        &A,
        &[2., 1., -INF],
        &[INF, 1., 3.],
        &[0.; 5],
        &[INF; 5],
        &[0.5, 0.5, 2., 0., 1.],
    )
    .unwrap()
}

fn dissected_tree() -> BlockTree {
    BlockTree::new(vec![2, 2, usize::MAX], vec![0, 1, 2, 3], vec![0, 2, 4, 5]).unwrap()
}

fn solve(prob: ProjectionProblem<f64>) -> ProjectionSolver<f64> {
    let mut solver = ProjectionSolver::new(prob, DasaSettings::default()).unwrap();
    solver.solve();
    solver
}

#[test]
fn test_tree_matches_single_block() {
    let flat = solve(dissected_problem());
    let tree = solve(dissected_problem().with_block_tree(dissected_tree()).unwrap());

    assert_eq!(flat.solution().status, DasaStatus::SolutionFound);
    assert_eq!(tree.solution().status, DasaStatus::SolutionFound);

    for (a, b) in flat.solution().x.iter().zip(&tree.solution().x) {
        assert!((a - b).abs() < 1e-6);
    }

    // every row binds, with λ = (0.625, -0.375, -0.25)
    let x = [0.875, 1.125, 1.375, 0.375, 0.75];
    for (a, b) in tree.solution().x.iter().zip(&x) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_tree_solution_is_projection() {
    let prob = dissected_problem().with_block_tree(dissected_tree()).unwrap();
    let solver = solve(prob.clone());
    let sol = solver.solution();
    let tol = 1e-6;

    // primal feasibility
    let mut r = vec![0.; 3];
    prob.A.gemv(&mut r, &sol.x, 1., 0.);
    for i in 0..3 {
        assert!(r[i] >= prob.bl[i] - tol && r[i] <= prob.bu[i] + tol);
    }
    assert!(sol.x.iter().all(|&v| v >= -tol));

    // x = clamp(y + Aᵀλ) with λ on the correct side of each row
    let mut z = prob.y.clone();
    prob.A.gemv_t(&mut z, &sol.lambda, 1., 1.);
    for (xj, zj) in sol.x.iter().zip(&z) {
        assert!((xj - zj.max(0.)).abs() < tol);
    }
    assert!(sol.lambda[0] >= 0.);
    assert!(sol.lambda[2] <= 0.);

    // complementarity
    for i in [0, 2] {
        let slack = f64::min((r[i] - prob.bl[i]).abs(), (r[i] - prob.bu[i]).abs());
        assert!(sol.lambda[i].abs() * slack < tol);
    }
}

#[test]
fn test_tree_engine_stats() {
    let prob = dissected_problem().with_block_tree(dissected_tree()).unwrap();
    let solver = solve(prob);
    let stats = solver.stats();

    assert!(stats.runs >= 1);
    assert!(stats.jobs >= stats.sweeps);
    assert!(stats.factorizations >= 1);
    assert!(solver.context().active_set().check_invariants());
}

#[test]
fn test_dissection_violation() {
    // column 2 of block 1 touches row 0 of block 0
    let A = CscMatrix::new(
        3,
        5,
        vec![0, 1, 2, 4, 5, 6],
        vec![0, 0, 0, 1, 1, 2],
        vec![1.; 6],
    );
    let prob =
        ProjectionProblem::new(&A, &[0.; 3], &[1.; 3], &[0.; 5], &[1.; 5], &[0.; 5]).unwrap();
    assert_eq!(
        prob.with_block_tree(dissected_tree()).unwrap_err(),
        ProblemError::Dissection { col: 2 }
    );
}
