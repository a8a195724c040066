#![allow(non_snake_case)]
use super::*;
use crate::algebra::CscMatrix;
use crate::factor::Factorization;

fn test_constraints() -> CscMatrix<f64> {
    // A =
    //[ 1.0   ⋅    2.0   ⋅     ⋅ ]
    //[  ⋅   1.0    ⋅   3.0    ⋅ ]
    //[ 1.0  1.0    ⋅    ⋅    1.0]
    //[  ⋅    ⋅    1.0  1.0   2.0]
    let Ap = vec![0, 2, 4, 6, 8, 10];
    let Ai = vec![0, 2, 1, 2, 0, 3, 1, 3, 2, 3];
    let Ax = vec![1., 1., 1., 1., 2., 1., 3., 1., 1., 2.];
    CscMatrix::new(4, 5, Ap, Ai, Ax)
}

fn factor_with(active: &[bool], sigma: f64) -> (LdlFactor<f64>, IndexList, Vec<Vec<f64>>) {
    let A = test_constraints();
    let At = A.transpose();
    let mut F = LdlFactor::new(&A, &At).unwrap();
    F.factorize(&A, &At, &[true; 5], active, sigma);

    let mut rows = IndexList::new(4);
    for (i, _) in active.iter().enumerate().filter(|(_, &a)| a) {
        rows.push_back(i);
    }

    // dense A·Aᵀ + σI
    let mut M = vec![vec![0.; 4]; 4];
    for j in 0..A.n {
        let (ri, vi) = A.column(j);
        for (&i, &a) in ri.iter().zip(vi) {
            for (&k, &b) in ri.iter().zip(vi) {
                M[i][k] += a * b;
            }
        }
    }
    for (i, Mi) in M.iter_mut().enumerate() {
        Mi[i] += sigma;
    }
    (F, rows, M)
}

// residual of M·u = b over the rows in `keep`
fn residual(M: &[Vec<f64>], u: &[f64], b: &[f64], keep: &[usize]) -> f64 {
    keep.iter()
        .map(|&i| {
            let Mu: f64 = keep.iter().map(|&k| M[i][k] * u[k]).sum();
            (Mu - b[i]).abs()
        })
        .fold(0., f64::max)
}

#[test]
fn test_detect_chain() {
    let (F, rows, _) = factor_with(&[true; 4], 1e-3);

    // live patterns: col0 {2,3}, col1 {2,3}, col2 {3}, col3 {}
    assert_eq!(detect_chain(&F, &rows, 0, 4), ChainLength::One);
    assert_eq!(detect_chain(&F, &rows, 1, 4), ChainLength::Three);
    assert_eq!(detect_chain(&F, &rows, 2, 4), ChainLength::Two);
    assert_eq!(detect_chain(&F, &rows, 3, 4), ChainLength::One);

    // a chain never reaches past the range
    assert_eq!(detect_chain(&F, &rows, 1, 3), ChainLength::Two);
    assert_eq!(detect_chain(&F, &rows, 1, 2), ChainLength::One);
}

#[test]
fn test_full_solve() {
    let (F, rows, M) = factor_with(&[true; 4], 1e-3);
    let b = vec![1., -2., 0.5, 3.];

    let mut x = b.clone();
    forward_solve(&F, &rows, &mut x, 0, 4, None);
    let mut u = vec![0.; 4];
    back_solve(&F, &rows, &x, &mut u, 0, 4);

    assert!(residual(&M, &u, &b, &[0, 1, 2, 3]) < 1e-10);
}

#[test]
fn test_leading_range_solve() {
    let (F, rows, M) = factor_with(&[true; 4], 1e-2);
    let b = vec![0.3, 1., -1., 100.];

    // rows 0..3 form a leading block, entry 3 is left alone
    let mut x = b.clone();
    forward_solve(&F, &rows, &mut x, 0, 3, None);
    assert_eq!(x[3], 100.);

    let mut u = vec![0.; 4];
    back_solve(&F, &rows, &x, &mut u, 0, 3);
    assert_eq!(u[3], 0.);
    assert!(residual(&M, &u, &b, &[0, 1, 2]) < 1e-10);
}

#[test]
fn test_solve_with_inactive_row() {
    let (F, rows, M) = factor_with(&[true, false, true, true], 1e-3);

    // row 1 is an identity row of the factor and is skipped
    let b = vec![2., 0., -1., 1.];
    let mut x = b.clone();
    forward_solve(&F, &rows, &mut x, 0, 4, None);
    let mut u = vec![0.; 4];
    back_solve(&F, &rows, &x, &mut u, 0, 4);

    assert_eq!(u[1], 0.);
    assert!(residual(&M, &u, &b, &[0, 2, 3]) < 1e-10);
}

#[test]
fn test_partial_forward_solve() {
    let (F, rows, _) = factor_with(&[true; 4], 1e-3);
    let b = vec![1., 2., 3., 4.];
    let mut x = b.clone();
    forward_solve(&F, &rows, &mut x, 0, 4, None);

    // change the right hand side from row 2 on
    let b2 = vec![1., 2., -3., 0.5];
    let mut full = b2.clone();
    forward_solve(&F, &rows, &mut full, 0, 4, None);

    x[2..].copy_from_slice(&b2[2..]);
    forward_solve(&F, &rows, &mut x, 0, 4, Some(2));

    for (a, b) in x.iter().zip(&full) {
        assert!((a - b).abs() < 1e-12);
    }
}
