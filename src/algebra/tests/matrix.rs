#![allow(non_snake_case)]
use crate::algebra::*;

fn test_matrix_3x4() -> CscMatrix<f64> {
    // A =
    //[ 1.0   ⋅    2.0   ⋅ ]
    //[  ⋅   3.0   4.0   ⋅ ]
    //[ 5.0   ⋅     ⋅   6.0]
    let Ap = vec![0, 2, 3, 5, 6];
    let Ai = vec![0, 2, 1, 0, 1, 2];
    let Ax = vec![1., 5., 3., 2., 4., 6.];
    CscMatrix::new(3, 4, Ap, Ai, Ax)
}

#[test]
fn test_csc_check_format() {
    let A = test_matrix_3x4();
    assert!(A.check_format().is_ok());

    let mut B = A.clone();
    B.rowval[1] = 3;
    assert_eq!(B.check_format(), Err(SparseFormatError::BadRowval));

    let mut B = A.clone();
    B.rowval.swap(0, 1);
    assert_eq!(B.check_format(), Err(SparseFormatError::BadRowOrdering));

    let mut B = A.clone();
    B.colptr[1] = 4;
    assert_eq!(B.check_format(), Err(SparseFormatError::BadColptr));

    let mut B = A.clone();
    B.nzval[2] = f64::NAN;
    assert_eq!(B.check_format(), Err(SparseFormatError::NonFinite));

    let mut B = A;
    B.nzval.pop();
    assert_eq!(
        B.check_format(),
        Err(SparseFormatError::IncompatibleDimension)
    );
}

#[test]
fn test_csc_transpose() {
    let A = test_matrix_3x4();
    let At = A.transpose();

    assert_eq!(At.m, 4);
    assert_eq!(At.n, 3);
    assert!(At.check_format().is_ok());
    assert_eq!(At.colptr, vec![0, 2, 4, 6]);
    assert_eq!(At.rowval, vec![0, 2, 1, 2, 0, 3]);
    assert_eq!(At.nzval, vec![1., 2., 3., 4., 5., 6.]);

    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(A.get_entry((i, j)), At.get_entry((j, i)));
        }
    }
    assert_eq!(At.transpose(), A);
}

#[test]
fn test_csc_gemv() {
    let A = test_matrix_3x4();
    let x = vec![1., -1., 2., 0.5];

    let mut y = vec![1.; 3];
    A.gemv(&mut y, &x, 1., 0.);
    assert_eq!(y, vec![5., 5., 8.]);

    let mut y = vec![1.; 3];
    A.gemv(&mut y, &x, -2., 1.);
    assert_eq!(y, vec![-9., -9., -15.]);

    let z = vec![1., 0., -1.];
    let mut w = vec![0.; 4];
    A.gemv_t(&mut w, &z, 1., 0.);
    assert_eq!(w, vec![-4., 0., 2., -6.]);
}

#[test]
fn test_csc_max_abs() {
    let mut A = test_matrix_3x4();
    A.nzval[3] = -7.;
    assert_eq!(A.max_abs(), 7.);
    assert_eq!(CscMatrix::<f64>::spalloc(2, 2, 0).max_abs(), 0.);
}
