use crate::algebra::{CscMatrix, FloatT};

impl<T: FloatT> CscMatrix<T> {
    /// `y = a*A*x + b*y`
    pub fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_N(self, y, x, a, b);
    }

    /// `y = a*Aᵀ*x + b*y`
    pub fn gemv_t(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_T(self, y, x, a, b);
    }
}

fn _scale_by<T: FloatT>(y: &mut [T], b: T) {
    if b == T::zero() {
        y.fill(T::zero());
    } else if b != T::one() {
        y.iter_mut().for_each(|v| *v *= b);
    }
}

// sparse matrix-vector multiply, no transpose
#[allow(non_snake_case)]
fn _csc_axpby_N<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    _scale_by(y, b);

    // if a is zero, we're done
    if a == T::zero() {
        return;
    }

    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    for (j, &xj) in x.iter().enumerate() {
        let axj = a * xj;
        for p in A.colptr[j]..A.colptr[j + 1] {
            y[A.rowval[p]] += A.nzval[p] * axj;
        }
    }
}

// sparse matrix-vector multiply, transposed
#[allow(non_snake_case)]
fn _csc_axpby_T<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    _scale_by(y, b);

    if a == T::zero() {
        return;
    }

    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    for (j, yj) in y.iter_mut().enumerate() {
        let mut s = T::zero();
        for p in A.colptr[j]..A.colptr[j + 1] {
            s += A.nzval[p] * x[A.rowval[p]];
        }
        *yj += a * s;
    }
}
