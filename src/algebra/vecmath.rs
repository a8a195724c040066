use super::FloatT;
use std::iter::zip;

/// Vector operations on slices of [`FloatT`](crate::algebra::FloatT)
pub trait VectorMath {
    type T;

    /// Set all elements to the same value
    fn set(&mut self, c: Self::T) -> &mut Self;

    /// Dot product
    fn dot(&self, y: &Self) -> Self::T;

    /// Infinity norm
    fn norm_inf(&self) -> Self::T;

    /// Infinity norm of the difference `self - y`
    fn dist_inf(&self, y: &Self) -> Self::T;

    /// Elementwise clamp to `[lo, hi]`
    fn clip(&mut self, lo: &Self, hi: &Self) -> &mut Self;
}

impl<T: FloatT> VectorMath for [T] {
    type T = T;

    fn set(&mut self, c: T) -> &mut Self {
        self.fill(c);
        self
    }

    fn dot(&self, y: &[T]) -> T {
        zip(self, y).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    }

    fn norm_inf(&self) -> T {
        // NaN values propagate into the result
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            out = if v > out || v.is_nan() { v } else { out };
        }
        out
    }

    fn dist_inf(&self, y: &[T]) -> T {
        zip(self, y).fold(T::zero(), |acc, (&x, &y)| T::max(acc, (x - y).abs()))
    }

    fn clip(&mut self, lo: &[T], hi: &[T]) -> &mut Self {
        for (x, (&l, &h)) in zip(self.iter_mut(), zip(lo, hi)) {
            *x = clamp(*x, l, h);
        }
        self
    }
}

/// Clamp a scalar to `[lo, hi]`.  Infinite bounds are allowed.
#[inline]
pub fn clamp<T: FloatT>(x: T, lo: T, hi: T) -> T {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}
