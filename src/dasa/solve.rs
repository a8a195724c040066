//! Forward and back substitution with the factor over a range of rows.
//!
//! Both kernels walk the active rows of `[top, bottom)` in order and treat
//! entries of the factor at rows `>= bottom` as outside the system.  Runs
//! of two or three consecutive active columns sharing one sparsity pattern
//! below the diagonal are solved together.

use super::activeset::IndexList;
use crate::algebra::FloatT;
use crate::factor::LdlFactor;

/// Length of a run of consecutive active columns with a common pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLength {
    One,
    Two,
    Three,
}

// live pattern of column `j` is `[k] ++ pattern(k)`
#[inline]
fn continues<T: FloatT>(factor: &LdlFactor<T>, j: usize, k: usize) -> bool {
    let (rj, _) = factor.live(j);
    let (rk, _) = factor.live(k);
    rj.len() == rk.len() + 1 && rj[0] == k && rj[1..] == *rk
}

/// Length of the chain of active columns starting at column `j`, using
/// only columns below `bottom`.
pub fn detect_chain<T: FloatT>(
    factor: &LdlFactor<T>,
    rows: &IndexList,
    j: usize,
    bottom: usize,
) -> ChainLength {
    let Some(j2) = rows.next(j).filter(|&k| k < bottom) else {
        return ChainLength::One;
    };
    if !continues(factor, j, j2) {
        return ChainLength::One;
    }
    match rows.next(j2).filter(|&k| k < bottom) {
        Some(j3) if continues(factor, j2, j3) => ChainLength::Three,
        _ => ChainLength::Two,
    }
}

/// Solve `L x = b` in place over the active rows of `[top, bottom)`.
///
/// With `mark = Some(m)` only `x[m..bottom]` is recomputed: the entries
/// above `m` must already hold the solution and the entries from `m` on
/// must hold the right hand side.
pub fn forward_solve<T: FloatT>(
    factor: &LdlFactor<T>,
    rows: &IndexList,
    x: &mut [T],
    top: usize,
    bottom: usize,
    mark: Option<usize>,
) {
    let mut cur = rows.seek(top, bottom);

    while let Some(j) = cur.filter(|&j| j < bottom) {
        // columns above the mark only feed rows below it
        if let Some(m) = mark.filter(|&m| j < m) {
            let xj = x[j];
            let (ri, lv) = factor.live(j);
            let start = ri.partition_point(|&i| i < m);
            for (&i, &l) in ri[start..].iter().zip(&lv[start..]) {
                if i >= bottom {
                    break;
                }
                x[i] -= l * xj;
            }
            cur = rows.next(j);
            continue;
        }

        match detect_chain(factor, rows, j, bottom) {
            ChainLength::One => {
                let xj = x[j];
                let (ri, lv) = factor.live(j);
                for (&i, &l) in ri.iter().zip(lv) {
                    if i >= bottom {
                        break;
                    }
                    x[i] -= l * xj;
                }
                cur = rows.next(j);
            }
            ChainLength::Two => {
                let (r1, l1) = factor.live(j);
                let j2 = r1[0];
                let (_, l2) = factor.live(j2);

                let x1 = x[j];
                x[j2] -= l1[0] * x1;
                let x2 = x[j2];

                for ((&i, &a), &b) in r1[1..].iter().zip(&l1[1..]).zip(l2) {
                    if i >= bottom {
                        break;
                    }
                    x[i] -= a * x1 + b * x2;
                }
                cur = rows.next(j2);
            }
            ChainLength::Three => {
                let (r1, l1) = factor.live(j);
                let j2 = r1[0];
                let j3 = r1[1];
                let (_, l2) = factor.live(j2);
                let (_, l3) = factor.live(j3);

                let x1 = x[j];
                x[j2] -= l1[0] * x1;
                let x2 = x[j2];
                x[j3] -= l1[1] * x1 + l2[0] * x2;
                let x3 = x[j3];

                for (((&i, &a), &b), &c) in r1[2..].iter().zip(&l1[2..]).zip(&l2[1..]).zip(l3) {
                    if i >= bottom {
                        break;
                    }
                    x[i] -= a * x1 + b * x2 + c * x3;
                }
                cur = rows.next(j3);
            }
        }
    }
}

/// Solve `D Lᵀ u = y` over the active rows of `[top, bottom)`, writing
/// `u` and leaving `y` untouched.
pub fn back_solve<T: FloatT>(
    factor: &LdlFactor<T>,
    rows: &IndexList,
    y: &[T],
    u: &mut [T],
    top: usize,
    bottom: usize,
) {
    let d = factor.diag();

    // last active row in range
    let mut cur = (top..bottom).rev().find(|&i| rows.contains(i));
    let before = |k: Option<usize>| k.filter(|&k| k >= top);

    // Σ L[i,j]·u[i] over the live rows of column j below `bottom`
    let dot_below = |u: &[T], j: usize, skip: usize| -> T {
        let (ri, lv) = factor.live(j);
        let mut s = T::zero();
        for (&i, &l) in ri[skip..].iter().zip(&lv[skip..]) {
            if i >= bottom {
                break;
            }
            s += l * u[i];
        }
        s
    };

    while let Some(j) = cur {
        let jp = before(rows.prev(j));
        let jpp = jp.and_then(|k| before(rows.prev(k)));

        let chain_end = match (jpp, jp) {
            (Some(k), _) if detect_chain(factor, rows, k, bottom) == ChainLength::Three => {
                ChainLength::Three
            }
            (_, Some(k)) if detect_chain(factor, rows, k, bottom) != ChainLength::One => {
                ChainLength::Two
            }
            _ => ChainLength::One,
        };

        match chain_end {
            ChainLength::One => {
                u[j] = y[j] / d[j] - dot_below(u, j, 0);
                cur = before(rows.prev(j));
            }
            ChainLength::Two => {
                let j1 = jp.unwrap_or(j);
                let (r1, l1) = factor.live(j1);
                let (_, l2) = factor.live(j);

                // shared rows below the pair
                let mut s1 = T::zero();
                let mut s2 = T::zero();
                for ((&i, &a), &b) in r1[1..].iter().zip(&l1[1..]).zip(l2) {
                    if i >= bottom {
                        break;
                    }
                    s1 += a * u[i];
                    s2 += b * u[i];
                }
                u[j] = y[j] / d[j] - s2;
                u[j1] = y[j1] / d[j1] - s1 - l1[0] * u[j];
                cur = before(rows.prev(j1));
            }
            ChainLength::Three => {
                let j1 = jpp.unwrap_or(j);
                let j2 = jp.unwrap_or(j);
                let (r1, l1) = factor.live(j1);
                let (_, l2) = factor.live(j2);
                let (_, l3) = factor.live(j);

                let mut s1 = T::zero();
                let mut s2 = T::zero();
                let mut s3 = T::zero();
                for (((&i, &a), &b), &c) in r1[2..].iter().zip(&l1[2..]).zip(&l2[1..]).zip(l3) {
                    if i >= bottom {
                        break;
                    }
                    s1 += a * u[i];
                    s2 += b * u[i];
                    s3 += c * u[i];
                }
                u[j] = y[j] / d[j] - s3;
                u[j2] = y[j2] / d[j2] - s2 - l2[0] * u[j];
                u[j1] = y[j1] / d[j1] - s1 - l1[0] * u[j2] - l1[1] * u[j];
                cur = before(rows.prev(j1));
            }
        }
    }
}

#[path = "solve_test.rs"]
#[cfg(test)]
mod test;
