//! Multi-threaded kernels.
//!
//! Every kernel here splits its *output* across the `rayon` pool and leaves
//! each element's own reduction sequential, reusing the row helpers from
//! [`super::serial`]. That keeps results bit-identical to the serial path.

use super::serial::{column_sum, dot, matmul_nn_row, matmul_tn_row};
use rayon::prelude::*;

/// `f` applied to every element.
pub fn map<F>(x: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    x.par_iter().map(|&v| f(v)).collect()
}

/// `f` applied to every pair of elements.
pub fn zip_map<F>(a: &[f64], b: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());
    a.par_iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// `f` applied to every row of width `width`.
pub fn rows_map<F>(x: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &mut [f64]) + Sync + Send,
{
    let mut out = vec![0.0; x.len()];
    if width == 0 {
        return out;
    }
    out.par_chunks_mut(width)
        .zip(x.par_chunks(width))
        .for_each(|(o, row)| f(row, o));
    out
}

/// `f` applied to every pair of matching rows of width `width`.
pub fn rows_zip_map<F>(a: &[f64], b: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &[f64], &mut [f64]) + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());
    let mut out = vec![0.0; a.len()];
    if width == 0 {
        return out;
    }
    out.par_chunks_mut(width)
        .zip(a.par_chunks(width).zip(b.par_chunks(width)))
        .for_each(|(o, (ra, rb))| f(ra, rb, o));
    out
}

/// `A (m×k) · Bᵗ` where `B` is stored as `n×k`.
pub fn matmul_nt(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), n * k);
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        let a_row = &a[i * k..(i + 1) * k];
        for (j, o) in row.iter_mut().enumerate() {
            *o = dot(a_row, &b[j * k..(j + 1) * k]);
        }
    });
    out
}

/// `A (m×k) · B (k×n)`.
pub fn matmul_nn(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        matmul_nn_row(&a[i * k..(i + 1) * k], b, n, row);
    });
    out
}

/// `Aᵗ · B` where `A` is stored as `k×m` and `B` as `k×n`.
pub fn matmul_tn(a: &[f64], b: &[f64], k: usize, m: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), k * m);
    debug_assert_eq!(b.len(), k * n);
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        matmul_tn_row(a, b, i, m, n, row);
    });
    out
}

/// Sum over the `rows` axis of a `rows×width` matrix.
pub fn sum_rows(x: &[f64], rows: usize, width: usize) -> Vec<f64> {
    debug_assert_eq!(x.len(), rows * width);
    (0..width)
        .into_par_iter()
        .map(|j| column_sum(x, rows, width, j))
        .collect()
}
