//! Single-threaded kernels.
//!
//! These are the reference loops. [`super::parallel`] splits the same loops
//! across threads and must keep the per-element reduction order identical.

/// `f` applied to every element.
pub fn map<F>(x: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    x.iter().map(|&v| f(v)).collect()
}

/// `f` applied to every pair of elements.
pub fn zip_map<F>(a: &[f64], b: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64,
{
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// `f` applied to every row of width `width`, writing a row of the same width.
pub fn rows_map<F>(x: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &mut [f64]),
{
    let mut out = vec![0.0; x.len()];
    if width == 0 {
        return out;
    }
    out.chunks_mut(width)
        .zip(x.chunks(width))
        .for_each(|(o, row)| f(row, o));
    out
}

/// `f` applied to every pair of matching rows of width `width`.
pub fn rows_zip_map<F>(a: &[f64], b: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &[f64], &mut [f64]),
{
    debug_assert_eq!(a.len(), b.len());
    let mut out = vec![0.0; a.len()];
    if width == 0 {
        return out;
    }
    out.chunks_mut(width)
        .zip(a.chunks(width).zip(b.chunks(width)))
        .for_each(|(o, (ra, rb))| f(ra, rb, o));
    out
}

/// `A (m×k) · Bᵗ` where `B` is stored as `n×k`.
pub fn matmul_nt(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), n * k);
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let b_row = &b[j * k..(j + 1) * k];
            out[i * n + j] = dot(a_row, b_row);
        }
    }
    out
}

/// `A (m×k) · B (k×n)`.
pub fn matmul_nn(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        matmul_nn_row(&a[i * k..(i + 1) * k], b, n, &mut out[i * n..(i + 1) * n]);
    }
    out
}

/// `Aᵗ · B` where `A` is stored as `k×m` and `B` as `k×n`.
pub fn matmul_tn(a: &[f64], b: &[f64], k: usize, m: usize, n: usize) -> Vec<f64> {
    debug_assert_eq!(a.len(), k * m);
    debug_assert_eq!(b.len(), k * n);
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        matmul_tn_row(a, b, i, m, n, &mut out[i * n..(i + 1) * n]);
    }
    out
}

/// Sum over the `rows` axis of a `rows×width` matrix.
pub fn sum_rows(x: &[f64], rows: usize, width: usize) -> Vec<f64> {
    debug_assert_eq!(x.len(), rows * width);
    (0..width).map(|j| column_sum(x, rows, width, j)).collect()
}

#[inline]
pub(super) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub(super) fn matmul_nn_row(a_row: &[f64], b: &[f64], n: usize, out_row: &mut [f64]) {
    for (j, o) in out_row.iter_mut().enumerate() {
        *o = a_row
            .iter()
            .enumerate()
            .map(|(l, &a)| a * b[l * n + j])
            .sum();
    }
}

#[inline]
pub(super) fn matmul_tn_row(a: &[f64], b: &[f64], i: usize, m: usize, n: usize, out_row: &mut [f64]) {
    let k = if m == 0 { 0 } else { a.len() / m };
    for (j, o) in out_row.iter_mut().enumerate() {
        *o = (0..k).map(|l| a[l * m + i] * b[l * n + j]).sum();
    }
}

#[inline]
pub(super) fn column_sum(x: &[f64], rows: usize, width: usize, j: usize) -> f64 {
    (0..rows).map(|r| x[r * width + j]).sum()
}
