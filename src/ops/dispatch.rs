//! Backend dispatch.
//!
//! Each function reads the global [`Backend`] and forwards to the matching
//! kernel module. Layers only ever call through here.
//!
//! # Example
//! ```rust
//! use mlp_layers::backend::{set_backend, Backend};
//! use mlp_layers::ops::dispatch::matmul_nn;
//!
//! let a = [1.0, 2.0, 3.0, 4.0];
//! let serial = matmul_nn(&a, &a, 2, 2, 2);
//! set_backend(Backend::Parallel);
//! assert_eq!(matmul_nn(&a, &a, 2, 2, 2), serial);
//! set_backend(Backend::Serial);
//! ```

use super::{parallel, serial};
use crate::backend::{get_backend, Backend};

/// Element-wise `f(x)`.
pub fn map<F>(x: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    match get_backend() {
        Backend::Serial => serial::map(x, f),
        Backend::Parallel => parallel::map(x, f),
    }
}

/// Element-wise `f(a, b)`.
pub fn zip_map<F>(a: &[f64], b: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    match get_backend() {
        Backend::Serial => serial::zip_map(a, b, f),
        Backend::Parallel => parallel::zip_map(a, b, f),
    }
}

/// Row-wise `f(row, out_row)`.
pub fn rows_map<F>(x: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &mut [f64]) + Sync + Send,
{
    match get_backend() {
        Backend::Serial => serial::rows_map(x, width, f),
        Backend::Parallel => parallel::rows_map(x, width, f),
    }
}

/// Row-wise `f(a_row, b_row, out_row)`.
pub fn rows_zip_map<F>(a: &[f64], b: &[f64], width: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64], &[f64], &mut [f64]) + Sync + Send,
{
    match get_backend() {
        Backend::Serial => serial::rows_zip_map(a, b, width, f),
        Backend::Parallel => parallel::rows_zip_map(a, b, width, f),
    }
}

/// `A (m×k) · Bᵗ`, `B` stored as `n×k`.
pub fn matmul_nt(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    match get_backend() {
        Backend::Serial => serial::matmul_nt(a, b, m, k, n),
        Backend::Parallel => parallel::matmul_nt(a, b, m, k, n),
    }
}

/// `A (m×k) · B (k×n)`.
pub fn matmul_nn(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    match get_backend() {
        Backend::Serial => serial::matmul_nn(a, b, m, k, n),
        Backend::Parallel => parallel::matmul_nn(a, b, m, k, n),
    }
}

/// `Aᵗ · B`, `A` stored as `k×m`, `B` as `k×n`.
pub fn matmul_tn(a: &[f64], b: &[f64], k: usize, m: usize, n: usize) -> Vec<f64> {
    match get_backend() {
        Backend::Serial => serial::matmul_tn(a, b, k, m, n),
        Backend::Parallel => parallel::matmul_tn(a, b, k, m, n),
    }
}

/// Column sums of a `rows×width` matrix.
pub fn sum_rows(x: &[f64], rows: usize, width: usize) -> Vec<f64> {
    match get_backend() {
        Backend::Serial => serial::sum_rows(x, rows, width),
        Backend::Parallel => parallel::sum_rows(x, rows, width),
    }
}
