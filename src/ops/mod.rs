//! # Kernels
//!
//! The arithmetic under every layer, on flat row-major `f64` slices.
//!
//! ## Submodules
//!
//! - [`serial`]: plain loops on the calling thread
//! - [`parallel`]: the same loops split across the `rayon` pool
//! - [`dispatch`]: picks one of the above from the global
//!   [`Backend`](crate::backend::Backend)
//!
//! ## Adding a kernel
//!
//! 1. Write the serial loop, factoring the per-row work into a helper
//! 2. Write the parallel version by splitting output rows and reusing the helper
//! 3. Add the match arm in `dispatch`
//!
//! Shape checks live in the layers, not here; kernels only `debug_assert!`.

pub mod dispatch;
pub mod parallel;
pub mod serial;

pub use dispatch::*;

#[cfg(test)]
mod tests {
    use super::{parallel, serial};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random(rng: &mut StdRng, len: usize) -> Vec<f64> {
        (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
    }

    #[test]
    fn parallel_kernels_are_bit_identical() {
        let mut rng = StdRng::seed_from_u64(7);
        let (m, k, n) = (17, 33, 9);
        let a = random(&mut rng, m * k);
        let b = random(&mut rng, n * k);
        let c = random(&mut rng, k * n);
        let g = random(&mut rng, k * m);

        assert_eq!(serial::matmul_nt(&a, &b, m, k, n), parallel::matmul_nt(&a, &b, m, k, n));
        assert_eq!(serial::matmul_nn(&a, &c, m, k, n), parallel::matmul_nn(&a, &c, m, k, n));
        assert_eq!(serial::matmul_tn(&g, &c, k, m, n), parallel::matmul_tn(&g, &c, k, m, n));
        assert_eq!(serial::sum_rows(&a, m, k), parallel::sum_rows(&a, m, k));
        assert_eq!(serial::map(&a, f64::tanh), parallel::map(&a, f64::tanh));
        assert_eq!(
            serial::zip_map(&a, &a, |x, y| x * y),
            parallel::zip_map(&a, &a, |x, y| x * y)
        );

        let row_sum = |r: &[f64], o: &mut [f64]| {
            let s: f64 = r.iter().sum();
            o.iter_mut().zip(r).for_each(|(o, x)| *o = x / s);
        };
        assert_eq!(serial::rows_map(&a, k, row_sum), parallel::rows_map(&a, k, row_sum));
    }
}
