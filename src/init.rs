//! Parameter initialisers.
//!
//! An [`Initializer`] turns a shape and a random source into a fresh tensor.
//! Layers own the random source; initialisers only draw from it, so a layer
//! seeded the same way always starts from the same parameters.
//!
//! Any `Fn(&[usize], &mut StdRng) -> Tensor` is also an initialiser:
//!
//! ```rust
//! use mlp_layers::init::Initializer;
//! use mlp_layers::tensors::Tensor;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let ones = |shape: &[usize], _: &mut StdRng| Tensor::filled(shape.to_vec(), 1.0);
//! let t = ones.init(&[2, 3], &mut StdRng::seed_from_u64(0));
//! assert!(t.data().iter().all(|&x| x == 1.0));
//! ```

use crate::error::{LayerError, Result};
use crate::tensors::Tensor;
use core::fmt;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Produces an initial value for a parameter tensor.
pub trait Initializer {
    /// A tensor of `shape` with values drawn from `rng`.
    fn init(&self, shape: &[usize], rng: &mut StdRng) -> Tensor;
}

impl<F> Initializer for F
where
    F: Fn(&[usize], &mut StdRng) -> Tensor,
{
    fn init(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        self(shape, rng)
    }
}

/// Uniform values in `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformInit {
    /// Inclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
}

impl UniformInit {
    /// Uniform values in `[low, high)`.
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

impl Initializer for UniformInit {
    fn init(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let len = shape.iter().product();
        let span = self.high - self.low;
        let data = (0..len)
            .map(|_| self.low + span * rng.random::<f64>())
            .collect();
        Tensor::new(shape.to_vec(), data)
    }
}

impl fmt::Display for UniformInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniformInit(low={}, high={})", self.low, self.high)
    }
}

/// Every element set to the same value. Draws nothing from the random source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantInit {
    /// The fill value.
    pub value: f64,
}

impl ConstantInit {
    /// Every element set to `value`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Initializer for ConstantInit {
    fn init(&self, shape: &[usize], _rng: &mut StdRng) -> Tensor {
        Tensor::filled(shape.to_vec(), self.value)
    }
}

impl fmt::Display for ConstantInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstantInit(value={})", self.value)
    }
}

/// Gaussian values with a given mean and standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct NormalInit {
    mean: f64,
    std: f64,
    dist: Normal<f64>,
}

impl NormalInit {
    /// Gaussian values with `mean` and standard deviation `std`.
    ///
    /// # Errors
    /// Returns [`LayerError::InvalidArgument`] if `std` is negative or not finite.
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        // rand_distr accepts a negative std and mirrors the samples
        if !(std >= 0.0 && std.is_finite()) {
            return Err(LayerError::InvalidArgument(format!(
                "NormalInit(mean={mean}, std={std}): std must be finite and non-negative"
            )));
        }
        let dist = Normal::new(mean, std).map_err(|e| {
            LayerError::InvalidArgument(format!("NormalInit(mean={mean}, std={std}): {e}"))
        })?;
        Ok(Self { mean, std, dist })
    }

    /// The mean of the distribution.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The standard deviation of the distribution.
    #[must_use]
    pub fn std(&self) -> f64 {
        self.std
    }
}

impl Initializer for NormalInit {
    fn init(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let len = shape.iter().product();
        let data = (0..len).map(|_| self.dist.sample(rng)).collect();
        Tensor::new(shape.to_vec(), data)
    }
}

impl fmt::Display for NormalInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalInit(mean={}, std={})", self.mean, self.std)
    }
}

/// Glorot (Xavier) uniform initialisation.
///
/// Values are uniform in `[-limit, limit)` with
/// `limit = gain * sqrt(6 / (fan_in + fan_out))`. For a weight matrix of
/// shape `(out_dim, in_dim)`, `fan_out = out_dim` and `fan_in = in_dim`;
/// a vector uses its length for both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlorotUniformInit {
    /// Multiplier on the limit.
    pub gain: f64,
}

impl Default for GlorotUniformInit {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

impl GlorotUniformInit {
    /// Glorot uniform initialisation scaled by `gain`.
    #[must_use]
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }

    #[allow(clippy::cast_precision_loss)]
    fn limit(&self, shape: &[usize]) -> f64 {
        let (fan_out, fan_in) = match shape {
            [] => (1, 1),
            [n] => (*n, *n),
            [out, rest @ ..] => (*out, rest.iter().product()),
        };
        let fans = (fan_in + fan_out).max(1) as f64;
        self.gain * (6.0 / fans).sqrt()
    }
}

impl Initializer for GlorotUniformInit {
    fn init(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let limit = self.limit(shape);
        UniformInit::new(-limit, limit).init(shape, rng)
    }
}

impl fmt::Display for GlorotUniformInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlorotUniformInit(gain={})", self.gain)
    }
}
