//! Parameter penalties (regularisers).
//!
//! A [`Penalty`] maps a parameter tensor to a scalar cost and to the
//! gradient of that cost with respect to the parameter. Layers hold them as
//! `Option<Box<dyn Penalty>>`; `None` means the parameter is not penalised.

use crate::ops;
use crate::tensors::Tensor;
use core::fmt;

/// A scalar regularisation term on a parameter tensor.
pub trait Penalty: fmt::Display {
    /// The penalty value for `param`.
    fn penalty(&self, param: &Tensor) -> f64;

    /// `d penalty / d param`, same shape as `param`.
    fn grad(&self, param: &Tensor) -> Tensor;
}

/// `coefficient * Σ|p|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L1Penalty {
    /// Scale of the penalty.
    pub coefficient: f64,
}

impl L1Penalty {
    /// L1 penalty scaled by `coefficient`.
    #[must_use]
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }
}

impl Penalty for L1Penalty {
    fn penalty(&self, param: &Tensor) -> f64 {
        self.coefficient * param.data().iter().map(|p| p.abs()).sum::<f64>()
    }

    fn grad(&self, param: &Tensor) -> Tensor {
        let c = self.coefficient;
        // subgradient 0 at p == 0
        let data = ops::map(param.data(), move |p| {
            if p > 0.0 {
                c
            } else if p < 0.0 {
                -c
            } else {
                0.0
            }
        });
        Tensor::new(param.shape().to_vec(), data)
    }
}

impl fmt::Display for L1Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L1Penalty({})", self.coefficient)
    }
}

/// `0.5 * coefficient * Σp²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L2Penalty {
    /// Scale of the penalty.
    pub coefficient: f64,
}

impl L2Penalty {
    /// L2 penalty scaled by `coefficient`.
    #[must_use]
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }
}

impl Penalty for L2Penalty {
    fn penalty(&self, param: &Tensor) -> f64 {
        0.5 * self.coefficient * param.data().iter().map(|p| p * p).sum::<f64>()
    }

    fn grad(&self, param: &Tensor) -> Tensor {
        let c = self.coefficient;
        Tensor::new(param.shape().to_vec(), ops::map(param.data(), move |p| c * p))
    }
}

impl fmt::Display for L2Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L2Penalty({})", self.coefficient)
    }
}
