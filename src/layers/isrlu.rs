//! Inverse square root linear unit.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::fmt;

/// Element-wise `y = x` for `x ≥ 0`, `x / sqrt(1 + alpha x²)` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsrluLayer {
    alpha: f64,
}

impl IsrluLayer {
    /// ISRLU with the given curvature.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// The negative-side curvature.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for IsrluLayer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Layer for IsrluLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        let alpha = self.alpha;
        Ok(map(inputs, move |x| {
            if x >= 0.0 { x } else { x / (1.0 + alpha * x * x).sqrt() }
        }))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("IsrluLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        let alpha = self.alpha;
        Ok(zip_map(inputs, grads_wrt_outputs, move |x, dy| {
            if x > 0.0 {
                dy
            } else if x < 0.0 {
                dy * (1.0 + alpha * x * x).sqrt().recip().powi(3)
            } else {
                0.0
            }
        }))
    }
}

impl fmt::Display for IsrluLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IsrluLayer(alpha={})", self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn negative_branch() {
        let layer = IsrluLayer::new(3.0);
        let x = tensor!([[(-1.0), 4.0]]);
        let y = layer.fprop(&x).unwrap();
        assert_eq!(y.data(), &[-0.5, 4.0]);
        let gx = layer.bprop(&x, &y, &tensor!([[1.0, 1.0]])).unwrap();
        assert_eq!(gx.data(), &[0.125, 1.0]);
    }
}
