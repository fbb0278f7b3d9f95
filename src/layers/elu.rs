//! Exponential linear units.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::fmt;

/// Default SELU `alpha`.
pub const SELU_ALPHA: f64 = 1.673_263_242_354_377_2;

/// Default SELU `scale`.
pub const SELU_SCALE: f64 = 1.050_700_987_355_480_5;

#[inline]
fn elu(x: f64, alpha: f64) -> f64 {
    if x >= 0.0 { x } else { alpha * x.exp_m1() }
}

#[inline]
fn elu_grad(x: f64, alpha: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        alpha * x.exp()
    } else {
        0.0
    }
}

/// Element-wise `y = x` for `x ≥ 0`, `alpha * (exp(x) - 1)` otherwise.
///
/// The gradient is taken as zero at exactly `x = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EluLayer {
    alpha: f64,
}

impl EluLayer {
    /// ELU with the given negative-side scale.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// The negative-side scale.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for EluLayer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Layer for EluLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        let alpha = self.alpha;
        Ok(map(inputs, move |x| elu(x, alpha)))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("EluLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        let alpha = self.alpha;
        Ok(zip_map(inputs, grads_wrt_outputs, move |x, dy| {
            dy * elu_grad(x, alpha)
        }))
    }
}

impl fmt::Display for EluLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EluLayer(alpha={})", self.alpha)
    }
}

/// Scaled ELU: `scale * elu_alpha(x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeluLayer {
    alpha: f64,
    scale: f64,
}

impl SeluLayer {
    /// SELU with explicit constants.
    #[must_use]
    pub fn new(alpha: f64, scale: f64) -> Self {
        Self { alpha, scale }
    }

    /// The inner ELU scale.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The outer scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for SeluLayer {
    /// The self-normalising constants.
    fn default() -> Self {
        Self::new(SELU_ALPHA, SELU_SCALE)
    }
}

impl Layer for SeluLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        let Self { alpha, scale } = *self;
        Ok(map(inputs, move |x| scale * elu(x, alpha)))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("SeluLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        let Self { alpha, scale } = *self;
        Ok(zip_map(inputs, grads_wrt_outputs, move |x, dy| {
            dy * scale * elu_grad(x, alpha)
        }))
    }
}

impl fmt::Display for SeluLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeluLayer(alpha={}, scale={})", self.alpha, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn elu_values() {
        let layer = EluLayer::new(0.5);
        let x = tensor!([[(-1.0), 0.0, 2.0]]);
        let y = layer.fprop(&x).unwrap();
        assert!((y.data()[0] - 0.5 * ((-1.0_f64).exp() - 1.0)).abs() < 1e-15);
        assert_eq!(&y.data()[1..], &[0.0, 2.0]);

        let gx = layer.bprop(&x, &y, &tensor!([[1.0, 1.0, 1.0]])).unwrap();
        assert!((gx.data()[0] - 0.5 * (-1.0_f64).exp()).abs() < 1e-15);
        assert_eq!(&gx.data()[1..], &[0.0, 1.0]);
    }

    #[test]
    fn selu_is_scaled_elu() {
        let x = tensor!([[(-0.7), 1.3]]);
        let elu = EluLayer::new(SELU_ALPHA).fprop(&x).unwrap();
        let selu = SeluLayer::default().fprop(&x).unwrap();
        for (e, s) in elu.data().iter().zip(selu.data()) {
            assert!((e * SELU_SCALE - s).abs() < 1e-15);
        }
        assert_eq!(
            SeluLayer::new(1.0, 2.0).to_string(),
            "SeluLayer(alpha=1, scale=2)"
        );
    }
}
