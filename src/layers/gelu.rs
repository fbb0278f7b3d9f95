//! Gaussian error linear unit, tanh approximation.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::f64::consts::{FRAC_2_SQRT_PI, FRAC_1_SQRT_2};
use core::fmt;

/// `sqrt(2 / pi)`
const SQRT_2_OVER_PI: f64 = FRAC_2_SQRT_PI * FRAC_1_SQRT_2;
const COEFF: f64 = 0.044_715;

/// Element-wise `y = 0.5 x (1 + tanh(sqrt(2/pi) (x + 0.044715 x³)))`.
///
/// `bprop` is the exact derivative of this approximation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeluLayer;

#[inline]
fn inner(x: f64) -> f64 {
    SQRT_2_OVER_PI * (x + COEFF * x * x * x)
}

impl Layer for GeluLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        Ok(map(inputs, |x| 0.5 * x * (1.0 + inner(x).tanh())))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("GeluLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        Ok(zip_map(inputs, grads_wrt_outputs, |x, dy| {
            let t = inner(x).tanh();
            let dinner = SQRT_2_OVER_PI * (1.0 + 3.0 * COEFF * x * x);
            dy * (0.5 * (1.0 + t) + 0.5 * x * (1.0 - t * t) * dinner)
        }))
    }
}

impl fmt::Display for GeluLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GeluLayer")
    }
}
