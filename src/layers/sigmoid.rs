//! Logistic sigmoid.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::fmt;

/// Element-wise `y = 1 / (1 + exp(-x))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigmoidLayer;

impl Layer for SigmoidLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        Ok(map(inputs, |x| 1.0 / (1.0 + (-x).exp())))
    }

    /// `gy * y * (1 - y)`; only the outputs are needed.
    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("SigmoidLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        Ok(zip_map(outputs, grads_wrt_outputs, |y, dy| dy * y * (1.0 - y)))
    }
}

impl fmt::Display for SigmoidLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigmoidLayer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn half_at_zero() {
        let x = tensor!([[0.0]]);
        let y = SigmoidLayer.fprop(&x).unwrap();
        assert_eq!(y.data(), &[0.5]);
        let gx = SigmoidLayer.bprop(&x, &y, &tensor!([[1.0]])).unwrap();
        assert_eq!(gx.data(), &[0.25]);
    }

    #[test]
    fn saturates_without_nan() {
        let y = SigmoidLayer.fprop(&tensor!([(-800.0), 800.0])).unwrap();
        assert_eq!(y.data(), &[0.0, 1.0]);
    }
}
