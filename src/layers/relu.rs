//! Rectified linear unit.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::fmt;

/// Element-wise `y = max(0, x)`.
///
/// The gradient passes only where `x > 0`; at exactly zero it is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReluLayer;

impl Layer for ReluLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        // `f64::max` would swallow NaN
        Ok(map(inputs, |x| if x < 0.0 { 0.0 } else { x }))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("ReluLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        Ok(zip_map(inputs, grads_wrt_outputs, |x, dy| {
            if x > 0.0 { dy } else { 0.0 }
        }))
    }
}

impl fmt::Display for ReluLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReluLayer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn masks_non_positive() {
        let x = tensor!([[(-1.0), 0.0, 2.0]]);
        let y = ReluLayer.fprop(&x).unwrap();
        assert_eq!(y.data(), &[0.0, 0.0, 2.0]);
        let gx = ReluLayer.bprop(&x, &y, &tensor!([[1.0, 1.0, 1.0]])).unwrap();
        assert_eq!(gx.data(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn propagates_nan() {
        let y = ReluLayer.fprop(&tensor!([[(f64::NAN), (-0.0), 3.0]])).unwrap();
        assert!(y.data()[0].is_nan());
        assert_eq!(&y.data()[1..], &[0.0, 3.0]);
    }
}
