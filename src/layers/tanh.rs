//! Hyperbolic tangent.

use super::{expect_elementwise, map, zip_map, Layer};
use crate::error::Result;
use crate::tensors::Tensor;
use core::fmt;

/// Element-wise `y = tanh(x)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TanhLayer;

impl Layer for TanhLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        Ok(map(inputs, f64::tanh))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("TanhLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        Ok(zip_map(outputs, grads_wrt_outputs, |y, dy| dy * (1.0 - y * y)))
    }
}

impl fmt::Display for TanhLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TanhLayer")
    }
}
