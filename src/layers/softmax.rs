//! Softmax over the last axis.

use super::{expect_elementwise, Layer};
use crate::error::Result;
use crate::ops;
use crate::tensors::Tensor;
use core::fmt;

/// Row-wise `y_i = exp(x_i) / Σ_j exp(x_j)`, each row normalised over the
/// last axis.
///
/// The row maximum is subtracted before exponentiating, so large inputs
/// do not overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftmaxLayer;

fn row_width(t: &Tensor) -> usize {
    t.shape().last().copied().unwrap_or(1)
}

impl Layer for SoftmaxLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        let out = ops::rows_map(inputs.data(), row_width(inputs), |row, o| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for (o, &x) in o.iter_mut().zip(row) {
                *o = (x - max).exp();
                sum += *o;
            }
            o.iter_mut().for_each(|o| *o /= sum);
        });
        Ok(Tensor::new(inputs.shape().to_vec(), out))
    }

    /// `y * (gy - Σ gy·y)` per row, the Jacobian-vector product of softmax.
    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        expect_elementwise("SoftmaxLayer::bprop", inputs, outputs, grads_wrt_outputs)?;
        let gx = ops::rows_zip_map(
            outputs.data(),
            grads_wrt_outputs.data(),
            row_width(outputs),
            |y, dy, o| {
                let dot: f64 = y.iter().zip(dy).map(|(y, dy)| y * dy).sum();
                for ((o, &y), &dy) in o.iter_mut().zip(y).zip(dy) {
                    *o = y * (dy - dot);
                }
            },
        );
        Ok(Tensor::new(outputs.shape().to_vec(), gx))
    }
}

impl fmt::Display for SoftmaxLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SoftmaxLayer")
    }
}
