//! Per-example reshaping.

use super::Layer;
use crate::error::{LayerError, Result, ShapeError};
use crate::tensors::Tensor;
use core::fmt;

/// Reinterprets every example in a batch with a new shape.
///
/// Outputs have shape `(batch,) + output_shape`. One entry of
/// `output_shape` may be `-1`, in which case it is inferred from the number
/// of elements per example. Values are never reordered.
///
/// ```rust
/// use mlp_layers::layers::{Layer, ReshapeLayer};
/// use mlp_layers::tensors::Tensor;
///
/// let flatten = ReshapeLayer::new(None).unwrap();
/// let x = Tensor::zeros(vec![2, 3, 4]);
/// assert_eq!(flatten.fprop(&x).unwrap().shape(), &[2, 12]);
/// assert_eq!(flatten.to_string(), "ReshapeLayer(output_shape=(-1,))");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapeLayer {
    output_shape: Vec<isize>,
    placeholder: Option<usize>,
}

impl ReshapeLayer {
    /// A reshape to `output_shape`, or a flatten (`[-1]`) if `None`.
    ///
    /// # Errors
    /// [`LayerError::InvalidArgument`] if more than one entry is `-1` or any
    /// other entry is not positive.
    pub fn new(output_shape: Option<Vec<isize>>) -> Result<Self> {
        let output_shape = output_shape.unwrap_or_else(|| vec![-1]);

        let mut placeholder = None;
        for (i, &d) in output_shape.iter().enumerate() {
            match d {
                -1 if placeholder.is_none() => placeholder = Some(i),
                -1 => {
                    return Err(LayerError::InvalidArgument(format!(
                        "reshape target {output_shape:?} has more than one -1"
                    )));
                }
                d if d <= 0 => {
                    return Err(LayerError::InvalidArgument(format!(
                        "reshape target {output_shape:?} has non-positive dimension {d}"
                    )));
                }
                _ => {}
            }
        }

        Ok(Self {
            output_shape,
            placeholder,
        })
    }

    /// The per-example target shape as given, `-1` included.
    #[must_use]
    pub fn output_shape(&self) -> &[isize] {
        &self.output_shape
    }

    /// The full output shape for `inputs`, with the placeholder resolved.
    fn resolve(&self, inputs: &Tensor) -> core::result::Result<Vec<usize>, ShapeError> {
        const OP: &str = "ReshapeLayer::fprop";
        let batch = inputs.batch_size();
        let per_example = inputs.example_len();

        let mut dims: Vec<usize> = Vec::with_capacity(self.output_shape.len() + 1);
        dims.push(batch);
        // placeholder written as 0 until inferred
        dims.extend(self.output_shape.iter().map(|&d| usize::try_from(d).unwrap_or(0)));
        let known: usize = self
            .output_shape
            .iter()
            .filter_map(|&d| usize::try_from(d).ok())
            .product();

        if inputs.rank() == 0 {
            return Err(ShapeError::new(OP, dims, inputs.shape()));
        }

        match self.placeholder {
            Some(i) if per_example % known == 0 => dims[i + 1] = per_example / known,
            None if per_example == known => {}
            _ => return Err(ShapeError::new(OP, dims, inputs.shape())),
        }
        Ok(dims)
    }
}

impl Layer for ReshapeLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        let shape = self.resolve(inputs)?;
        Ok(inputs.reshape(shape)?)
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        grads_wrt_outputs.expect_shape("ReshapeLayer::bprop", outputs.shape())?;
        Ok(grads_wrt_outputs.reshape(inputs.shape())?)
    }
}

impl fmt::Display for ReshapeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReshapeLayer(output_shape=(")?;
        for (i, d) in self.output_shape.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.output_shape.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str("))")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(shape: Vec<usize>) -> Tensor {
        let n = shape.iter().product::<usize>();
        #[allow(clippy::cast_precision_loss)]
        let data = (0..n).map(|i| i as f64).collect();
        Tensor::new(shape, data)
    }

    #[test]
    fn infers_placeholder() {
        let layer = ReshapeLayer::new(Some(vec![2, -1])).unwrap();
        let y = layer.fprop(&iota(vec![3, 12])).unwrap();
        assert_eq!(y.shape(), &[3, 2, 6]);
        assert_eq!(layer.to_string(), "ReshapeLayer(output_shape=(2, -1))");
    }

    #[test]
    fn round_trip_restores_input() {
        let layer = ReshapeLayer::new(Some(vec![4, 3])).unwrap();
        let x = iota(vec![2, 12]);
        let y = layer.fprop(&x).unwrap();
        assert_eq!(y.data(), x.data());
        let gx = layer.bprop(&x, &y, &y).unwrap();
        assert_eq!(gx, x);
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(ReshapeLayer::new(Some(vec![-1, -1])).is_err());
        assert!(ReshapeLayer::new(Some(vec![0, 3])).is_err());
        assert!(ReshapeLayer::new(Some(vec![-2])).is_err());
    }

    #[test]
    fn rejects_incompatible_counts() {
        let x = iota(vec![2, 10]);
        let err = ReshapeLayer::new(Some(vec![3, -1])).unwrap().fprop(&x).unwrap_err();
        assert!(matches!(err, LayerError::Shape(ref e) if e.op == "ReshapeLayer::fprop"));
        assert!(ReshapeLayer::new(Some(vec![3, 3])).unwrap().fprop(&x).is_err());
    }
}
