//! Finite-difference gradient checking.
//!
//! Every check reduces a layer to the scalar `L = Σ fprop(x) ⊙ gy` for a
//! fixed upstream gradient `gy`, so that `dL/dx` is exactly what `bprop`
//! should return and `dL/dθ` what `grads_wrt_params` should return. The
//! numeric side uses central differences.
//!
//! ```rust
//! use mlp_layers::gradcheck::check_bprop;
//! use mlp_layers::layers::TanhLayer;
//! use mlp_layers::tensor;
//!
//! let x = tensor!([[0.1, (-0.4)], [1.2, 0.7]]);
//! let gy = tensor!([[1.0, 2.0], [(-1.0), 0.5]]);
//! assert!(check_bprop(&TanhLayer, &x, &gy).unwrap().passed());
//! ```
//!
//! Stochastic layers resample on every forward pass and cannot be checked
//! this way.

use crate::approx::{ApproxEquality, AVG_ERROR};
use crate::error::Result;
use crate::layers::{Layer, ParameterizedLayer};
use crate::tensors::Tensor;

/// Perturbation used for central differences.
pub const STEP: f64 = 1e-6;

/// Outcome of comparing an analytic gradient with a numeric one.
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheck {
    /// Gradient reported by the layer.
    pub analytic: Tensor,
    /// Central-difference estimate.
    pub numeric: Tensor,
    /// Largest element-wise `|a - n| / max(1, |a|, |n|)`.
    pub max_rel_error: f64,
}

impl GradCheck {
    fn new(analytic: Tensor, numeric: Tensor) -> Result<Self> {
        numeric.expect_shape("gradcheck", analytic.shape())?;
        let max_rel_error = analytic
            .data()
            .iter()
            .zip(numeric.data())
            .map(|(a, n)| (a - n).abs() / a.abs().max(n.abs()).max(1.0))
            .fold(0.0, f64::max);
        Ok(Self {
            analytic,
            numeric,
            max_rel_error,
        })
    }

    /// The error tier of [`GradCheck::max_rel_error`].
    #[must_use]
    pub fn grade(&self) -> ApproxEquality {
        ApproxEquality::grade(self.max_rel_error)
    }

    /// Whether the gradients agree to within [`AVG_ERROR`].
    #[must_use]
    pub fn passed(&self) -> bool {
        self.max_rel_error < AVG_ERROR
    }
}

fn weighted_sum(y: &Tensor, gy: &Tensor) -> Result<f64> {
    gy.expect_shape("gradcheck", y.shape())?;
    Ok(y.data().iter().zip(gy.data()).map(|(y, g)| y * g).sum())
}

/// Central-difference gradient of `f` at `x`.
///
/// # Errors
/// Propagates any error from `f`.
pub fn central_difference<F>(x: &Tensor, mut f: F) -> Result<Tensor>
where
    F: FnMut(&Tensor) -> Result<f64>,
{
    let mut probe = x.clone();
    let mut grad = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let orig = probe.data()[i];
        probe.data_mut()[i] = orig + STEP;
        let plus = f(&probe)?;
        probe.data_mut()[i] = orig - STEP;
        let minus = f(&probe)?;
        probe.data_mut()[i] = orig;
        grad.push((plus - minus) / (2.0 * STEP));
    }
    Ok(Tensor::new(x.shape().to_vec(), grad))
}

/// Compares [`Layer::bprop`] with central differences of `fprop`.
///
/// # Errors
/// Propagates shape errors from the layer.
pub fn check_bprop(layer: &dyn Layer, inputs: &Tensor, grads_wrt_outputs: &Tensor) -> Result<GradCheck> {
    let outputs = layer.fprop(inputs)?;
    let analytic = layer.bprop(inputs, &outputs, grads_wrt_outputs)?;
    let numeric = central_difference(inputs, |x| weighted_sum(&layer.fprop(x)?, grads_wrt_outputs))?;
    GradCheck::new(analytic, numeric)
}

/// Compares [`ParameterizedLayer::grads_wrt_params`] with central
/// differences, one [`GradCheck`] per parameter in `params` order.
///
/// The layer's parameters are perturbed through `set_params` and restored
/// before returning.
///
/// # Errors
/// Propagates shape errors from the layer.
pub fn check_grads_wrt_params(
    layer: &mut dyn ParameterizedLayer,
    inputs: &Tensor,
    grads_wrt_outputs: &Tensor,
) -> Result<Vec<GradCheck>> {
    let analytic = layer.grads_wrt_params(inputs, grads_wrt_outputs)?;
    let original: Vec<Tensor> = layer.params().into_iter().cloned().collect();

    let mut checks = Vec::with_capacity(original.len());
    for (j, a) in analytic.into_iter().enumerate() {
        let numeric = central_difference(&original[j], |p| {
            let mut params = original.clone();
            params[j] = p.clone();
            layer.set_params(params)?;
            weighted_sum(&layer.fprop(inputs)?, grads_wrt_outputs)
        });
        layer.set_params(original.clone())?;
        checks.push(GradCheck::new(a, numeric?)?);
    }
    Ok(checks)
}

/// Compares [`ParameterizedLayer::penalty_grads`] with central differences
/// of [`ParameterizedLayer::params_penalty`].
///
/// # Errors
/// Propagates errors from `set_params`.
pub fn check_penalty_grads(layer: &mut dyn ParameterizedLayer) -> Result<Vec<GradCheck>> {
    let analytic = layer.penalty_grads();
    let original: Vec<Tensor> = layer.params().into_iter().cloned().collect();

    let mut checks = Vec::with_capacity(original.len());
    for (j, a) in analytic.into_iter().enumerate() {
        let numeric = central_difference(&original[j], |p| {
            let mut params = original.clone();
            params[j] = p.clone();
            layer.set_params(params)?;
            Ok(layer.params_penalty())
        });
        layer.set_params(original.clone())?;
        checks.push(GradCheck::new(a, numeric?)?);
    }
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn central_difference_of_square() {
        let x = tensor!([1.0, (-2.0), 0.5]);
        let g = central_difference(&x, |t| Ok(t.data().iter().map(|v| v * v).sum())).unwrap();
        let expected = tensor!([2.0, (-4.0), 1.0]);
        assert!(g.approx_eq(&expected).at_least(ApproxEquality::Partial));
    }

    #[test]
    fn detects_wrong_gradient() {
        let check = GradCheck::new(tensor!([1.0, 2.0]), tensor!([1.0, 2.1])).unwrap();
        assert!(!check.passed());
        assert_eq!(check.grade(), ApproxEquality::Scarce);
    }
}
