//! # Layers
//!
//! A layer maps a batch of inputs to a batch of outputs (`fprop`) and maps
//! gradients with respect to its outputs back to gradients with respect to
//! its inputs (`bprop`). Layers are stateless per call: everything `bprop`
//! needs is passed back in by the caller.
//!
//! ## Capabilities
//!
//! | Trait | Adds |
//! |---|---|
//! | [`Layer`] | `fprop`, `bprop` |
//! | [`ParameterizedLayer`] | `params`, `set_params`, `grads_wrt_params`, `params_penalty` |
//! | [`StochasticLayer`] | `fprop_stochastic`, `reseed` |
//! | [`StochasticParameterizedLayer`] | both of the above |
//!
//! A trainer holding `Vec<Box<dyn Layer>>` discovers the extra capabilities
//! through [`Layer::as_parameterized`] and friends.
//!
//! ## Example
//!
//! ```rust
//! use mlp_layers::layers::{AffineLayer, Layer, SoftmaxLayer};
//! use mlp_layers::tensor;
//!
//! let chain: Vec<Box<dyn Layer>> = vec![
//!     Box::new(AffineLayer::new(3, 4)),
//!     Box::new(SoftmaxLayer),
//! ];
//! let mut x = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
//! for layer in &chain {
//!     x = layer.fprop(&x).unwrap();
//! }
//! assert_eq!(x.shape(), &[2, 4]);
//! ```

use crate::error::Result;
use crate::ops;
use crate::tensors::Tensor;
use core::fmt;

mod affine;
mod dropout;
mod elu;
mod gelu;
mod isrlu;
mod relu;
mod reshape;
mod sigmoid;
mod softmax;
mod tanh;

pub use affine::{AffineLayer, AffineLayerBuilder};
pub use dropout::{DropoutAffineLayer, DropoutLayer};
pub use elu::{EluLayer, SeluLayer, SELU_ALPHA, SELU_SCALE};
pub use gelu::GeluLayer;
pub use isrlu::IsrluLayer;
pub use relu::ReluLayer;
pub use reshape::ReshapeLayer;
pub use sigmoid::SigmoidLayer;
pub use softmax::SoftmaxLayer;
pub use tanh::TanhLayer;

/// Seed for every layer-owned random source that is not given one explicitly.
pub const DEFAULT_SEED: u64 = 123_456;

/// A transformation of a batch of inputs.
///
/// `Display` gives a short description such as
/// `AffineLayer(input_dim=3, output_dim=4)`.
pub trait Layer: fmt::Display {
    /// Forward propagates a batch through the layer.
    ///
    /// # Errors
    /// Returns a shape error if `inputs` does not match the layer's input
    /// dimensionality.
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor>;

    /// Back propagates gradients through the layer.
    ///
    /// `outputs` must be what [`Layer::fprop`] returned for `inputs`; this is
    /// not re-checked. The result has the shape of `inputs`.
    ///
    /// # Errors
    /// Returns a shape error if the three tensors disagree with each other
    /// or with the layer.
    fn bprop(&self, inputs: &Tensor, outputs: &Tensor, grads_wrt_outputs: &Tensor)
    -> Result<Tensor>;

    /// This layer as a [`ParameterizedLayer`], if it has parameters.
    fn as_parameterized(&self) -> Option<&dyn ParameterizedLayer> {
        None
    }

    /// Mutable version of [`Layer::as_parameterized`].
    fn as_parameterized_mut(&mut self) -> Option<&mut dyn ParameterizedLayer> {
        None
    }

    /// This layer as a [`StochasticLayer`], if its forward pass samples.
    fn as_stochastic(&self) -> Option<&dyn StochasticLayer> {
        None
    }
}

/// A layer with learnable parameters.
///
/// [`params`](Self::params), [`set_params`](Self::set_params),
/// [`grads_wrt_params`](Self::grads_wrt_params) and
/// [`penalty_grads`](Self::penalty_grads) all use the same fixed order.
pub trait ParameterizedLayer: Layer {
    /// Gradients of the loss with respect to each parameter.
    ///
    /// # Errors
    /// Returns a shape error if `inputs` and `grads_wrt_outputs` do not fit
    /// the layer.
    fn grads_wrt_params(&self, inputs: &Tensor, grads_wrt_outputs: &Tensor)
    -> Result<Vec<Tensor>>;

    /// Sum of the configured parameter penalties, `0.0` if there are none.
    fn params_penalty(&self) -> f64;

    /// Gradient of [`params_penalty`](Self::params_penalty) with respect to
    /// each parameter; zeros for unpenalised parameters.
    fn penalty_grads(&self) -> Vec<Tensor>;

    /// The learnable tensors.
    fn params(&self) -> Vec<&Tensor>;

    /// Replaces every learnable tensor.
    ///
    /// # Errors
    /// [`LayerError::ParamCount`](crate::error::LayerError::ParamCount) for
    /// the wrong number of tensors and a shape error for a wrongly shaped
    /// one. Parameters are left untouched on error.
    fn set_params(&mut self, params: Vec<Tensor>) -> Result<()>;
}

/// A layer whose forward pass draws from its own random source.
///
/// [`Layer::fprop`] on a stochastic layer is the sampling pass, and
/// [`Layer::bprop`] always differentiates the most recent sampling pass.
pub trait StochasticLayer: Layer {
    /// Forward propagates either a sampled (`stochastic = true`) or the
    /// expected (`stochastic = false`) transformation.
    ///
    /// # Errors
    /// Same as [`Layer::fprop`].
    fn fprop_stochastic(&self, inputs: &Tensor, stochastic: bool) -> Result<Tensor>;

    /// Restarts the random source from `seed` and forgets any recorded sample.
    fn reseed(&self, seed: u64);
}

/// A stochastic layer that also has learnable parameters.
pub trait StochasticParameterizedLayer: StochasticLayer + ParameterizedLayer {}

impl<T: StochasticLayer + ParameterizedLayer> StochasticParameterizedLayer for T {}

/// Checks that `outputs` and `grads_wrt_outputs` both match the shape of
/// `inputs`, as they must for a shape-preserving layer.
pub(crate) fn expect_elementwise(
    op: &'static str,
    inputs: &Tensor,
    outputs: &Tensor,
    grads_wrt_outputs: &Tensor,
) -> Result<()> {
    outputs.expect_shape(op, inputs.shape())?;
    grads_wrt_outputs.expect_shape(op, inputs.shape())?;
    Ok(())
}

/// `f` applied element-wise, keeping the shape.
pub(crate) fn map<F>(x: &Tensor, f: F) -> Tensor
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    Tensor::new(x.shape().to_vec(), ops::map(x.data(), f))
}

/// `f` applied element-wise to two same-shaped tensors.
pub(crate) fn zip_map<F>(a: &Tensor, b: &Tensor, f: F) -> Tensor
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    Tensor::new(a.shape().to_vec(), ops::zip_map(a.data(), b.data(), f))
}
