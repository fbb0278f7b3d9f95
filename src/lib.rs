//! # `mlp_layers`
//!
//! Composable neural-network layers with hand-written forward and backward
//! passes. Each layer maps a batch of inputs to outputs (`fprop`) and maps
//! gradients with respect to its outputs back onto its inputs (`bprop`);
//! layers with weights also report gradients with respect to them.
//!
//! ## Features
//!
//! - **Layers**: affine, sigmoid, tanh, softmax, ReLU, ELU, SELU, GELU,
//!   ISRLU, reshape, dropout and dropout-affine
//! - **Capabilities as traits**: [`Layer`](layers::Layer),
//!   [`ParameterizedLayer`](layers::ParameterizedLayer) and
//!   [`StochasticLayer`](layers::StochasticLayer), object-safe so a trainer
//!   can chain `Box<dyn Layer>`
//! - **Pluggable strategies**: parameter [`init`]ialisers and [`penalty`]
//!   terms injected at construction
//! - **Kernels**: serial or `rayon`-parallel, selected at runtime through
//!   [`backend`], with identical results either way
//! - **Verification**: finite-difference [`gradcheck`]s
//!
//! The training loop, datasets and optimisers live outside this crate.
//!
//! ## Example
//!
//! ```rust
//! use mlp_layers::layers::{AffineLayer, Layer, ParameterizedLayer, SigmoidLayer};
//! use mlp_layers::tensor;
//!
//! let affine = AffineLayer::new(2, 3);
//! let sigmoid = SigmoidLayer;
//!
//! let x = tensor!([[0.5, (-1.0)], [2.0, 0.0]]);
//! let h = affine.fprop(&x).unwrap();
//! let y = sigmoid.fprop(&h).unwrap();
//!
//! let gy = tensor!([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
//! let gh = sigmoid.bprop(&h, &y, &gy).unwrap();
//! let gx = affine.bprop(&x, &h, &gh).unwrap();
//! let grads = affine.grads_wrt_params(&x, &gh).unwrap();
//!
//! assert_eq!(gx.shape(), x.shape());
//! assert_eq!(grads[0].shape(), &[3, 2]);
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
#![deny(unsafe_code)]
#![forbid(unused_must_use)]
#![forbid(missing_docs)]

pub mod approx;
pub mod backend;
pub mod error;
pub mod gradcheck;
pub mod init;
pub mod layers;
pub mod ops;
pub mod penalty;
pub mod tensors;

pub use error::{LayerError, Result, ShapeError};
pub use tensors::Tensor;
