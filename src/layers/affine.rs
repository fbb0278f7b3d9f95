//! Fully connected affine layer.

use super::{Layer, ParameterizedLayer, DEFAULT_SEED};
use crate::error::{LayerError, Result};
use crate::init::{ConstantInit, Initializer, UniformInit};
use crate::ops;
use crate::penalty::Penalty;
use crate::tensors::Tensor;
use core::fmt;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Half-width of the default uniform weight initialisation.
const DEFAULT_WEIGHT_SCALE: f64 = 0.1;

/// `y = x · Wᵗ + b`, with `W` of shape `(output_dim, input_dim)` and `b` of
/// shape `(output_dim,)` broadcast over the batch.
///
/// Parameters are ordered `[W, b]`.
///
/// # Example
/// ```rust
/// use mlp_layers::layers::{AffineLayer, Layer};
/// use mlp_layers::tensor;
///
/// let layer = AffineLayer::new(3, 4);
/// let y = layer.fprop(&tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])).unwrap();
/// assert_eq!(y.shape(), &[2, 4]);
/// assert_eq!(layer.to_string(), "AffineLayer(input_dim=3, output_dim=4)");
/// ```
pub struct AffineLayer {
    input_dim: usize,
    output_dim: usize,
    weights: Tensor,
    biases: Tensor,
    weights_penalty: Option<Box<dyn Penalty>>,
    biases_penalty: Option<Box<dyn Penalty>>,
}

impl AffineLayer {
    /// An affine layer with weights uniform in `[-0.1, 0.1)` drawn from a
    /// source seeded with [`DEFAULT_SEED`], zero biases and no penalties.
    #[must_use]
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        let weights = UniformInit::new(-DEFAULT_WEIGHT_SCALE, DEFAULT_WEIGHT_SCALE)
            .init(&[output_dim, input_dim], &mut rng);
        let biases = ConstantInit::new(0.0).init(&[output_dim], &mut rng);
        log::debug!("AffineLayer({input_dim} -> {output_dim}) initialised with defaults");
        Self {
            input_dim,
            output_dim,
            weights,
            biases,
            weights_penalty: None,
            biases_penalty: None,
        }
    }

    /// Starts configuring an affine layer.
    #[must_use]
    pub fn builder(input_dim: usize, output_dim: usize) -> AffineLayerBuilder {
        AffineLayerBuilder::new(input_dim, output_dim)
    }

    /// Number of input features.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Number of output features.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// The weight matrix, `(output_dim, input_dim)`.
    #[must_use]
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// The bias vector, `(output_dim,)`.
    #[must_use]
    pub fn biases(&self) -> &Tensor {
        &self.biases
    }

    fn expect_input(&self, op: &'static str, inputs: &Tensor) -> Result<()> {
        inputs.expect_matrix(op, self.input_dim)?;
        Ok(())
    }

    fn expect_output(&self, op: &'static str, inputs: &Tensor, t: &Tensor) -> Result<()> {
        t.expect_shape(op, &[inputs.batch_size(), self.output_dim])?;
        Ok(())
    }
}

impl fmt::Display for AffineLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AffineLayer(input_dim={}, output_dim={})",
            self.input_dim, self.output_dim
        )
    }
}

impl Layer for AffineLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        self.expect_input("AffineLayer::fprop", inputs)?;
        let batch = inputs.batch_size();
        let (k, n) = (self.input_dim, self.output_dim);

        let xw = ops::matmul_nt(inputs.data(), self.weights.data(), batch, k, n);
        let b = self.biases.data();
        let out = ops::rows_map(&xw, n, |row, o| {
            o.iter_mut()
                .zip(row.iter().zip(b))
                .for_each(|(o, (v, b))| *o = v + b);
        });
        Ok(Tensor::new(vec![batch, n], out))
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        const OP: &str = "AffineLayer::bprop";
        self.expect_input(OP, inputs)?;
        self.expect_output(OP, inputs, outputs)?;
        self.expect_output(OP, inputs, grads_wrt_outputs)?;

        let batch = inputs.batch_size();
        let gx = ops::matmul_nn(
            grads_wrt_outputs.data(),
            self.weights.data(),
            batch,
            self.output_dim,
            self.input_dim,
        );
        Ok(Tensor::new(vec![batch, self.input_dim], gx))
    }

    fn as_parameterized(&self) -> Option<&dyn ParameterizedLayer> {
        Some(self)
    }

    fn as_parameterized_mut(&mut self) -> Option<&mut dyn ParameterizedLayer> {
        Some(self)
    }
}

impl ParameterizedLayer for AffineLayer {
    fn grads_wrt_params(&self, inputs: &Tensor, grads_wrt_outputs: &Tensor) -> Result<Vec<Tensor>> {
        const OP: &str = "AffineLayer::grads_wrt_params";
        self.expect_input(OP, inputs)?;
        self.expect_output(OP, inputs, grads_wrt_outputs)?;

        let batch = inputs.batch_size();
        let (k, n) = (self.input_dim, self.output_dim);
        let gy = grads_wrt_outputs.data();

        let grads_wrt_weights = ops::matmul_tn(gy, inputs.data(), batch, n, k);
        let grads_wrt_biases = ops::sum_rows(gy, batch, n);
        Ok(vec![
            Tensor::new(vec![n, k], grads_wrt_weights),
            Tensor::new(vec![n], grads_wrt_biases),
        ])
    }

    fn params_penalty(&self) -> f64 {
        let w = self
            .weights_penalty
            .as_ref()
            .map_or(0.0, |p| p.penalty(&self.weights));
        let b = self
            .biases_penalty
            .as_ref()
            .map_or(0.0, |p| p.penalty(&self.biases));
        w + b
    }

    fn penalty_grads(&self) -> Vec<Tensor> {
        let grad = |penalty: &Option<Box<dyn Penalty>>, param: &Tensor| {
            penalty
                .as_ref()
                .map_or_else(|| param.zeros_like(), |p| p.grad(param))
        };
        vec![
            grad(&self.weights_penalty, &self.weights),
            grad(&self.biases_penalty, &self.biases),
        ]
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.weights, &self.biases]
    }

    fn set_params(&mut self, params: Vec<Tensor>) -> Result<()> {
        let [weights, biases]: [Tensor; 2] =
            params
                .try_into()
                .map_err(|rejected: Vec<Tensor>| LayerError::ParamCount {
                    expected: 2,
                    found: rejected.len(),
                })?;
        weights.expect_shape("AffineLayer::set_params", self.weights.shape())?;
        biases.expect_shape("AffineLayer::set_params", self.biases.shape())?;

        self.weights = weights;
        self.biases = biases;
        log::debug!("{self}: parameters replaced");
        Ok(())
    }
}

/// Configures an [`AffineLayer`] before its parameters are drawn.
///
/// ```rust
/// use mlp_layers::init::GlorotUniformInit;
/// use mlp_layers::layers::{AffineLayer, ParameterizedLayer};
/// use mlp_layers::penalty::L2Penalty;
///
/// let layer = AffineLayer::builder(10, 5)
///     .weights_init(GlorotUniformInit::default())
///     .weights_penalty(L2Penalty::new(1e-4))
///     .seed(42)
///     .build()
///     .unwrap();
/// assert!(layer.params_penalty() > 0.0);
/// ```
pub struct AffineLayerBuilder {
    input_dim: usize,
    output_dim: usize,
    weights_init: Box<dyn Initializer>,
    biases_init: Box<dyn Initializer>,
    weights_penalty: Option<Box<dyn Penalty>>,
    biases_penalty: Option<Box<dyn Penalty>>,
    seed: u64,
}

impl AffineLayerBuilder {
    fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            weights_init: Box::new(UniformInit::new(-DEFAULT_WEIGHT_SCALE, DEFAULT_WEIGHT_SCALE)),
            biases_init: Box::new(ConstantInit::new(0.0)),
            weights_penalty: None,
            biases_penalty: None,
            seed: DEFAULT_SEED,
        }
    }

    /// Initialiser for the weight matrix.
    #[must_use]
    pub fn weights_init(mut self, init: impl Initializer + 'static) -> Self {
        self.weights_init = Box::new(init);
        self
    }

    /// Initialiser for the bias vector.
    #[must_use]
    pub fn biases_init(mut self, init: impl Initializer + 'static) -> Self {
        self.biases_init = Box::new(init);
        self
    }

    /// Penalty on the weight matrix.
    #[must_use]
    pub fn weights_penalty(mut self, penalty: impl Penalty + 'static) -> Self {
        self.weights_penalty = Some(Box::new(penalty));
        self
    }

    /// Penalty on the bias vector.
    #[must_use]
    pub fn biases_penalty(mut self, penalty: impl Penalty + 'static) -> Self {
        self.biases_penalty = Some(Box::new(penalty));
        self
    }

    /// Seed of the source the initialisers draw from.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Draws the parameters and builds the layer.
    ///
    /// # Errors
    /// Returns a shape error if an initialiser produced a tensor of the
    /// wrong shape.
    pub fn build(self) -> Result<AffineLayer> {
        let (k, n) = (self.input_dim, self.output_dim);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let weights = self.weights_init.init(&[n, k], &mut rng);
        weights.expect_shape("AffineLayerBuilder::build", &[n, k])?;
        let biases = self.biases_init.init(&[n], &mut rng);
        biases.expect_shape("AffineLayerBuilder::build", &[n])?;

        log::debug!("AffineLayer({k} -> {n}) initialised with seed {}", self.seed);
        Ok(AffineLayer {
            input_dim: k,
            output_dim: n,
            weights,
            biases,
            weights_penalty: self.weights_penalty,
            biases_penalty: self.biases_penalty,
        })
    }
}
