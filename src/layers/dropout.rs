//! Dropout: stochastic masking of activations.
//!
//! Each sampling pass keeps every unit independently with probability
//! `incl_prob` and zeroes the rest. Kept units are *not* rescaled; the
//! deterministic pass instead returns the expectation, `x * incl_prob`.
//!
//! The mask of the most recent sampling pass is recorded so `bprop` can
//! route gradients through the same units. Both the random source and the
//! mask live in `RefCell`s, so these layers are `!Sync`.

use super::{
    expect_elementwise, map, zip_map, AffineLayer, Layer, ParameterizedLayer, StochasticLayer,
    DEFAULT_SEED,
};
use crate::error::{LayerError, Result};
use crate::tensors::Tensor;
use core::cell::RefCell;
use core::fmt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random source plus the last mask it produced.
#[derive(Debug)]
struct MaskSampler {
    incl_prob: f64,
    rng: RefCell<StdRng>,
    mask: RefCell<Option<Tensor>>,
}

impl MaskSampler {
    fn new(incl_prob: f64, seed: u64) -> Result<Self> {
        if !(incl_prob > 0.0 && incl_prob <= 1.0) {
            return Err(LayerError::InvalidArgument(format!(
                "inclusion probability must be in (0, 1], got {incl_prob}"
            )));
        }
        Ok(Self {
            incl_prob,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            mask: RefCell::new(None),
        })
    }

    /// Samples a fresh keep-mask for `x`, records it and returns `x * mask`.
    fn sample_and_apply(&self, x: &Tensor) -> Tensor {
        let p = self.incl_prob;
        let mask = {
            let mut rng = self.rng.borrow_mut();
            let data = (0..x.len())
                .map(|_| if rng.random::<f64>() < p { 1.0 } else { 0.0 })
                .collect();
            Tensor::new(x.shape().to_vec(), data)
        };
        let out = zip_map(x, &mask, |v, m| v * m);
        *self.mask.borrow_mut() = Some(mask);
        out
    }

    fn expectation(&self, x: &Tensor) -> Tensor {
        let p = self.incl_prob;
        map(x, move |v| v * p)
    }

    /// `g * mask` with the recorded mask, which must have `g`'s shape.
    fn apply_recorded(&self, op: &'static str, g: &Tensor) -> Result<Tensor> {
        match self.mask.borrow().as_ref() {
            Some(mask) if mask.shape() == g.shape() => Ok(zip_map(g, mask, |g, m| g * m)),
            _ => {
                log::warn!("{op} called without a matching stochastic forward pass");
                Err(LayerError::MissingForwardState(op))
            }
        }
    }

    fn reseed(&self, seed: u64) {
        *self.rng.borrow_mut() = StdRng::seed_from_u64(seed);
        *self.mask.borrow_mut() = None;
    }
}

/// Stochastic dropout of input units.
///
/// ```rust
/// use mlp_layers::layers::{DropoutLayer, Layer, StochasticLayer};
/// use mlp_layers::tensors::Tensor;
///
/// let layer = DropoutLayer::new(0.8).unwrap();
/// let x = Tensor::filled(vec![4, 5], 2.0);
/// let y = layer.fprop(&x).unwrap();
/// assert!(y.data().iter().all(|&v| v == 0.0 || v == 2.0));
///
/// let e = layer.fprop_stochastic(&x, false).unwrap();
/// assert!(e.data().iter().all(|&v| (v - 1.6).abs() < 1e-12));
/// ```
#[derive(Debug)]
pub struct DropoutLayer {
    sampler: MaskSampler,
}

impl DropoutLayer {
    /// Dropout keeping each unit with probability `incl_prob`, seeded with
    /// [`DEFAULT_SEED`].
    ///
    /// # Errors
    /// [`LayerError::InvalidArgument`] unless `0 < incl_prob <= 1`.
    pub fn new(incl_prob: f64) -> Result<Self> {
        Self::with_seed(incl_prob, DEFAULT_SEED)
    }

    /// Same as [`DropoutLayer::new`] with an explicit seed.
    ///
    /// # Errors
    /// [`LayerError::InvalidArgument`] unless `0 < incl_prob <= 1`.
    pub fn with_seed(incl_prob: f64, seed: u64) -> Result<Self> {
        Ok(Self {
            sampler: MaskSampler::new(incl_prob, seed)?,
        })
    }

    /// Probability of keeping a unit.
    #[must_use]
    pub fn incl_prob(&self) -> f64 {
        self.sampler.incl_prob
    }
}

impl Layer for DropoutLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        self.fprop_stochastic(inputs, true)
    }

    /// Masks `grads_wrt_outputs` with the mask of the last sampling pass.
    ///
    /// # Errors
    /// [`LayerError::MissingForwardState`] if no sampling pass over a batch
    /// of this shape has been recorded.
    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        const OP: &str = "DropoutLayer::bprop";
        expect_elementwise(OP, inputs, outputs, grads_wrt_outputs)?;
        self.sampler.apply_recorded(OP, grads_wrt_outputs)
    }

    fn as_stochastic(&self) -> Option<&dyn StochasticLayer> {
        Some(self)
    }
}

impl StochasticLayer for DropoutLayer {
    fn fprop_stochastic(&self, inputs: &Tensor, stochastic: bool) -> Result<Tensor> {
        if stochastic {
            Ok(self.sampler.sample_and_apply(inputs))
        } else {
            Ok(self.sampler.expectation(inputs))
        }
    }

    fn reseed(&self, seed: u64) {
        self.sampler.reseed(seed);
    }
}

impl fmt::Display for DropoutLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DropoutLayer(incl_prob={})", self.sampler.incl_prob)
    }
}

/// An affine layer whose outputs are dropped out.
///
/// `y = (x · Wᵗ + b) * mask` on the sampling pass and
/// `(x · Wᵗ + b) * incl_prob` on the deterministic one. Parameters are
/// ordered `[W, b]` as for [`AffineLayer`].
pub struct DropoutAffineLayer {
    affine: AffineLayer,
    sampler: MaskSampler,
}

impl DropoutAffineLayer {
    /// A default-initialised affine layer with dropout on its outputs.
    ///
    /// # Errors
    /// [`LayerError::InvalidArgument`] unless `0 < incl_prob <= 1`.
    pub fn new(input_dim: usize, output_dim: usize, incl_prob: f64) -> Result<Self> {
        Self::from_affine(AffineLayer::new(input_dim, output_dim), incl_prob, DEFAULT_SEED)
    }

    /// Wraps an already configured affine layer; `seed` drives the masks.
    ///
    /// # Errors
    /// [`LayerError::InvalidArgument`] unless `0 < incl_prob <= 1`.
    pub fn from_affine(affine: AffineLayer, incl_prob: f64, seed: u64) -> Result<Self> {
        Ok(Self {
            affine,
            sampler: MaskSampler::new(incl_prob, seed)?,
        })
    }

    /// Probability of keeping an output unit.
    #[must_use]
    pub fn incl_prob(&self) -> f64 {
        self.sampler.incl_prob
    }

    /// The wrapped affine transform.
    #[must_use]
    pub fn affine(&self) -> &AffineLayer {
        &self.affine
    }

    /// `grads_wrt_outputs` masked with the recorded mask, after checking it
    /// has shape `(batch, output_dim)`.
    fn masked_grads(
        &self,
        op: &'static str,
        inputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        grads_wrt_outputs.expect_shape(op, &[inputs.batch_size(), self.affine.output_dim()])?;
        self.sampler.apply_recorded(op, grads_wrt_outputs)
    }
}

impl Layer for DropoutAffineLayer {
    fn fprop(&self, inputs: &Tensor) -> Result<Tensor> {
        self.fprop_stochastic(inputs, true)
    }

    fn bprop(
        &self,
        inputs: &Tensor,
        outputs: &Tensor,
        grads_wrt_outputs: &Tensor,
    ) -> Result<Tensor> {
        let masked = self.masked_grads("DropoutAffineLayer::bprop", inputs, grads_wrt_outputs)?;
        self.affine.bprop(inputs, outputs, &masked)
    }

    fn as_parameterized(&self) -> Option<&dyn ParameterizedLayer> {
        Some(self)
    }

    fn as_parameterized_mut(&mut self) -> Option<&mut dyn ParameterizedLayer> {
        Some(self)
    }

    fn as_stochastic(&self) -> Option<&dyn StochasticLayer> {
        Some(self)
    }
}

impl StochasticLayer for DropoutAffineLayer {
    fn fprop_stochastic(&self, inputs: &Tensor, stochastic: bool) -> Result<Tensor> {
        let a = self.affine.fprop(inputs)?;
        if stochastic {
            Ok(self.sampler.sample_and_apply(&a))
        } else {
            Ok(self.sampler.expectation(&a))
        }
    }

    fn reseed(&self, seed: u64) {
        self.sampler.reseed(seed);
    }
}

impl ParameterizedLayer for DropoutAffineLayer {
    fn grads_wrt_params(&self, inputs: &Tensor, grads_wrt_outputs: &Tensor) -> Result<Vec<Tensor>> {
        let masked =
            self.masked_grads("DropoutAffineLayer::grads_wrt_params", inputs, grads_wrt_outputs)?;
        self.affine.grads_wrt_params(inputs, &masked)
    }

    fn params_penalty(&self) -> f64 {
        self.affine.params_penalty()
    }

    fn penalty_grads(&self) -> Vec<Tensor> {
        self.affine.penalty_grads()
    }

    fn params(&self) -> Vec<&Tensor> {
        self.affine.params()
    }

    fn set_params(&mut self, params: Vec<Tensor>) -> Result<()> {
        self.affine.set_params(params)
    }
}

impl fmt::Display for DropoutAffineLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DropoutAffineLayer(input_dim={}, output_dim={}, incl_prob={})",
            self.affine.input_dim(),
            self.affine.output_dim(),
            self.sampler.incl_prob
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::StochasticParameterizedLayer;

    #[test]
    fn rejects_out_of_range_probability() {
        for p in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                DropoutLayer::new(p),
                Err(LayerError::InvalidArgument(_))
            ));
        }
        assert!(DropoutLayer::new(1.0).is_ok());
    }

    #[test]
    fn same_seed_same_masks() {
        let x = Tensor::filled(vec![8, 16], 1.0);
        let a = DropoutLayer::with_seed(0.5, 3).unwrap();
        let b = DropoutLayer::with_seed(0.5, 3).unwrap();
        for _ in 0..3 {
            assert_eq!(a.fprop(&x).unwrap(), b.fprop(&x).unwrap());
        }
        let c = DropoutLayer::with_seed(0.5, 4).unwrap();
        assert_ne!(a.fprop(&x).unwrap(), c.fprop(&x).unwrap());
    }

    #[test]
    fn reseed_replays_and_forgets_mask() {
        let x = Tensor::filled(vec![4, 4], 1.0);
        let layer = DropoutLayer::with_seed(0.5, 1).unwrap();
        let first = layer.fprop(&x).unwrap();
        layer.reseed(1);
        let gy = x.clone();
        assert!(matches!(
            layer.bprop(&x, &first, &gy),
            Err(LayerError::MissingForwardState(_))
        ));
        assert_eq!(layer.fprop(&x).unwrap(), first);
    }

    #[test]
    fn bprop_uses_last_mask() {
        let layer = DropoutLayer::with_seed(0.5, 9).unwrap();
        let x = Tensor::filled(vec![3, 7], 1.0);
        let y = layer.fprop(&x).unwrap();
        let gx = layer.bprop(&x, &y, &Tensor::filled(vec![3, 7], 5.0)).unwrap();
        for (g, m) in gx.data().iter().zip(y.data()) {
            assert_eq!(*g, 5.0 * m);
        }
    }

    #[test]
    fn bprop_without_forward_pass_fails() {
        let layer = DropoutLayer::new(0.5).unwrap();
        let x = Tensor::zeros(vec![2, 2]);
        let err = layer.bprop(&x, &x, &x).unwrap_err();
        assert_eq!(err, LayerError::MissingForwardState("DropoutLayer::bprop"));

        // a mask for another shape does not count
        layer.fprop(&Tensor::zeros(vec![3, 2])).unwrap();
        assert!(layer.bprop(&x, &x, &x).is_err());
    }

    #[test]
    fn dropout_affine_masks_outputs_and_gradients() {
        fn assert_capabilities(_: &dyn StochasticParameterizedLayer) {}

        let layer = DropoutAffineLayer::new(3, 5, 0.5).unwrap();
        assert_capabilities(&layer);
        let x = Tensor::filled(vec![2, 3], 1.0);

        let expected = layer.fprop_stochastic(&x, false).unwrap();
        let full = layer.affine().fprop(&x).unwrap();
        for (e, a) in expected.data().iter().zip(full.data()) {
            assert!((e - 0.5 * a).abs() < 1e-15);
        }

        let y = layer.fprop(&x).unwrap();
        let gy = Tensor::filled(vec![2, 5], 1.0);
        let grads = layer.grads_wrt_params(&x, &gy).unwrap();
        let mask = layer.sampler.mask.borrow().clone().unwrap();
        let kept_per_unit = layer.affine().grads_wrt_params(&x, &mask).unwrap();
        assert_eq!(grads, kept_per_unit);
        assert_eq!(layer.bprop(&x, &y, &gy).unwrap().shape(), &[2, 3]);
        assert_eq!(
            layer.to_string(),
            "DropoutAffineLayer(input_dim=3, output_dim=5, incl_prob=0.5)"
        );
    }

    #[test]
    fn dropout_affine_reports_wrong_gradient_shape() {
        let layer = DropoutAffineLayer::new(3, 5, 0.5).unwrap();
        let x = Tensor::filled(vec![2, 3], 1.0);
        let y = layer.fprop(&x).unwrap();
        let bad = Tensor::filled(vec![2, 4], 1.0);

        let err = layer.bprop(&x, &y, &bad).unwrap_err();
        assert!(matches!(err, LayerError::Shape(ref e) if e.expected == vec![2, 5]));
        assert!(matches!(
            layer.grads_wrt_params(&x, &bad),
            Err(LayerError::Shape(_))
        ));

        // right shape but no sampling pass yet
        layer.reseed(2);
        assert!(matches!(
            layer.bprop(&x, &y, &Tensor::filled(vec![2, 5], 1.0)),
            Err(LayerError::MissingForwardState(_))
        ));
    }
}
