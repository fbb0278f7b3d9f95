use approx::assert_abs_diff_eq;
use mlp_layers::gradcheck::{check_bprop, check_grads_wrt_params, check_penalty_grads};
use mlp_layers::init::NormalInit;
use mlp_layers::layers::{
    AffineLayer, EluLayer, GeluLayer, IsrluLayer, Layer, ParameterizedLayer, ReluLayer,
    ReshapeLayer, SeluLayer, SigmoidLayer, SoftmaxLayer, TanhLayer,
};
use mlp_layers::penalty::{L1Penalty, L2Penalty};
use mlp_layers::tensors::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-5;

/// Random values bounded away from zero so kinked activations are smooth
/// around every sample.
fn random(shape: &[usize], seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = shape.iter().product();
    let data = (0..n)
        .map(|_| {
            let v: f64 = rng.random_range(0.1..2.0);
            if rng.random::<bool>() { v } else { -v }
        })
        .collect();
    Tensor::new(shape.to_vec(), data)
}

fn assert_bprop_matches(layer: &dyn Layer, shape: &[usize]) {
    let x = random(shape, 1);
    let y = layer.fprop(&x).unwrap();
    let gy = random(y.shape(), 2);
    let check = check_bprop(layer, &x, &gy).unwrap();
    assert!(
        check.max_rel_error < TOL,
        "{layer}: max relative error {}",
        check.max_rel_error
    );
}

#[test]
fn elementwise_activations() {
    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(SigmoidLayer),
        Box::new(TanhLayer),
        Box::new(ReluLayer),
        Box::new(EluLayer::new(0.7)),
        Box::new(SeluLayer::default()),
        Box::new(GeluLayer),
        Box::new(IsrluLayer::new(2.0)),
    ];
    for layer in &layers {
        assert_bprop_matches(layer.as_ref(), &[4, 5]);
    }
}

#[test]
fn elementwise_activations_accept_higher_rank() {
    assert_bprop_matches(&TanhLayer, &[2, 3, 2]);
    assert_bprop_matches(&GeluLayer, &[3, 1, 4]);
}

#[test]
fn softmax() {
    assert_bprop_matches(&SoftmaxLayer, &[3, 6]);
}

#[test]
fn reshape() {
    assert_bprop_matches(&ReshapeLayer::new(Some(vec![2, -1])).unwrap(), &[3, 8]);
}

#[test]
fn affine_inputs_and_params() {
    let mut layer = AffineLayer::builder(4, 3)
        .weights_init(NormalInit::new(0.0, 0.5).unwrap())
        .seed(8)
        .build()
        .unwrap();
    assert_bprop_matches(&layer, &[5, 4]);

    let x = random(&[5, 4], 3);
    let gy = random(&[5, 3], 4);
    let before: Vec<Tensor> = layer.params().into_iter().cloned().collect();
    let checks = check_grads_wrt_params(&mut layer, &x, &gy).unwrap();
    assert_eq!(checks.len(), 2);
    for check in &checks {
        assert!(check.passed(), "max relative error {}", check.max_rel_error);
    }

    // parameters restored after probing
    let after: Vec<Tensor> = layer.params().into_iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn penalties() {
    let mut layer = AffineLayer::builder(3, 2)
        .weights_init(NormalInit::new(0.0, 1.0).unwrap())
        .biases_init(NormalInit::new(0.5, 0.1).unwrap())
        .weights_penalty(L2Penalty::new(0.3))
        .biases_penalty(L1Penalty::new(0.2))
        .build()
        .unwrap();
    for check in check_penalty_grads(&mut layer).unwrap() {
        assert!(check.passed(), "max relative error {}", check.max_rel_error);
    }
}

#[test]
fn sigmoid_derivative_at_zero() {
    let x = Tensor::zeros(vec![1, 1]);
    let y = SigmoidLayer.fprop(&x).unwrap();
    let gx = SigmoidLayer.bprop(&x, &y, &Tensor::filled(vec![1, 1], 1.0)).unwrap();
    assert_abs_diff_eq!(y.data()[0], 0.5);
    assert_abs_diff_eq!(gx.data()[0], 0.25);
}
