use approx::assert_relative_eq;
use mlp_layers::layers::{
    AffineLayer, DropoutAffineLayer, DropoutLayer, Layer, ReluLayer, ReshapeLayer, SigmoidLayer,
    SoftmaxLayer, StochasticLayer, TanhLayer,
};
use mlp_layers::{tensor, LayerError, Tensor};

#[test]
fn test_affine_example_shapes() {
    let layer = AffineLayer::new(3, 4);
    let x = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    let y = layer.fprop(&x).unwrap();
    assert_eq!(y.shape(), &[2, 4]);

    let gy = Tensor::filled(vec![2, 4], 1.0);
    assert_eq!(layer.bprop(&x, &y, &gy).unwrap().shape(), &[2, 3]);

    let p = layer.as_parameterized().unwrap();
    let grads = p.grads_wrt_params(&x, &gy).unwrap();
    let shapes: Vec<&[usize]> = grads.iter().map(Tensor::shape).collect();
    assert_eq!(shapes, vec![&[4, 3][..], &[4][..]]);
    for (g, param) in grads.iter().zip(p.params()) {
        assert_eq!(g.shape(), param.shape());
    }
}

#[test]
fn test_affine_rejects_wrong_dimensionality() {
    let layer = AffineLayer::new(3, 4);
    let err = layer.fprop(&Tensor::zeros(vec![2, 5])).unwrap_err();
    match err {
        LayerError::Shape(e) => {
            assert_eq!(e.expected, vec![2, 3]);
            assert_eq!(e.found, vec![2, 5]);
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(layer.fprop(&Tensor::zeros(vec![6])).is_err());
}

#[test]
fn test_softmax_large_inputs() {
    let y = SoftmaxLayer
        .fprop(&tensor!([[700.5, 701.0, 702.0], [(-3.0), 0.0, 3.0]]))
        .unwrap();
    for i in 0..2 {
        assert_relative_eq!(y.row(i).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
    assert!(y.data().iter().all(|v| v.is_finite() && *v > 0.0));
}

#[test]
fn test_relu_values_and_mask() {
    let x = tensor!([[(-1.0), 0.0, 2.0]]);
    let y = ReluLayer.fprop(&x).unwrap();
    assert_eq!(y, tensor!([[0.0, 0.0, 2.0]]));
    let gx = ReluLayer.bprop(&x, &y, &tensor!([[1.0, 1.0, 1.0]])).unwrap();
    assert_eq!(gx, tensor!([[0.0, 0.0, 1.0]]));

    let nan = ReluLayer.fprop(&tensor!([[(f64::NAN)]])).unwrap();
    assert!(nan.data()[0].is_nan());
}

#[test]
fn test_reshape_round_trip() {
    let layer = ReshapeLayer::new(Some(vec![3, 2])).unwrap();
    let x = tensor!([[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [7.0, 8.0, 9.0, 10.0, 11.0, 12.0]]);
    let y = layer.fprop(&x).unwrap();
    assert_eq!(y.shape(), &[2, 3, 2]);
    let gx = layer.bprop(&x, &y, &y).unwrap();
    assert_eq!(gx, x);

    let flat = ReshapeLayer::new(None).unwrap();
    assert_eq!(flat.fprop(&y).unwrap(), x);
}

#[test]
fn test_set_params_validation() {
    let mut layer = AffineLayer::new(2, 2);
    let p = layer.as_parameterized_mut().unwrap();
    let err = p
        .set_params(vec![Tensor::zeros(vec![2, 2]), Tensor::zeros(vec![2]), Tensor::zeros(vec![2])])
        .unwrap_err();
    assert_eq!(err, LayerError::ParamCount { expected: 2, found: 3 });

    p.set_params(vec![tensor!([[1.0, 0.0], [0.0, 1.0]]), tensor!([1.0, 1.0])])
        .unwrap();
    let y = layer.fprop(&tensor!([[2.0, 3.0]])).unwrap();
    assert_eq!(y, tensor!([[3.0, 4.0]]));
}

#[test]
fn test_chain_of_boxed_layers() {
    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(ReshapeLayer::new(None).unwrap()),
        Box::new(AffineLayer::new(6, 5)),
        Box::new(TanhLayer),
        Box::new(AffineLayer::new(5, 3)),
        Box::new(SigmoidLayer),
        Box::new(SoftmaxLayer),
    ];

    let x = Tensor::filled(vec![4, 2, 3], 0.3);
    let mut activations = vec![x];
    for layer in &layers {
        let next = layer.fprop(activations.last().unwrap()).unwrap();
        activations.push(next);
    }
    assert_eq!(activations.last().unwrap().shape(), &[4, 3]);

    let mut grad = Tensor::filled(vec![4, 3], 1.0);
    let mut param_grads = 0;
    for (i, layer) in layers.iter().enumerate().rev() {
        let (inputs, outputs) = (&activations[i], &activations[i + 1]);
        if let Some(p) = layer.as_parameterized() {
            param_grads += p.grads_wrt_params(inputs, &grad).unwrap().len();
        }
        grad = layer.bprop(inputs, outputs, &grad).unwrap();
        assert_eq!(grad.shape(), inputs.shape());
    }
    assert_eq!(param_grads, 4);

    let names: Vec<String> = layers.iter().map(ToString::to_string).collect();
    assert_eq!(names[1], "AffineLayer(input_dim=6, output_dim=5)");
    assert_eq!(names[0], "ReshapeLayer(output_shape=(-1,))");
}

#[test]
fn test_dropout_reproducible_and_deterministic_mode() {
    let x = tensor!([[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
    let a = DropoutLayer::with_seed(0.5, 42).unwrap();
    let b = DropoutLayer::with_seed(0.5, 42).unwrap();
    assert_eq!(a.fprop(&x).unwrap(), b.fprop(&x).unwrap());

    let expected = a.fprop_stochastic(&x, false).unwrap();
    assert_eq!(expected, x.map(|v| v * 0.5));

    let boxed: Box<dyn Layer> = Box::new(DropoutAffineLayer::new(4, 2, 0.9).unwrap());
    assert!(boxed.as_stochastic().is_some());
    assert!(boxed.as_parameterized().is_some());
    assert!(SigmoidLayer.as_stochastic().is_none());
}

#[test]
fn test_dropout_keep_rate() {
    let layer = DropoutLayer::with_seed(0.3, 5).unwrap();
    let y = layer.fprop(&Tensor::filled(vec![100, 100], 1.0)).unwrap();
    let kept = y.data().iter().filter(|&&v| v == 1.0).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = kept as f64 / y.len() as f64;
    assert!((rate - 0.3).abs() < 0.02, "keep rate {rate}");
}

#[test]
fn test_dropout_bprop_requires_forward_pass() {
    let layer = DropoutLayer::new(0.5).unwrap();
    let x = Tensor::filled(vec![2, 2], 1.0);
    assert!(matches!(
        layer.bprop(&x, &x, &x),
        Err(LayerError::MissingForwardState(_))
    ));
}
