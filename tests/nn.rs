use hydronet::{
    nn::{dropout, init, CellKind, Conv1d, ConvConfig, Init, Linear, Module, Rnn, RnnConfig},
    tensor::{shape, Tensor},
};
use rand::{rngs::StdRng, SeedableRng};

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

#[test]
fn linear_over_leading_axes() {
    let linear = Linear::<f32>::new(3, 5, &mut rng()).unwrap();
    assert_eq!((linear.in_dim(), linear.out_dim()), (3, 5));
    assert_eq!(linear.parameter_count(), 20);

    let xs = Tensor::zeros(&shape([2, 4, 3])).unwrap();
    let ys = linear.forward(&xs).unwrap();
    assert_eq!(ys.dims(), vec![2, 4, 5]);

    // With a zero input only the bias is left, repeated for every position.
    let bias = linear.parameters()[1].ravel();
    let rows: Vec<_> = ys.ravel().chunks(5).map(<[f32]>::to_vec).collect();
    assert!(rows.iter().all(|row| *row == bias));

    let bound = 1.0 / 3f32.sqrt();
    assert!(linear
        .parameters()
        .iter()
        .flat_map(|p| p.ravel())
        .all(|v| v.abs() <= bound + 1e-6));
}

#[test]
fn linear_rejects_wrong_width() {
    let linear = Linear::<f32>::new(3, 5, &mut rng()).unwrap();
    let xs = Tensor::zeros(&shape([2, 4])).unwrap();
    assert!(linear.forward(&xs).is_err());
}

#[test]
fn same_padding_keeps_length() {
    let conv = Conv1d::<f32>::new(3, 6, ConvConfig::same(11), &mut rng()).unwrap();
    assert_eq!(conv.config().padding, 5);
    assert_eq!(conv.parameter_count(), 6 * 3 * 11 + 6);

    for steps in [1, 7, 30] {
        let xs = Tensor::zeros(&shape([2, 3, steps])).unwrap();
        assert_eq!(conv.forward(&xs).unwrap().dims(), vec![2, 6, steps]);
    }
}

#[test]
fn valid_convolution_shrinks() {
    let config = ConvConfig {
        kernel_size: 3,
        padding: 0,
    };
    let conv = Conv1d::<f32>::new(1, 2, config, &mut rng()).unwrap();
    let xs = Tensor::zeros(&shape([1, 1, 10])).unwrap();
    assert_eq!(conv.forward(&xs).unwrap().dims(), vec![1, 2, 8]);
}

#[test]
fn recurrent_parameter_layout() {
    let lstm = Rnn::<f32>::new(CellKind::Lstm, 3, 4, RnnConfig::default(), &mut rng()).unwrap();
    assert_eq!(lstm.kind(), CellKind::Lstm);
    assert_eq!(lstm.parameter_count(), 4 * 4 * (3 + 4) + 2 * 4 * 4);
    let dims: Vec<_> = lstm.parameters().iter().map(|p| p.dims()).collect();
    assert_eq!(dims, [vec![16, 3], vec![16, 4], vec![16], vec![16]]);

    let gru = Rnn::<f32>::new(CellKind::Gru, 3, 4, RnnConfig::default(), &mut rng()).unwrap();
    assert_eq!(gru.parameter_count(), 3 * 4 * (3 + 4) + 2 * 3 * 4);
}

#[test]
fn recurrent_outputs_are_bounded() {
    // Hidden states are products of a gate and a tanh, or convex mixes of tanh values.
    let xs_data: Vec<f64> = (0..60).map(|i| f64::from(i) - 30.0).collect();
    let xs = Tensor::new(&shape([2, 10, 3]), &xs_data).unwrap();
    for kind in [CellKind::Lstm, CellKind::Gru] {
        let config = RnnConfig {
            num_layers: 2,
            bidirectional: true,
            ..RnnConfig::default()
        };
        let rnn = Rnn::<f64>::new(kind, 3, 5, config, &mut rng()).unwrap();
        let ys = rnn.forward(&xs).unwrap();
        assert_eq!(ys.dims(), vec![2, 10, 10]);
        assert!(ys.ravel().iter().all(|y| y.abs() <= 1.0));
    }
}

#[test]
fn dropout_in_evaluation_is_identity() {
    let xs = Tensor::<f32>::fill(&shape([3, 3]), 2.0).unwrap();
    assert_eq!(dropout(&xs, 0.9, false, &mut rng()).unwrap().ravel(), vec![2.0; 9]);
}

#[test]
fn constant_init_for_fixed_parameters() {
    let t = init::<f64, _>(Init::Const(-0.25), &shape([2, 3]), &mut rng()).unwrap();
    assert_eq!(t.ravel(), vec![-0.25; 6]);
}
