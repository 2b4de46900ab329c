use hydronet::{
    models::{Model, ModelConfig, ModelKind},
    nn::Module,
    tensor::{shape, Tensor},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

const KINDS: [ModelKind; 5] = [
    ModelKind::Lstm,
    ModelKind::Gru,
    ModelKind::ConvGru,
    ModelKind::FullyConv,
    ModelKind::Ffn,
];

fn build(config: &ModelConfig) -> Model<f64> {
    Model::new(config, &mut StdRng::seed_from_u64(42)).unwrap()
}

fn random_input(dims: [usize; 3], seed: u64) -> (Vec<f64>, Tensor<f64>) {
    let data: Vec<f64> = StdRng::seed_from_u64(seed)
        .sample_iter(StandardNormal)
        .take(dims.iter().product())
        .collect();
    let xs = Tensor::new(&shape(dims), &data).unwrap();
    (data, xs)
}

#[test]
fn output_shapes() {
    let (_, xs) = random_input([2, 12, 3], 0);
    for kind in KINDS {
        for bidirectional in [false, true] {
            let config = ModelConfig {
                num_layers: 2,
                bidirectional,
                ..ModelConfig::new(kind, 3, 6, 2)
            };
            let model = build(&config);
            assert_eq!(model.kind(), kind);
            let ys = model.forward(&xs).unwrap();
            assert_eq!(ys.dims(), vec![2, 12, 2], "{} bidirectional={bidirectional}", model.name());
            assert!(ys.ravel().iter().all(|y| y.is_finite()));
        }
    }
}

#[test]
fn names() {
    let names: Vec<_> = KINDS
        .iter()
        .map(|&kind| build(&ModelConfig::new(kind, 3, 4, 1)).name())
        .collect();
    assert_eq!(names, ["LSTM", "GRU", "ConvGru", "FullyConv", "FFN"]);
}

#[test]
fn parameter_counts() {
    let count = |config: ModelConfig| build(&config).parameter_count();

    let ffn = ModelConfig {
        num_layers: 3,
        ..ModelConfig::new(ModelKind::Ffn, 3, 8, 1)
    };
    assert_eq!(count(ffn), 41);

    assert_eq!(count(ModelConfig::new(ModelKind::Lstm, 3, 4, 2)), 154);
    let bidirectional = ModelConfig {
        bidirectional: true,
        ..ModelConfig::new(ModelKind::Lstm, 3, 4, 2)
    };
    assert_eq!(count(bidirectional), 306);

    assert_eq!(count(ModelConfig::new(ModelKind::Gru, 3, 4, 2)), 118);
    assert_eq!(count(ModelConfig::new(ModelKind::FullyConv, 3, 4, 2)), 406);
    assert_eq!(count(ModelConfig::new(ModelKind::ConvGru, 3, 4, 2)), 626);
}

#[test]
fn ffn_scenario() {
    let config = ModelConfig {
        num_layers: 3,
        ..ModelConfig::new(ModelKind::Ffn, 3, 8, 1)
    };
    let (_, xs) = random_input([2, 5, 3], 1);
    let ys = build(&config).forward(&xs).unwrap();
    assert_eq!(ys.dims(), vec![2, 5, 1]);
}

#[test]
fn single_width_ffn_is_identity() {
    let model = build(&ModelConfig::new(ModelKind::Ffn, 3, 8, 3));
    assert_eq!(model.parameter_count(), 0);
    let (data, xs) = random_input([2, 4, 3], 2);
    assert_eq!(model.forward(&xs).unwrap().ravel(), data);
}

#[test]
fn seeded_construction_repeats() {
    let config = ModelConfig::new(ModelKind::ConvGru, 2, 3, 1);
    let (_, xs) = random_input([1, 6, 2], 3);
    let a = build(&config).forward(&xs).unwrap().ravel();
    let b = build(&config).forward(&xs).unwrap().ravel();
    assert_eq!(a, b);
}

/// Runs `model` on two inputs that only differ at time step `changed` and returns, per step,
/// whether the outputs differ.
fn affected_steps(model: &Model<f64>, steps: usize, changed: usize) -> Vec<bool> {
    let (mut data, xs) = random_input([1, steps, 2], 4);
    data[changed * 2] += 1.0;
    let perturbed = Tensor::new(&shape([1, steps, 2]), &data).unwrap();
    let a = model.forward(&xs).unwrap().ravel();
    let b = model.forward(&perturbed).unwrap().ravel();
    a.iter().zip(&b).map(|(a, b)| a != b).collect()
}

#[test]
fn unidirectional_recurrence_is_causal() {
    for kind in [ModelKind::Lstm, ModelKind::Gru] {
        let model = build(&ModelConfig::new(kind, 2, 4, 1));
        let affected = affected_steps(&model, 10, 6);
        assert!(affected[..6].iter().all(|&a| !a));
        assert!(affected[6..].iter().all(|&a| a));
    }
}

#[test]
fn bidirectional_recurrence_sees_the_future() {
    let config = ModelConfig {
        bidirectional: true,
        ..ModelConfig::new(ModelKind::Gru, 2, 4, 1)
    };
    let affected = affected_steps(&build(&config), 10, 6);
    assert!(affected.iter().all(|&a| a));
}

#[test]
fn fully_conv_receptive_field() {
    let model = build(&ModelConfig::new(ModelKind::FullyConv, 2, 4, 1));
    let affected = affected_steps(&model, 40, 0);
    // Three kernels of width 11 reach 15 steps to either side.
    assert!(affected[16..].iter().all(|&a| !a));
    assert!(affected[0]);
}

#[test]
fn ffn_steps_are_independent() {
    let config = ModelConfig {
        num_layers: 3,
        ..ModelConfig::new(ModelKind::Ffn, 2, 4, 1)
    };
    let affected = affected_steps(&build(&config), 5, 2);
    assert_eq!(affected, [false, false, true, false, false]);
}

#[test]
fn dropout_only_applies_in_training() {
    let config = ModelConfig {
        num_layers: 2,
        dropout: 0.5,
        ..ModelConfig::new(ModelKind::Lstm, 3, 16, 1)
    };
    let model = build(&config);
    let (_, xs) = random_input([2, 8, 3], 5);
    assert_eq!(
        model.forward(&xs).unwrap().ravel(),
        model.forward(&xs).unwrap().ravel()
    );
    assert_eq!(model.forward_t(&xs, true).unwrap().dims(), vec![2, 8, 1]);
}

#[test]
fn rejects_wrong_input_width() {
    let (_, xs) = random_input([1, 12, 4], 6);
    for kind in KINDS {
        let model = build(&ModelConfig {
            num_layers: 2,
            ..ModelConfig::new(kind, 3, 4, 1)
        });
        assert!(model.forward(&xs).is_err(), "{}", model.name());
    }
}

#[test]
fn seeded_training_passes_repeat() {
    let config = ModelConfig {
        num_layers: 2,
        dropout: 0.3,
        ..ModelConfig::new(ModelKind::ConvGru, 3, 8, 1)
    };
    let (_, xs) = random_input([2, 8, 3], 7);
    let a = build(&config).forward_t(&xs, true).unwrap().ravel();
    let b = build(&config).forward_t(&xs, true).unwrap().ravel();
    assert_eq!(a, b);
}

#[test]
fn nan_dropout_is_ignored() {
    let config = ModelConfig {
        num_layers: 2,
        dropout: f64::NAN,
        ..ModelConfig::new(ModelKind::Gru, 3, 4, 1)
    };
    let model = build(&config);
    let (_, xs) = random_input([2, 6, 3], 8);
    assert_eq!(
        model.forward_t(&xs, true).unwrap().ravel(),
        model.forward(&xs).unwrap().ravel()
    );
}

#[test]
fn zero_width_ffn_is_identity() {
    let config = ModelConfig {
        num_layers: 0,
        ..ModelConfig::new(ModelKind::Ffn, 3, 8, 3)
    };
    let model = build(&config);
    assert_eq!(model.parameter_count(), 0);
    let (data, xs) = random_input([1, 4, 3], 9);
    assert_eq!(model.forward(&xs).unwrap().ravel(), data);
}
