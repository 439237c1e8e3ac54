use rand::{Rng, SeedableRng, rngs::StdRng};
use synaption::{ActFn, MlErr, Network, Role, State, Tensor, Trainer, TrainingConfig};

fn network(seed: u64) -> Network {
    let mut net = Network::with_seed(3, seed).unwrap();
    net.add_layer(3, ActFn::Relu, Role::Hidden)
        .unwrap()
        .add_layer(3, ActFn::Relu, Role::Hidden)
        .unwrap()
        .add_layer(2, ActFn::Sigmoid, Role::Output)
        .unwrap();
    net
}

fn samples(n: usize, seed: u64) -> Vec<Tensor> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let x: Vec<f64> = (0..3).map(|_| rng.random_range(-1.0..1.0)).collect();
            let y = vec![(x[0] + 1.) / 2., (1. - x[1]) / 2.];
            Tensor::new(x, y)
        })
        .collect()
}

#[test]
fn training_lowers_the_error() {
    let samples = samples(20, 0);

    for seed in 0..5 {
        let mut net = network(seed);
        let before = net.evaluate(&samples).unwrap();

        let losses = net.train(&samples, &TrainingConfig::new(200, 0.1)).unwrap();
        let after = net.evaluate(&samples).unwrap();

        assert_eq!(losses.len(), 200);
        assert!(after < before, "seed {seed}: {after} >= {before}");
    }
}

#[test]
fn saved_networks_predict_the_same() {
    let samples = samples(20, 1);
    let mut net = network(2);
    net.train(&samples, &TrainingConfig::new(5, 0.1)).unwrap();

    let mut loaded = Network::load(&net.save()).unwrap();
    for sample in &samples {
        let expected = net.activate(sample).unwrap();
        let got = loaded.activate(sample).unwrap();

        for (a, b) in expected.iter().zip(&got) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}

#[test]
fn topology_freezes_on_first_use() {
    let samples = samples(2, 2);

    let mut activated = network(3);
    activated.activate(&samples[0]).unwrap();

    let mut trained = network(3);
    Trainer::new(TrainingConfig::new(1, 0.1))
        .unwrap()
        .train(&mut trained, &samples)
        .unwrap();

    for net in [&mut activated, &mut trained] {
        assert_eq!(net.state(), State::Frozen);
        let err = net.add_layer(2, ActFn::Identity, Role::Output).unwrap_err();
        assert!(matches!(err, MlErr::Config(_)));
        assert_eq!(net.layers().len(), 3);
    }
}

#[test]
fn wrong_input_width_is_rejected() {
    let mut net = network(4);
    let sample = Tensor::new(vec![1., 2., 3., 4.], vec![0., 1.]);

    let err = net.activate(&sample).unwrap_err();
    assert!(matches!(
        err,
        MlErr::ShapeMismatch {
            got: 4,
            expected: 3,
            ..
        }
    ));
}

#[test]
fn same_seed_same_network() {
    let samples = samples(20, 3);
    let config = TrainingConfig::new(20, 0.1).with_shuffle(9);

    let mut a = network(5);
    let mut b = network(5);
    assert_eq!(a.layers(), b.layers());

    let losses_a = a.train(&samples, &config).unwrap();
    let losses_b = b.train(&samples, &config).unwrap();
    assert_eq!(losses_a, losses_b);
    assert_eq!(a.layers(), b.layers());
}

#[test]
fn a_single_step_lowers_the_sample_error() {
    let mut net = Network::with_seed(3, 6).unwrap();
    net.add_layer(2, ActFn::Sigmoid, Role::Output).unwrap();
    let sample = Tensor::new(vec![0.5, 0.1, -0.4], vec![1., 0.]);

    let before = net.backpropagate(&sample, 0.01).unwrap();
    let after = net.evaluate(std::slice::from_ref(&sample)).unwrap();
    assert!(after < before, "{after} >= {before}");
}

#[test]
fn traces_expire_after_an_update() {
    let mut net = network(7);
    let sample = &samples(1, 4)[0];

    let old = net.forward(sample.inputs()).unwrap();
    net.backpropagate(sample, 0.1).unwrap();

    let err = net.backward(old, sample.labels(), 0.1).unwrap_err();
    assert!(matches!(err, MlErr::State(_)));
}

#[test]
fn corrupt_snapshots_are_rejected() {
    let bytes = network(8).save();

    let err = Network::load(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, MlErr::CorruptFormat(_)));
}
