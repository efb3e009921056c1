// tests/aggregation.rs
// Aggregation over random arrays of several shapes, against naive references

use approx::assert_relative_eq;
use ferroloss::*;
use ndarray::{Array, Array1, Array2, ArrayD, Axis, IxDyn, array};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Uniform};

fn random_array(rng: &mut StdRng, shape: &[usize]) -> ArrayD<f64> {
    let normal = Normal::new(0.0, 2.0).unwrap();
    Array::from_shape_simple_fn(IxDyn(shape), || normal.sample(&mut *rng))
}

fn random_weights(rng: &mut StdRng, n: usize) -> Vec<f64> {
    let uniform = Uniform::new(0.0, 3.0).unwrap();
    (0..n).map(|_| uniform.sample(&mut *rng)).collect()
}

#[test]
fn test_sum_and_mean_match_elementwise_on_random_shapes() {
    let mut rng = StdRng::seed_from_u64(7);
    let loss = HuberLoss::new(1.5).unwrap();

    for shape in [vec![17], vec![4, 5], vec![3, 2, 6], vec![1, 8, 1]] {
        let targets = random_array(&mut rng, &shape);
        let outputs = random_array(&mut rng, &shape);
        let values = loss.value_array(&targets, &outputs).unwrap();

        let sum = loss.value_agg(&targets, &outputs, AggMode::Sum).unwrap();
        let mean = loss.value_agg(&targets, &outputs, AggMode::Mean).unwrap();
        assert_relative_eq!(sum, values.sum(), max_relative = 1e-10);
        assert_relative_eq!(mean, values.mean().unwrap(), max_relative = 1e-10);

        let derivs = loss.deriv_array(&targets, &outputs).unwrap();
        let (v, d) = loss.value_deriv_agg(&targets, &outputs, AggMode::Sum).unwrap();
        assert_relative_eq!(v, sum, max_relative = 1e-10);
        assert_relative_eq!(d, derivs.sum(), max_relative = 1e-10, epsilon = 1e-10);
    }
}

#[test]
fn test_broadcast_matches_explicit_repetition() {
    let targets = array![[1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]];
    let row = array![0.3, -2.0, 1.7];
    let repeated = array![[0.3, -2.0, 1.7], [0.3, -2.0, 1.7]];

    let broadcast = LogitMarginLoss.value_array(&targets, &row).unwrap();
    let explicit = LogitMarginLoss.value_array(&targets, &repeated).unwrap();
    assert_eq!(broadcast.shape(), &[2, 3]);
    assert_eq!(broadcast, explicit);

    let swapped = LogitMarginLoss.deriv_array(&row, &targets);
    assert!(swapped.is_ok());
    assert_relative_eq!(
        LogitMarginLoss.value_agg(&targets, &row, AggMode::Sum).unwrap(),
        LogitMarginLoss.value_agg(&targets, &repeated, AggMode::Sum).unwrap(),
        max_relative = 1e-12
    );
}

#[test]
fn test_weighted_aggregation_matches_naive_reference() {
    let mut rng = StdRng::seed_from_u64(11);
    let loss = L2DistLoss;
    let targets = random_array(&mut rng, &[6, 4]).into_dimensionality::<ndarray::Ix2>().unwrap();
    let outputs = random_array(&mut rng, &[6, 4]).into_dimensionality::<ndarray::Ix2>().unwrap();
    let weights = random_weights(&mut rng, 6);
    let values: Array2<f64> = loss.value_array(&targets, &outputs).unwrap().into_dimensionality().unwrap();

    let row_sums = values.sum_axis(Axis(1));
    let row_means = values.mean_axis(Axis(1)).unwrap();
    let w = Array1::from(weights.clone());
    let total_weight = w.sum();

    let sum = loss
        .value_agg_obs(&targets, &outputs, AggMode::weighted_sum(&weights), ObsAxis::First)
        .unwrap();
    assert_relative_eq!(sum, (&row_sums * &w).sum(), max_relative = 1e-10);

    let normalized = AggMode::WeightedSum {
        weights: &weights,
        normalize: true,
    };
    let sum = loss.value_agg_obs(&targets, &outputs, normalized, ObsAxis::First).unwrap();
    assert_relative_eq!(sum, (&row_sums * &w).sum() / total_weight, max_relative = 1e-10);

    let mean = loss
        .value_agg_obs(&targets, &outputs, AggMode::weighted_mean(&weights), ObsAxis::First)
        .unwrap();
    assert_relative_eq!(mean, (&row_means * &w).sum() / total_weight, max_relative = 1e-10);

    let raw = AggMode::WeightedMean {
        weights: &weights,
        normalize: false,
    };
    let mean = loss.value_agg_obs(&targets, &outputs, raw, ObsAxis::First).unwrap();
    assert_relative_eq!(mean, (&row_means * &w).sum() / 6.0, max_relative = 1e-10);

    let per_obs = loss
        .value_per_obs(&targets, &outputs, AggMode::weighted_mean(&weights), ObsAxis::First)
        .unwrap();
    assert_relative_eq!(per_obs.sum(), mean * 6.0 / total_weight, max_relative = 1e-10);
}

#[test]
fn test_observation_axis_in_the_middle() {
    let mut rng = StdRng::seed_from_u64(3);
    let targets = random_array(&mut rng, &[2, 3, 4]);
    let outputs = random_array(&mut rng, &[2, 3, 4]);
    let loss = L1DistLoss;

    let per_obs = loss
        .value_per_obs(&targets, &outputs, AggMode::Sum, ObsAxis::Index(1))
        .unwrap();
    let values = loss.value_array(&targets, &outputs).unwrap();
    let expected = values.sum_axis(Axis(2)).sum_axis(Axis(0));
    assert_eq!(per_obs.len(), 3);
    for (a, b) in per_obs.iter().zip(expected.iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-10);
    }
}

#[test]
fn test_weight_length_mismatch_is_an_error() {
    let targets = array![1.0, 2.0, 3.0];
    let outputs = array![1.5, 2.5, 2.0];
    let short = [1.0, 1.0];

    let err = L2DistLoss
        .value_agg(&targets, &outputs, AggMode::weighted_sum(&short))
        .unwrap_err();
    assert_eq!(err, LossError::WeightLength { expected: 3, found: 2 });

    let grid = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
    let err = L2DistLoss
        .deriv_agg_obs(&grid, &grid, AggMode::weighted_mean(&short), ObsAxis::First)
        .unwrap_err();
    assert_eq!(err, LossError::WeightLength { expected: 3, found: 2 });
}

#[test]
fn test_single_precision_arrays_stay_single_precision() {
    let targets = Array1::<f32>::from(vec![1.0, -1.0, 1.0]);
    let outputs = Array1::<f32>::from(vec![0.2, 0.4, -3.0]);
    let values: ArrayD<f32> = L2HingeLoss.value_array(&targets, &outputs).unwrap();
    assert_relative_eq!(values[[0]], 0.64f32, max_relative = 1e-6);
    let total: f32 = L2HingeLoss.value_agg(&targets, &outputs, AggMode::Mean).unwrap();
    assert_relative_eq!(total, (0.64 + 1.96 + 16.0) / 3.0, max_relative = 1e-6);
}
