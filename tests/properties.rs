// tests/properties.rs
// Property-based checks of the loss laws and of the aggregation engine

use ferroloss::*;
use ndarray::Array1;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn catalog() -> Vec<Loss> {
    Loss::catalog().unwrap()
}

fn label() -> impl Strategy<Value = f64> {
    prop_oneof![Just(-1.0), Just(1.0)]
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn prop_losses_are_non_negative(target in label(), output in -50.0f64..50.0) {
        for loss in catalog() {
            let v: f64 = loss.value(target, output);
            prop_assert!(v >= 0.0, "{} gave {}", loss.name(), v);
        }
    }

    #[test]
    fn prop_distance_losses_vanish_on_target(y in -100.0f64..100.0) {
        for loss in catalog().into_iter().filter(|l| l.is_distance_based()) {
            let v: f64 = loss.value(y, y);
            prop_assert!(v.abs() < 1e-9, "{} gave {}", loss.name(), v);
        }
    }

    #[test]
    fn prop_value_deriv_matches_separate_calls(target in label(), output in -10.0f64..10.0) {
        for loss in catalog() {
            let (v, d) = loss.value_deriv(target, output);
            let (v2, d2): (f64, f64) = (loss.value(target, output), loss.deriv(target, output));
            prop_assert!((v - v2).abs() <= 1e-12 * (1.0 + v2.abs()));
            prop_assert!((d - d2).abs() <= 1e-12 * (1.0 + d2.abs()));
        }
    }

    #[test]
    fn prop_scaled_values_scale(k in 0.01f64..100.0, target in label(), output in -5.0f64..5.0) {
        for loss in catalog() {
            let scaled = loss.scaled(k).unwrap();
            let expected: f64 = k * loss.value(target, output);
            prop_assert!((scaled.value(target, output) - expected).abs() <= 1e-12 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn prop_sum_and_mean_agree(values in prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), 1..64)) {
        let (targets, outputs): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let (targets, outputs) = (Array1::from(targets), Array1::from(outputs));
        let n = targets.len() as f64;

        for loss in catalog() {
            let elementwise = loss.value_array(&targets, &outputs).unwrap();
            let sum = loss.value_agg(&targets, &outputs, AggMode::Sum).unwrap();
            let mean = loss.value_agg(&targets, &outputs, AggMode::Mean).unwrap();
            let tol = 1e-9 * (1.0 + sum.abs());
            prop_assert!((elementwise.sum() - sum).abs() <= tol);
            prop_assert!((mean * n - sum).abs() <= tol);
        }
    }

    #[test]
    fn prop_unit_weights_match_unweighted(values in prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), 1..64)) {
        let (targets, outputs): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let (targets, outputs) = (Array1::from(targets), Array1::from(outputs));
        let ones = vec![1.0; targets.len()];
        let threes = vec![3.0; targets.len()];

        for loss in catalog() {
            let sum = loss.deriv_agg(&targets, &outputs, AggMode::Sum).unwrap();
            let weighted = loss.deriv_agg(&targets, &outputs, AggMode::weighted_sum(&ones)).unwrap();
            prop_assert!((sum - weighted).abs() <= 1e-9 * (1.0 + sum.abs()));

            let mean = loss.value_agg(&targets, &outputs, AggMode::Mean).unwrap();
            let weighted = loss.value_agg(&targets, &outputs, AggMode::weighted_mean(&threes)).unwrap();
            prop_assert!((mean - weighted).abs() <= 1e-9 * (1.0 + mean.abs()));
        }
    }
}
