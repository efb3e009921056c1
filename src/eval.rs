// src/eval.rs
// Public evaluation surface: mixed-precision scalar functions, closures and
// the array/aggregate methods every loss gets through `LossExt`.

use crate::backend::{LossFloat, Promote};
use crate::error::LossResult;
use crate::losses::{Scaled, SupervisedLoss, Weighted};
use crate::ops::elementwise::{evaluate, evaluate_into, evaluate_pair_into};
use crate::ops::reduction::{aggregate, aggregate_per_obs, aggregate_per_obs_into};
use crate::ops::{AggMode, BroadcastPlan, Deriv, Deriv2, ObsAxis, Value, ValueDeriv};
use ndarray::{Array, Array1, ArrayBase, ArrayD, Data, DataMut, Dimension, Ix1, IxDyn};
use num_traits::Zero;

// ============= SCALAR =============

/// Loss value of one observation, evaluated in the promoted precision of
/// `target` and `output`.
#[inline]
pub fn value<L, Y, O>(loss: &L, target: Y, output: O) -> Y::Output
where
    L: SupervisedLoss,
    Y: Promote<O>,
{
    let (y, o) = target.promote(output);
    loss.value(y, o)
}

#[inline]
pub fn deriv<L, Y, O>(loss: &L, target: Y, output: O) -> Y::Output
where
    L: SupervisedLoss,
    Y: Promote<O>,
{
    let (y, o) = target.promote(output);
    loss.deriv(y, o)
}

#[inline]
pub fn deriv2<L, Y, O>(loss: &L, target: Y, output: O) -> Y::Output
where
    L: SupervisedLoss,
    Y: Promote<O>,
{
    let (y, o) = target.promote(output);
    loss.deriv2(y, o)
}

#[inline]
pub fn value_deriv<L, Y, O>(loss: &L, target: Y, output: O) -> (Y::Output, Y::Output)
where
    L: SupervisedLoss,
    Y: Promote<O>,
{
    let (y, o) = target.promote(output);
    loss.value_deriv(y, o)
}

// ============= CLOSURES =============

/// `loss` captured as a plain `(target, output) -> value` function
pub fn value_fn<L: SupervisedLoss, T: LossFloat>(loss: L) -> impl Fn(T, T) -> T {
    move |target, output| loss.value(target, output)
}

pub fn deriv_fn<L: SupervisedLoss, T: LossFloat>(loss: L) -> impl Fn(T, T) -> T {
    move |target, output| loss.deriv(target, output)
}

pub fn deriv2_fn<L: SupervisedLoss, T: LossFloat>(loss: L) -> impl Fn(T, T) -> T {
    move |target, output| loss.deriv2(target, output)
}

pub fn value_deriv_fn<L: SupervisedLoss, T: LossFloat>(loss: L) -> impl Fn(T, T) -> (T, T) {
    move |target, output| loss.value_deriv(target, output)
}

/// Converts a `(targets, outputs)` pair of arrays with different element
/// types into the promoted float type, ready for [`LossExt`].
pub fn promote_arrays<Y, O, S1, S2, D1, D2>(
    targets: &ArrayBase<S1, D1>,
    outputs: &ArrayBase<S2, D2>,
) -> (Array<<Y as Promote<O>>::Output, D1>, Array<<Y as Promote<O>>::Output, D2>)
where
    Y: Promote<O> + Zero,
    O: Copy + Zero,
    S1: Data<Elem = Y>,
    S2: Data<Elem = O>,
    D1: Dimension,
    D2: Dimension,
{
    let targets = targets.mapv(|y| y.promote(O::zero()).0);
    let outputs = outputs.mapv(|o| Y::zero().promote(o).1);
    (targets, outputs)
}

// ============= ARRAYS =============

// Generates the element-wise, aggregated and per-observation methods of one
// kernel so the four quantities expose the same surface.
macro_rules! kernel_methods {
    (
        $kernel:expr,
        $array:ident,
        $array_into:ident,
        $agg:ident,
        $agg_obs:ident,
        $per_obs:ident,
        $per_obs_into:ident
    ) => {
        /// Element-wise result over the broadcast shape of both inputs
        fn $array<T, S1, S2, D1, D2>(
            &self,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
        ) -> LossResult<ArrayD<T>>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
        {
            evaluate($kernel, self, targets.view().into_dyn(), outputs.view().into_dyn())
        }

        /// Element-wise result written into `buffer`, which must have the
        /// broadcast shape
        fn $array_into<T, S1, S2, D1, D2, S, D3>(
            &self,
            buffer: &mut ArrayBase<S, D3>,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
        ) -> LossResult<()>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
            S: DataMut<Elem = T>,
            D3: Dimension,
        {
            evaluate_into(
                $kernel,
                self,
                targets.view().into_dyn(),
                outputs.view().into_dyn(),
                buffer.view_mut().into_dyn(),
            )
        }

        /// Whole-array aggregate without an observation axis
        fn $agg<T, S1, S2, D1, D2>(
            &self,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
            mode: AggMode<'_, T>,
        ) -> LossResult<T>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
        {
            aggregate(
                $kernel,
                self,
                targets.view().into_dyn(),
                outputs.view().into_dyn(),
                mode,
                None,
            )
        }

        /// Whole-array aggregate with observations along `axis`
        fn $agg_obs<T, S1, S2, D1, D2>(
            &self,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
            mode: AggMode<'_, T>,
            axis: ObsAxis,
        ) -> LossResult<T>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
        {
            aggregate(
                $kernel,
                self,
                targets.view().into_dyn(),
                outputs.view().into_dyn(),
                mode,
                Some(axis),
            )
        }

        /// One aggregate per observation along `axis`
        fn $per_obs<T, S1, S2, D1, D2>(
            &self,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
            mode: AggMode<'_, T>,
            axis: ObsAxis,
        ) -> LossResult<Array1<T>>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
        {
            aggregate_per_obs(
                $kernel,
                self,
                targets.view().into_dyn(),
                outputs.view().into_dyn(),
                mode,
                axis,
            )
        }

        /// Per-observation aggregates written into `buffer`, one entry per
        /// observation
        fn $per_obs_into<T, S1, S2, D1, D2, S>(
            &self,
            buffer: &mut ArrayBase<S, Ix1>,
            targets: &ArrayBase<S1, D1>,
            outputs: &ArrayBase<S2, D2>,
            mode: AggMode<'_, T>,
            axis: ObsAxis,
        ) -> LossResult<()>
        where
            T: LossFloat,
            S1: Data<Elem = T>,
            S2: Data<Elem = T>,
            D1: Dimension,
            D2: Dimension,
            S: DataMut<Elem = T>,
        {
            aggregate_per_obs_into(
                $kernel,
                self,
                targets.view().into_dyn(),
                outputs.view().into_dyn(),
                mode,
                axis,
                buffer.view_mut(),
            )
        }
    };
}

/// Array evaluation and aggregation for every [`SupervisedLoss`].
///
/// Inputs are any ndarray arrays or views of the same element type and are
/// broadcast against each other. Buffer forms take the buffer first
/// and never resize it.
///
/// Mixed element types are not promoted here; convert them first with
/// [`promote_arrays`], which follows the same rules as the scalar functions.
pub trait LossExt: SupervisedLoss + Sized {
    kernel_methods!(
        Value,
        value_array,
        value_array_into,
        value_agg,
        value_agg_obs,
        value_per_obs,
        value_per_obs_into
    );

    kernel_methods!(
        Deriv,
        deriv_array,
        deriv_array_into,
        deriv_agg,
        deriv_agg_obs,
        deriv_per_obs,
        deriv_per_obs_into
    );

    kernel_methods!(
        Deriv2,
        deriv2_array,
        deriv2_array_into,
        deriv2_agg,
        deriv2_agg_obs,
        deriv2_per_obs,
        deriv2_per_obs_into
    );

    /// Element-wise values and first derivatives
    fn value_deriv_array<T, S1, S2, D1, D2>(
        &self,
        targets: &ArrayBase<S1, D1>,
        outputs: &ArrayBase<S2, D2>,
    ) -> LossResult<(ArrayD<T>, ArrayD<T>)>
    where
        T: LossFloat,
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
        D1: Dimension,
        D2: Dimension,
    {
        let (targets, outputs) = (targets.view().into_dyn(), outputs.view().into_dyn());
        let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
        let mut values = ArrayD::zeros(IxDyn(plan.shape()));
        let mut derivs = ArrayD::zeros(IxDyn(plan.shape()));
        evaluate_pair_into(self, targets, outputs, values.view_mut(), derivs.view_mut())?;
        Ok((values, derivs))
    }

    /// Values and first derivatives written into two buffers of the
    /// broadcast shape
    fn value_deriv_array_into<T, S1, S2, D1, D2, B1, B2, D3, D4>(
        &self,
        values: &mut ArrayBase<B1, D3>,
        derivs: &mut ArrayBase<B2, D4>,
        targets: &ArrayBase<S1, D1>,
        outputs: &ArrayBase<S2, D2>,
    ) -> LossResult<()>
    where
        T: LossFloat,
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
        D1: Dimension,
        D2: Dimension,
        B1: DataMut<Elem = T>,
        B2: DataMut<Elem = T>,
        D3: Dimension,
        D4: Dimension,
    {
        evaluate_pair_into(
            self,
            targets.view().into_dyn(),
            outputs.view().into_dyn(),
            values.view_mut().into_dyn(),
            derivs.view_mut().into_dyn(),
        )
    }

    /// Aggregated `(value, deriv)` pair, computed in one pass
    fn value_deriv_agg<T, S1, S2, D1, D2>(
        &self,
        targets: &ArrayBase<S1, D1>,
        outputs: &ArrayBase<S2, D2>,
        mode: AggMode<'_, T>,
    ) -> LossResult<(T, T)>
    where
        T: LossFloat,
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
        D1: Dimension,
        D2: Dimension,
    {
        aggregate(
            ValueDeriv,
            self,
            targets.view().into_dyn(),
            outputs.view().into_dyn(),
            mode,
            None,
        )
    }

    fn value_deriv_agg_obs<T, S1, S2, D1, D2>(
        &self,
        targets: &ArrayBase<S1, D1>,
        outputs: &ArrayBase<S2, D2>,
        mode: AggMode<'_, T>,
        axis: ObsAxis,
    ) -> LossResult<(T, T)>
    where
        T: LossFloat,
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
        D1: Dimension,
        D2: Dimension,
    {
        aggregate(
            ValueDeriv,
            self,
            targets.view().into_dyn(),
            outputs.view().into_dyn(),
            mode,
            Some(axis),
        )
    }

    /// This loss multiplied by `k > 0`
    fn scaled(self, k: f64) -> LossResult<Scaled<Self>> {
        Scaled::new(self, k)
    }

    /// This margin-based loss with the positive class weighted by `w`
    fn weighted(self, w: f64) -> LossResult<Weighted<Self>> {
        Weighted::new(self, w)
    }
}

impl<L: SupervisedLoss> LossExt for L {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LossError;
    use crate::losses::{HingeLoss, L1DistLoss, L2DistLoss, LPDistLoss};
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array, aview1};

    #[test]
    fn test_scalar_functions_promote_inputs() {
        let v: f32 = value(&L2DistLoss, 1.0f32, 3.0f32);
        assert_eq!(v, 4.0);
        let v: f64 = value(&L2DistLoss, 1.0f32, 3.0f64);
        assert_eq!(v, 4.0);
        let d: f32 = deriv(&L2DistLoss, 1i32, 0.5f32);
        assert_eq!(d, -1.0);
        let d2: f64 = deriv2(&L2DistLoss, 1i64, 4i64);
        assert_eq!(d2, 2.0);
        assert_eq!(value_deriv(&L2DistLoss, 1i32, 3.0f64), (4.0, 4.0));
    }

    #[test]
    fn test_mixed_arrays_are_promoted_before_evaluation() {
        let targets = array![1.0f32, 0.0, -2.0];
        let outputs = array![0.5f64, 2.0, -1.0];
        let (y, o) = promote_arrays(&targets, &outputs);
        let values = L2DistLoss.value_array(&y, &o).unwrap();
        for (i, v) in values.iter().enumerate() {
            let expected: f64 = value(&L2DistLoss, targets[i], outputs[i]);
            assert_eq!(*v, expected);
        }
        assert_eq!(L2DistLoss.value_agg(&y, &o, AggMode::Sum).unwrap(), 5.25);

        let labels = array![[1i32, -1], [-1, 1]];
        let scores = array![0.5f32, -2.0];
        let (y, o) = promote_arrays(&labels, &scores);
        let values: ArrayD<f32> = HingeLoss::default().value_array(&y, &o).unwrap();
        assert_eq!(values.shape(), &[2, 2]);
        assert_eq!(values[[0, 0]], 0.5);
        assert_eq!(values[[1, 1]], 3.0);
    }

    #[test]
    fn test_parameters_do_not_widen_single_precision() {
        let loss = LPDistLoss::new(3.0).unwrap();
        let v: f32 = value(&loss, 0.0f32, 2.0f32);
        assert_relative_eq!(v, 8.0f32, max_relative = 1e-6);
    }

    #[test]
    fn test_closures_capture_the_loss() {
        let f = value_fn(HingeLoss::default());
        let g = deriv_fn(HingeLoss::default());
        let h = deriv2_fn(L2DistLoss);
        let fg = value_deriv_fn(L2DistLoss);
        assert_eq!(f(1.0, 0.5), 0.5);
        assert_eq!(g(1.0, 0.5), -1.0);
        assert_eq!(h(0.0f32, 10.0f32), 2.0f32);
        assert_eq!(fg(1.0, 3.0), (4.0, 4.0));
    }

    #[test]
    fn test_array_methods() {
        let targets = array![1.0, 0.0, -2.0];
        let outputs = array![0.5, 2.0, -1.0];

        let values = L2DistLoss.value_array(&targets, &outputs).unwrap();
        assert_eq!(values, array![0.25, 4.0, 1.0].into_dyn());
        let derivs = L2DistLoss.deriv_array(&targets, &outputs).unwrap();
        assert_eq!(derivs[0], -1.0);
        let second = L2DistLoss.deriv2_array(&targets, &outputs).unwrap();
        assert!(second.iter().all(|&x| x == 2.0));

        let (v, d) = L2DistLoss.value_deriv_array(&targets, &outputs).unwrap();
        assert_eq!(v, values);
        assert_eq!(d, derivs);
    }

    #[test]
    fn test_array_methods_accept_views() {
        let targets = [1.0, 2.0, 3.0];
        let outputs = [2.0, 5.0, -2.0];
        let total = L1DistLoss
            .value_agg(&aview1(&targets), &aview1(&outputs), AggMode::Sum)
            .unwrap();
        assert_eq!(total, 9.0);
    }

    #[test]
    fn test_buffer_methods() {
        let targets = array![[0.0, 1.0], [2.0, 3.0]];
        let outputs = array![1.0, 1.0];

        let mut buffer = Array2::zeros((2, 2));
        L1DistLoss
            .value_array_into(&mut buffer, &targets, &outputs)
            .unwrap();
        assert_eq!(buffer, array![[1.0, 0.0], [1.0, 2.0]]);

        let mut derivs = Array2::zeros((2, 2));
        L1DistLoss
            .deriv_array_into(&mut derivs, &targets, &outputs)
            .unwrap();
        assert_eq!(derivs, array![[1.0, 0.0], [-1.0, -1.0]]);

        let mut values = Array2::zeros((2, 2));
        L1DistLoss
            .value_deriv_array_into(&mut values, &mut derivs, &targets, &outputs)
            .unwrap();
        assert_eq!(values, buffer);

        let mut wrong = Array2::zeros((2, 3));
        let err = L1DistLoss.value_array_into(&mut wrong, &targets, &outputs);
        assert!(matches!(err, Err(LossError::BufferShape { .. })));
    }

    #[test]
    fn test_per_observation_methods() {
        let targets = array![[0.125, 0.375, 0.625, 0.875], [0.25, 0.5, 0.75, 1.0]];
        let outputs = array![[0.125, 0.625, 1.125, 1.625], [0.375, 0.875, 1.375, 1.875]];

        let rows = L1DistLoss
            .value_per_obs(&targets, &outputs, AggMode::Sum, ObsAxis::First)
            .unwrap();
        assert_eq!(rows, array![1.5, 2.0]);

        let mut columns = Array1::zeros(4);
        L1DistLoss
            .value_per_obs_into(&mut columns, &targets, &outputs, AggMode::Sum, ObsAxis::Last)
            .unwrap();
        assert_eq!(columns, array![0.125, 0.625, 1.125, 1.625]);

        let derivs = L2DistLoss
            .deriv_per_obs(&targets, &outputs, AggMode::Sum, ObsAxis::First)
            .unwrap();
        assert_eq!(derivs, array![3.0, 4.0]);

        let curvature = L2DistLoss
            .deriv2_per_obs(&targets, &outputs, AggMode::Mean, ObsAxis::Last)
            .unwrap();
        assert_eq!(curvature, array![2.0, 2.0, 2.0, 2.0]);

        let w = [2.0, 1.0];
        let mean = L1DistLoss
            .value_agg_obs(&targets, &outputs, AggMode::weighted_mean(&w), ObsAxis::First)
            .unwrap();
        assert_relative_eq!(mean, 5.0 / 12.0, max_relative = 1e-12);

        let (v, d) = L2DistLoss
            .value_deriv_agg_obs(&targets, &outputs, AggMode::weighted_sum(&w), ObsAxis::First)
            .unwrap();
        assert_relative_eq!(d, 10.0, max_relative = 1e-12);
        assert!(v > 0.0);
    }

    #[test]
    fn test_decorator_methods() {
        let loss = L2DistLoss.scaled(0.5).unwrap();
        assert_eq!(loss.value(1.0, 3.0), 2.0);
        let agg = loss
            .value_deriv_agg(&array![1.0, 1.0], &array![3.0, 1.0], AggMode::Sum)
            .unwrap();
        assert_eq!(agg, (2.0, 2.0));

        let hinge = HingeLoss::default().weighted(0.25).unwrap();
        assert_eq!(hinge.value(-1.0, 1.0), 1.5);
        assert!(L2DistLoss.weighted(0.5).is_err());
    }
}
