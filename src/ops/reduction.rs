// src/ops/reduction.rs
// Single-pass aggregation of pointwise loss quantities.
// Nothing here allocates an intermediate array: every reduction folds the
// kernel results straight out of the broadcast views.

use super::{BroadcastPlan, Kernel, ObsAxis};
use crate::backend::{Accumulate, LossFloat};
use crate::error::{LossError, LossResult};
use crate::losses::SupervisedLoss;
use ndarray::{Array1, ArrayViewD, ArrayViewMut1, Axis, Zip};
use tracing::{debug, trace};

/// How the per-element results of a call are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggMode<'a, T> {
    /// No reduction, the element-wise form
    None,
    Sum,
    Mean,
    /// Sum of per-observation results times their weight.
    /// With `normalize` the total is divided by the sum of the weights.
    WeightedSum { weights: &'a [T], normalize: bool },
    /// Weighted combination of per-observation means.
    /// Divided by the sum of the weights when `normalize` is set, by the
    /// number of observations otherwise.
    WeightedMean { weights: &'a [T], normalize: bool },
}

impl<'a, T> AggMode<'a, T> {
    /// Unnormalized weighted sum
    pub fn weighted_sum(weights: &'a [T]) -> Self {
        AggMode::WeightedSum {
            weights,
            normalize: false,
        }
    }

    /// Weighted mean normalized by the total weight
    pub fn weighted_mean(weights: &'a [T]) -> Self {
        AggMode::WeightedMean {
            weights,
            normalize: true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggMode::None => "None",
            AggMode::Sum => "Sum",
            AggMode::Mean => "Mean",
            AggMode::WeightedSum { .. } => "WeightedSum",
            AggMode::WeightedMean { .. } => "WeightedMean",
        }
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self, AggMode::WeightedSum { .. } | AggMode::WeightedMean { .. })
    }
}

// Weighted modes reduced to the three facts the engine needs
#[derive(Clone, Copy)]
struct Weighting<'a, T> {
    weights: &'a [T],
    inner_mean: bool,
    normalize: bool,
}

impl<'a, T: LossFloat> Weighting<'a, T> {
    fn from_mode(mode: AggMode<'a, T>) -> Option<Self> {
        match mode {
            AggMode::WeightedSum { weights, normalize } => Some(Self {
                weights,
                inner_mean: false,
                normalize,
            }),
            AggMode::WeightedMean { weights, normalize } => Some(Self {
                weights,
                inner_mean: true,
                normalize,
            }),
            _ => None,
        }
    }

    /// Validates the weights and returns the divisor of the weighted total.
    fn denominator(&self, n_obs: usize) -> LossResult<T> {
        if self.weights.len() != n_obs {
            debug!(expected = n_obs, found = self.weights.len(), "weight length mismatch");
            return Err(LossError::WeightLength {
                expected: n_obs,
                found: self.weights.len(),
            });
        }
        if let Some((index, &w)) = self
            .weights
            .iter()
            .enumerate()
            .find(|&(_, &w)| !(w >= T::zero()))
        {
            debug!(index, "rejected weight");
            return Err(LossError::InvalidWeights {
                index,
                value: w.to_param(),
            });
        }

        Ok(if self.normalize {
            self.weights.iter().copied().sum()
        } else if self.inner_mean {
            T::from_param(n_obs as f64)
        } else {
            T::one()
        })
    }
}

fn unsupported(mode: &'static str, operation: &'static str) -> LossError {
    debug!(mode, operation, "unsupported aggregate mode");
    LossError::UnsupportedMode { mode, operation }
}

#[inline]
fn fold<T, L, K>(kernel: K, loss: &L, y: &ArrayViewD<'_, T>, o: &ArrayViewD<'_, T>) -> K::Out
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T>,
{
    Zip::from(y).and(o).fold(<K::Out as Accumulate>::identity(), |acc, &y, &o| {
        acc.combine(kernel.eval(loss, y, o))
    })
}

/// Reduces the kernel results over the whole broadcast array to one value.
///
/// `axis` names the observation dimension. Weighted modes need it when the
/// broadcast rank is 2 or more; for vectors the weights apply per element
/// and the axis, if given, only has to be valid. All checks run before the
/// first element is evaluated.
pub fn aggregate<T, L, K>(
    kernel: K,
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
    mode: AggMode<'_, T>,
    axis: Option<ObsAxis>,
) -> LossResult<K::Out>
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T>,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    let axis = axis.map(|a| plan.obs_axis(a)).transpose()?;
    let y = plan.broadcast(&targets)?;
    let o = plan.broadcast(&outputs)?;
    trace!(
        kernel = kernel.name(),
        loss = loss.name(),
        mode = mode.name(),
        "aggregate"
    );

    match mode {
        AggMode::None => Err(unsupported("None", "aggregate")),
        AggMode::Sum => Ok(fold(kernel, loss, &y, &o)),
        AggMode::Mean => {
            let n = T::from_param(plan.len() as f64);
            Ok(fold(kernel, loss, &y, &o).scale(T::one() / n))
        }
        AggMode::WeightedSum { .. } | AggMode::WeightedMean { .. } => {
            let Some(weighting) = Weighting::from_mode(mode) else {
                return Err(unsupported(mode.name(), "aggregate"));
            };

            if plan.ndim() <= 1 {
                // One weight per element
                let denom = weighting.denominator(plan.len())?;
                let total = y.iter().zip(o.iter()).zip(weighting.weights).fold(
                    <K::Out as Accumulate>::identity(),
                    |acc, ((&y, &o), &w)| acc.combine(kernel.eval(loss, y, o).scale(w)),
                );
                return Ok(total.scale(T::one() / denom));
            }

            let Some(axis) = axis else {
                debug!(ndim = plan.ndim(), "weighted aggregation without observation axis");
                return Err(LossError::AxisRequired { ndim: plan.ndim() });
            };
            let n_obs = plan.shape()[axis];
            let denom = weighting.denominator(n_obs)?;
            let inner_scale = inner_scale::<T>(&plan, axis, weighting.inner_mean);

            let mut total = <K::Out as Accumulate>::identity();
            for (i, &w) in weighting.weights.iter().enumerate() {
                let inner = fold(
                    kernel,
                    loss,
                    &y.index_axis(Axis(axis), i),
                    &o.index_axis(Axis(axis), i),
                );
                total = total.combine(inner.scale(inner_scale * w));
            }
            Ok(total.scale(T::one() / denom))
        }
    }
}

/// One aggregate per observation along `axis`, written into `buffer`.
///
/// For `Sum` and `Mean` entry `i` is the sum or mean of observation `i`.
/// For the weighted modes it is observation `i`'s share of the weighted
/// total, so the entries add up to what [`aggregate`] returns.
pub fn aggregate_per_obs_into<T, L, K>(
    kernel: K,
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
    mode: AggMode<'_, T>,
    axis: ObsAxis,
    mut buffer: ArrayViewMut1<'_, T>,
) -> LossResult<()>
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T, Out = T>,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    if plan.ndim() < 2 {
        debug!(rank = plan.ndim(), "per-observation reduction of a vector");
        return Err(LossError::RankTooLow {
            rank: plan.ndim(),
            required: 2,
        });
    }
    let axis = plan.obs_axis(axis)?;
    let n_obs = plan.shape()[axis];
    if buffer.len() != n_obs {
        debug!(expected = n_obs, found = buffer.len(), "rejected output buffer");
        return Err(LossError::BufferShape {
            expected: vec![n_obs],
            found: buffer.shape().to_vec(),
        });
    }

    // Per observation: entry = fold * scale * weight
    let (inner_mean, weights, denom) = match mode {
        AggMode::None => return Err(unsupported("None", "per-observation aggregate")),
        AggMode::Sum => (false, None, T::one()),
        AggMode::Mean => (true, None, T::one()),
        AggMode::WeightedSum { .. } | AggMode::WeightedMean { .. } => {
            let Some(weighting) = Weighting::from_mode(mode) else {
                return Err(unsupported(mode.name(), "per-observation aggregate"));
            };
            let denom = weighting.denominator(n_obs)?;
            (weighting.inner_mean, Some(weighting.weights), denom)
        }
    };

    let y = plan.broadcast(&targets)?;
    let o = plan.broadcast(&outputs)?;
    trace!(
        kernel = kernel.name(),
        loss = loss.name(),
        mode = mode.name(),
        n_obs,
        "per-observation aggregate"
    );

    let scale = inner_scale::<T>(&plan, axis, inner_mean) / denom;
    for (i, entry) in buffer.iter_mut().enumerate() {
        let inner = fold(
            kernel,
            loss,
            &y.index_axis(Axis(axis), i),
            &o.index_axis(Axis(axis), i),
        );
        let w = weights.map_or(T::one(), |w| w[i]);
        *entry = inner * scale * w;
    }
    Ok(())
}

/// Allocating form of [`aggregate_per_obs_into`].
pub fn aggregate_per_obs<T, L, K>(
    kernel: K,
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
    mode: AggMode<'_, T>,
    axis: ObsAxis,
) -> LossResult<Array1<T>>
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T, Out = T>,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    // Rank is checked by the buffered form; a rank 0 or 1 plan gets a
    // placeholder length so that error surfaces instead.
    let n_obs = match plan.obs_axis(axis) {
        Ok(axis) if plan.ndim() >= 2 => plan.shape()[axis],
        _ => 0,
    };
    let mut buffer = Array1::zeros(n_obs);
    aggregate_per_obs_into(kernel, loss, targets, outputs, mode, axis, buffer.view_mut())?;
    Ok(buffer)
}

// 1 / inner length for inner means, 1 for inner sums
#[inline]
fn inner_scale<T: LossFloat>(plan: &BroadcastPlan, axis: usize, inner_mean: bool) -> T {
    if inner_mean {
        T::one() / T::from_param(plan.inner_len(axis) as f64)
    } else {
        T::one()
    }
}
