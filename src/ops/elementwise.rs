// src/ops/elementwise.rs
// Element-wise evaluation over broadcast arrays, allocating or into caller buffers

use super::{BroadcastPlan, Kernel};
use crate::backend::LossFloat;
use crate::error::LossResult;
use crate::losses::SupervisedLoss;
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use tracing::trace;

/// Evaluates `kernel` for every broadcast `(target, output)` pair into a
/// freshly allocated array of the broadcast shape.
pub fn evaluate<T, L, K>(
    kernel: K,
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
) -> LossResult<ArrayD<T>>
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T, Out = T>,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    let y = plan.broadcast(&targets)?;
    let o = plan.broadcast(&outputs)?;
    trace!(kernel = kernel.name(), loss = loss.name(), "element-wise evaluation");

    Ok(Zip::from(&y)
        .and(&o)
        .map_collect(|&y, &o| kernel.eval(loss, y, o)))
}

/// Same as [`evaluate`], writing into `buffer`. The buffer must already have
/// the broadcast shape; nothing is written when it does not.
pub fn evaluate_into<T, L, K>(
    kernel: K,
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
    mut buffer: ArrayViewMutD<'_, T>,
) -> LossResult<()>
where
    T: LossFloat,
    L: SupervisedLoss,
    K: Kernel<T, Out = T>,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    plan.check_buffer(buffer.shape())?;
    let y = plan.broadcast(&targets)?;
    let o = plan.broadcast(&outputs)?;
    trace!(kernel = kernel.name(), loss = loss.name(), "element-wise evaluation into buffer");

    Zip::from(&mut buffer)
        .and(&y)
        .and(&o)
        .for_each(|b, &y, &o| *b = kernel.eval(loss, y, o));
    Ok(())
}

/// Values and first derivatives in one pass, into two buffers of the
/// broadcast shape.
pub fn evaluate_pair_into<T, L>(
    loss: &L,
    targets: ArrayViewD<'_, T>,
    outputs: ArrayViewD<'_, T>,
    mut values: ArrayViewMutD<'_, T>,
    mut derivs: ArrayViewMutD<'_, T>,
) -> LossResult<()>
where
    T: LossFloat,
    L: SupervisedLoss,
{
    let plan = BroadcastPlan::new(targets.shape(), outputs.shape())?;
    plan.check_buffer(values.shape())?;
    plan.check_buffer(derivs.shape())?;
    let y = plan.broadcast(&targets)?;
    let o = plan.broadcast(&outputs)?;
    trace!(loss = loss.name(), "element-wise value and derivative");

    Zip::from(&mut values)
        .and(&mut derivs)
        .and(&y)
        .and(&o)
        .for_each(|v, d, &y, &o| {
            let (value, deriv) = loss.value_deriv(y, o);
            *v = value;
            *d = deriv;
        });
    Ok(())
}
