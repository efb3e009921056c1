// src/ops/mod.rs
// Array evaluation engine: broadcasting, element-wise maps and reductions.
// Every pass is driven by a kernel that says which pointwise quantity of the
// loss to compute, so value, deriv, deriv2 and value_deriv share one engine.

pub mod broadcast;
pub mod elementwise;
pub mod reduction;


pub use broadcast::{BroadcastPlan, ObsAxis};
pub use reduction::AggMode;

use crate::backend::{Accumulate, LossFloat};
use crate::losses::SupervisedLoss;
use std::any::type_name;

// All pointwise quantities the engine can evaluate implement this trait.
pub trait Kernel<T: LossFloat>: Copy + std::fmt::Debug {
    /// Result of one evaluation, summable by the aggregation engine
    type Out: Accumulate<Scalar = T>;

    fn eval<L: SupervisedLoss>(&self, loss: &L, target: T, output: T) -> Self::Out;

    fn name(&self) -> &'static str {
        let full_name = type_name::<Self>();
        full_name.rsplit("::").next().unwrap_or(full_name)
    }
}

/// Loss value
#[derive(Debug, Clone, Copy, Default)]
pub struct Value;

/// First derivative with respect to the output
#[derive(Debug, Clone, Copy, Default)]
pub struct Deriv;

/// Second derivative with respect to the output
#[derive(Debug, Clone, Copy, Default)]
pub struct Deriv2;

/// Value and first derivative together
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDeriv;

impl<T: LossFloat> Kernel<T> for Value {
    type Out = T;

    #[inline(always)]
    fn eval<L: SupervisedLoss>(&self, loss: &L, target: T, output: T) -> T {
        loss.value(target, output)
    }
}

impl<T: LossFloat> Kernel<T> for Deriv {
    type Out = T;

    #[inline(always)]
    fn eval<L: SupervisedLoss>(&self, loss: &L, target: T, output: T) -> T {
        loss.deriv(target, output)
    }
}

impl<T: LossFloat> Kernel<T> for Deriv2 {
    type Out = T;

    #[inline(always)]
    fn eval<L: SupervisedLoss>(&self, loss: &L, target: T, output: T) -> T {
        loss.deriv2(target, output)
    }
}

impl<T: LossFloat> Kernel<T> for ValueDeriv {
    type Out = (T, T);

    #[inline(always)]
    fn eval<L: SupervisedLoss>(&self, loss: &L, target: T, output: T) -> (T, T) {
        loss.value_deriv(target, output)
    }
}
