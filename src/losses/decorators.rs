// src/losses/decorators.rs
// Wrappers that derive a new loss from an existing one

use super::distance::{
    HuberLoss, L1DistLoss, L1EpsilonInsLoss, L2DistLoss, L2EpsilonInsLoss, LPDistLoss,
    LogitDistLoss, PeriodicLoss, QuantileLoss,
};
use super::margin::{
    DWDMarginLoss, ExpLoss, L1HingeLoss, L2HingeLoss, L2MarginLoss, LogitMarginLoss,
    ModifiedHuberLoss, PerceptronLoss, SigmoidLoss, SmoothedL1HingeLoss, ZeroOneLoss,
};
use super::{Loss, LossFamily, Properties, SupervisedLoss};
use crate::backend::LossFloat;
use crate::error::{LossError, LossResult};
use std::ops::Mul;
use tracing::debug;

// =============================================================================
// Scaled
// =============================================================================

/// A loss multiplied by a constant factor `k > 0`.
///
/// Value and both derivatives are the inner ones times `k`. Since `k` is
/// positive every property of the inner loss is preserved, family included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled<L> {
    loss: L,
    k: f64,
}

impl<L: SupervisedLoss> Scaled<L> {
    pub fn new(loss: L, k: f64) -> LossResult<Self> {
        if !(k > 0.0) || !k.is_finite() {
            debug!(loss = loss.name(), k, "rejected scale factor");
            return Err(LossError::invalid_param("Scaled", "k", k, "finite and > 0"));
        }
        debug!(loss = loss.name(), k, "scaled loss");
        Ok(Self { loss, k })
    }

    pub fn inner(&self) -> &L {
        &self.loss
    }

    pub fn factor(&self) -> f64 {
        self.k
    }

    pub fn into_inner(self) -> L {
        self.loss
    }
}

impl<L: SupervisedLoss> SupervisedLoss for Scaled<L> {
    fn name(&self) -> &'static str {
        "Scaled"
    }

    #[inline]
    fn family(&self) -> LossFamily {
        self.loss.family()
    }

    #[inline]
    fn value<T: LossFloat>(&self, target: T, output: T) -> T {
        T::from_param(self.k) * self.loss.value(target, output)
    }

    #[inline]
    fn deriv<T: LossFloat>(&self, target: T, output: T) -> T {
        T::from_param(self.k) * self.loss.deriv(target, output)
    }

    #[inline]
    fn deriv2<T: LossFloat>(&self, target: T, output: T) -> T {
        T::from_param(self.k) * self.loss.deriv2(target, output)
    }

    #[inline]
    fn value_deriv<T: LossFloat>(&self, target: T, output: T) -> (T, T) {
        let k = T::from_param(self.k);
        let (v, d) = self.loss.value_deriv(target, output);
        (k * v, k * d)
    }

    #[inline]
    fn properties(&self) -> Properties {
        self.loss.properties()
    }

    #[inline]
    fn is_differentiable_at(&self, at: f64) -> bool {
        self.loss.is_differentiable_at(at)
    }

    #[inline]
    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        self.loss.is_twice_differentiable_at(at)
    }
}

/// Wraps `loss` so that it is multiplied by `k`.
pub fn scaled<L: SupervisedLoss>(loss: L, k: f64) -> LossResult<Scaled<L>> {
    Scaled::new(loss, k)
}

// `k * loss` builds `Scaled` through the validating constructor, so the
// product is a `LossResult`.
macro_rules! impl_scalar_mul {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mul<$ty> for f64 {
                type Output = LossResult<Scaled<$ty>>;

                fn mul(self, loss: $ty) -> Self::Output {
                    Scaled::new(loss, self)
                }
            }
        )*
    };
}

impl_scalar_mul!(
    L1DistLoss,
    L2DistLoss,
    LPDistLoss,
    LogitDistLoss,
    HuberLoss,
    L1EpsilonInsLoss,
    L2EpsilonInsLoss,
    PeriodicLoss,
    QuantileLoss,
    ZeroOneLoss,
    PerceptronLoss,
    L1HingeLoss,
    L2HingeLoss,
    SmoothedL1HingeLoss,
    ModifiedHuberLoss,
    DWDMarginLoss,
    L2MarginLoss,
    LogitMarginLoss,
    ExpLoss,
    SigmoidLoss,
    Loss,
);

impl<L: SupervisedLoss> Mul<Scaled<L>> for f64 {
    type Output = LossResult<Scaled<Scaled<L>>>;

    fn mul(self, loss: Scaled<L>) -> Self::Output {
        Scaled::new(loss, self)
    }
}

impl<L: SupervisedLoss> Mul<Weighted<L>> for f64 {
    type Output = LossResult<Scaled<Weighted<L>>>;

    fn mul(self, loss: Weighted<L>) -> Self::Output {
        Scaled::new(loss, self)
    }
}

/// Least squares in its conventional form `0.5 * (output - target)^2`
pub type LeastSquaresLoss = Scaled<L2DistLoss>;

pub fn least_squares() -> LeastSquaresLoss {
    Scaled {
        loss: L2DistLoss,
        k: 0.5,
    }
}

// =============================================================================
// Weighted
// =============================================================================

/// A margin-based loss with the two classes weighted differently.
///
/// Observations with a positive target are multiplied by `w`, all others by
/// `1 - w`. The result is no longer a function of the agreement alone, so
/// it reports [`LossFamily::Other`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weighted<L> {
    loss: L,
    w: f64,
}

impl<L: SupervisedLoss> Weighted<L> {
    pub fn new(loss: L, w: f64) -> LossResult<Self> {
        if !(0.0..=1.0).contains(&w) {
            debug!(loss = loss.name(), w, "rejected class weight");
            return Err(LossError::invalid_param("Weighted", "w", w, "in [0, 1]"));
        }
        if !loss.is_margin_based() {
            debug!(loss = loss.name(), "class weighting needs a margin-based loss");
            return Err(LossError::NotMarginBased {
                loss: loss.name().to_string(),
            });
        }
        debug!(loss = loss.name(), w, "class-weighted loss");
        Ok(Self { loss, w })
    }

    pub fn inner(&self) -> &L {
        &self.loss
    }

    /// Weight of the positive class
    pub fn weight(&self) -> f64 {
        self.w
    }

    pub fn into_inner(self) -> L {
        self.loss
    }

    #[inline(always)]
    fn class_weight<T: LossFloat>(&self, target: T) -> T {
        if target > T::zero() {
            T::from_param(self.w)
        } else {
            T::from_param(1.0 - self.w)
        }
    }
}

impl<L: SupervisedLoss> SupervisedLoss for Weighted<L> {
    fn name(&self) -> &'static str {
        "Weighted"
    }

    fn family(&self) -> LossFamily {
        LossFamily::Other
    }

    #[inline]
    fn value<T: LossFloat>(&self, target: T, output: T) -> T {
        self.class_weight(target) * self.loss.value(target, output)
    }

    #[inline]
    fn deriv<T: LossFloat>(&self, target: T, output: T) -> T {
        self.class_weight(target) * self.loss.deriv(target, output)
    }

    #[inline]
    fn deriv2<T: LossFloat>(&self, target: T, output: T) -> T {
        self.class_weight(target) * self.loss.deriv2(target, output)
    }

    #[inline]
    fn value_deriv<T: LossFloat>(&self, target: T, output: T) -> (T, T) {
        let c = self.class_weight(target);
        let (v, d) = self.loss.value_deriv(target, output);
        (c * v, c * d)
    }

    fn properties(&self) -> Properties {
        let inner = self.loss.properties();
        // A zero class weight flattens one branch entirely
        let interior = self.w > 0.0 && self.w < 1.0;
        Properties {
            strictly_convex: inner.strictly_convex && interior,
            strongly_convex: inner.strongly_convex && interior,
            symmetric: false,
            class_calibrated: inner.class_calibrated && self.w == 0.5,
            ..inner
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        self.loss.is_differentiable_at(at)
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        self.loss.is_twice_differentiable_at(at)
    }
}

/// Reweights the classes of a margin-based `loss`, `w` going to the
/// positive class.
pub fn weighted<L: SupervisedLoss>(loss: L, w: f64) -> LossResult<Weighted<L>> {
    Weighted::new(loss, w)
}
