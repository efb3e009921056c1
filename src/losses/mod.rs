pub mod catalog;
pub mod decorators;
pub mod distance;
pub mod margin;


use crate::backend::LossFloat;
use std::fmt::Debug;

pub use catalog::Loss;
pub use decorators::{LeastSquaresLoss, Scaled, Weighted, least_squares, scaled, weighted};
pub use distance::{
    EpsilonInsLoss, HuberLoss, L1DistLoss, L1EpsilonInsLoss, L2DistLoss, L2EpsilonInsLoss,
    LPDistLoss, LogitDistLoss, PeriodicLoss, QuantileLoss,
};
pub use margin::{
    DWDMarginLoss, ExpLoss, HingeLoss, L1HingeLoss, L2HingeLoss, L2MarginLoss, LogitMarginLoss,
    ModifiedHuberLoss, PerceptronLoss, SigmoidLoss, SmoothedL1HingeLoss, ZeroOneLoss,
};

/// Analytic family a loss belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossFamily {
    /// Univariate function of the residual `output - target`
    Distance,
    /// Univariate function of the agreement `target * output`
    Margin,
    /// Neither, e.g. a class-reweighted margin loss
    Other,
}

/// Static description of the mathematical character of a loss.
///
/// Every variant reports a fixed table; parametrized variants derive it from
/// their shape parameters only, never from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Properties {
    pub convex: bool,
    pub strictly_convex: bool,
    pub strongly_convex: bool,
    pub differentiable: bool,
    pub twice_differentiable: bool,
    pub locally_lipschitz: bool,
    pub lipschitz: bool,
    pub nemitski: bool,
    pub clipable: bool,
    pub symmetric: bool,
    pub class_calibrated: bool,
}

/// Base trait for all supervised losses.
///
/// A loss maps a `(target, output)` pair to a non-negative number. The
/// evaluation methods work on a single observation in one float precision;
/// mixed precision and arrays are handled by [`crate::eval`] and
/// [`crate::LossExt`] on top of these.
pub trait SupervisedLoss: Debug + Clone + Send + Sync {
    /// Short name of the loss
    fn name(&self) -> &'static str;

    /// Analytic family of the loss
    fn family(&self) -> LossFamily;

    /// Loss value for one observation
    fn value<T: LossFloat>(&self, target: T, output: T) -> T;

    /// First derivative with respect to the output
    fn deriv<T: LossFloat>(&self, target: T, output: T) -> T;

    /// Second derivative with respect to the output
    fn deriv2<T: LossFloat>(&self, target: T, output: T) -> T;

    /// Value and first derivative in one pass
    fn value_deriv<T: LossFloat>(&self, target: T, output: T) -> (T, T) {
        (self.value(target, output), self.deriv(target, output))
    }

    /// Property table of this loss
    fn properties(&self) -> Properties;

    /// Differentiability at a point of the representing function
    /// (residual for distance losses, agreement for margin losses)
    fn is_differentiable_at(&self, _at: f64) -> bool {
        self.properties().differentiable
    }

    /// Twice differentiability at a point of the representing function
    fn is_twice_differentiable_at(&self, _at: f64) -> bool {
        self.properties().twice_differentiable
    }

    fn is_convex(&self) -> bool {
        self.properties().convex
    }

    fn is_strictly_convex(&self) -> bool {
        self.properties().strictly_convex
    }

    fn is_strongly_convex(&self) -> bool {
        self.properties().strongly_convex
    }

    fn is_differentiable(&self) -> bool {
        self.properties().differentiable
    }

    fn is_twice_differentiable(&self) -> bool {
        self.properties().twice_differentiable
    }

    fn is_locally_lipschitz_cont(&self) -> bool {
        self.properties().locally_lipschitz
    }

    fn is_lipschitz_cont(&self) -> bool {
        self.properties().lipschitz
    }

    fn is_nemitski(&self) -> bool {
        self.properties().nemitski
    }

    fn is_clipable(&self) -> bool {
        self.properties().clipable
    }

    fn is_symmetric(&self) -> bool {
        self.properties().symmetric
    }

    fn is_class_calibrated(&self) -> bool {
        self.properties().class_calibrated
    }

    fn is_margin_based(&self) -> bool {
        self.family() == LossFamily::Margin
    }

    fn is_distance_based(&self) -> bool {
        self.family() == LossFamily::Distance
    }
}

/// A loss of the form `psi(output - target)` with `psi(0) == 0`.
///
/// The residual is output minus target. Implementors get their
/// [`SupervisedLoss`] evaluation through `distance_loss!`.
pub trait DistanceLoss: SupervisedLoss {
    fn psi<T: LossFloat>(&self, residual: T) -> T;

    fn psi_deriv<T: LossFloat>(&self, residual: T) -> T;

    fn psi_deriv2<T: LossFloat>(&self, residual: T) -> T;

    fn psi_value_deriv<T: LossFloat>(&self, residual: T) -> (T, T) {
        (self.psi(residual), self.psi_deriv(residual))
    }
}

/// A loss of the form `psi(target * output)` for targets in `{-1, 1}`.
pub trait MarginLoss: SupervisedLoss {
    fn psi<T: LossFloat>(&self, agreement: T) -> T;

    fn psi_deriv<T: LossFloat>(&self, agreement: T) -> T;

    fn psi_deriv2<T: LossFloat>(&self, agreement: T) -> T;

    fn psi_value_deriv<T: LossFloat>(&self, agreement: T) -> (T, T) {
        (self.psi(agreement), self.psi_deriv(agreement))
    }
}

/// Sign of `x` with `sign(0) == 0`; NaN passes through.
#[inline(always)]
pub(crate) fn sign<T: LossFloat>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        x
    }
}

/// Implements [`SupervisedLoss`] for a [`DistanceLoss`] by evaluating its
/// representing function at the residual. The remaining trait items
/// (`properties` and optional pointwise overrides) are passed through.
macro_rules! distance_loss {
    ($ty:ty, $name:literal, { $($body:tt)* }) => {
        impl $crate::losses::SupervisedLoss for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn family(&self) -> $crate::losses::LossFamily {
                $crate::losses::LossFamily::Distance
            }

            #[inline]
            fn value<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                $crate::losses::DistanceLoss::psi(self, output - target)
            }

            #[inline]
            fn deriv<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                $crate::losses::DistanceLoss::psi_deriv(self, output - target)
            }

            #[inline]
            fn deriv2<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                $crate::losses::DistanceLoss::psi_deriv2(self, output - target)
            }

            #[inline]
            fn value_deriv<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> (T, T) {
                $crate::losses::DistanceLoss::psi_value_deriv(self, output - target)
            }

            $($body)*
        }
    };
}

/// Implements [`SupervisedLoss`] for a [`MarginLoss`]. Derivatives are taken
/// with respect to the output, hence the chain-rule factors of the target.
macro_rules! margin_loss {
    ($ty:ty, $name:literal, { $($body:tt)* }) => {
        impl $crate::losses::SupervisedLoss for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn family(&self) -> $crate::losses::LossFamily {
                $crate::losses::LossFamily::Margin
            }

            #[inline]
            fn value<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                $crate::losses::MarginLoss::psi(self, target * output)
            }

            #[inline]
            fn deriv<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                target * $crate::losses::MarginLoss::psi_deriv(self, target * output)
            }

            #[inline]
            fn deriv2<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> T {
                target * target * $crate::losses::MarginLoss::psi_deriv2(self, target * output)
            }

            #[inline]
            fn value_deriv<T: $crate::backend::LossFloat>(&self, target: T, output: T) -> (T, T) {
                let (v, d) = $crate::losses::MarginLoss::psi_value_deriv(self, target * output);
                (v, target * d)
            }

            $($body)*
        }
    };
}

pub(crate) use distance_loss;
pub(crate) use margin_loss;
