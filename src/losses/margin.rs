// src/losses/margin.rs
// Margin-based losses for binary classification
// Targets are expected in {-1, 1}; every loss is a function of the agreement a = target * output

use super::{MarginLoss, Properties, margin_loss};
use crate::backend::LossFloat;
use crate::error::{LossError, LossResult};

// =============================================================================
// Zero-one and perceptron
// =============================================================================

/// Classical misclassification loss: `1` if `a < 0`, else `0`
///
/// Neither convex nor continuous. Its derivative is taken as zero everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroOneLoss;

impl MarginLoss for ZeroOneLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        if a < T::zero() { T::one() } else { T::zero() }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, _a: T) -> T {
        T::zero()
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _a: T) -> T {
        T::zero()
    }
}

margin_loss!(ZeroOneLoss, "ZeroOneLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: false,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: false,
            twice_differentiable: false,
            locally_lipschitz: false,
            lipschitz: false,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        at != 0.0
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 0.0
    }
});

/// Perceptron loss: `max(0, -a)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerceptronLoss;

impl MarginLoss for PerceptronLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        (-a).max(T::zero())
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        if a < T::zero() { -T::one() } else { T::zero() }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _a: T) -> T {
        T::zero()
    }
}

margin_loss!(PerceptronLoss, "PerceptronLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: false,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: false,
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        at != 0.0
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 0.0
    }
});

// =============================================================================
// Hinge family
// =============================================================================

/// Hinge loss: `max(0, 1 - a)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L1HingeLoss;

/// Common name of [`L1HingeLoss`]
pub type HingeLoss = L1HingeLoss;

impl MarginLoss for L1HingeLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        (T::one() - a).max(T::zero())
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        if a < T::one() { -T::one() } else { T::zero() }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _a: T) -> T {
        T::zero()
    }
}

margin_loss!(L1HingeLoss, "L1HingeLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: false,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        at != 1.0
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 1.0
    }
});

/// Truncated least squares: `max(0, 1 - a)^2`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L2HingeLoss;

impl MarginLoss for L2HingeLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        let h = (T::one() - a).max(T::zero());
        h * h
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        if a < T::one() {
            T::from_param(2.0) * (a - T::one())
        } else {
            T::zero()
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        if a < T::one() {
            T::from_param(2.0)
        } else {
            T::zero()
        }
    }
}

margin_loss!(L2HingeLoss, "L2HingeLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: false,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 1.0
    }
});

/// Smoothed hinge loss with smoothing width `gamma > 0`.
///
/// `max(0, 1 - a)^2 / (2 gamma)` if `a >= 1 - gamma`, else `1 - gamma / 2 - a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedL1HingeLoss {
    gamma: f64,
}

impl SmoothedL1HingeLoss {
    pub fn new(gamma: f64) -> LossResult<Self> {
        if !(gamma > 0.0) || !gamma.is_finite() {
            return Err(LossError::invalid_param(
                "SmoothedL1HingeLoss",
                "gamma",
                gamma,
                "finite and > 0",
            ));
        }
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl MarginLoss for SmoothedL1HingeLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        let gamma = T::from_param(self.gamma);
        if a >= T::one() - gamma {
            let h = (T::one() - a).max(T::zero());
            h * h / (gamma + gamma)
        } else {
            T::one() - gamma * T::from_param(0.5) - a
        }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        let gamma = T::from_param(self.gamma);
        if a >= T::one() - gamma {
            -(T::one() - a).max(T::zero()) / gamma
        } else {
            -T::one()
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        let gamma = T::from_param(self.gamma);
        if a < T::one() - gamma || a > T::one() {
            T::zero()
        } else {
            T::one() / gamma
        }
    }
}

margin_loss!(SmoothedL1HingeLoss, "SmoothedL1HingeLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 1.0 && at != 1.0 - self.gamma
    }
});

/// Modified Huber loss, four times the smoothed hinge with `gamma = 2`.
///
/// `max(0, 1 - a)^2` if `a >= -1`, else `-4 a`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModifiedHuberLoss;

impl MarginLoss for ModifiedHuberLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        if a >= -T::one() {
            let h = (T::one() - a).max(T::zero());
            h * h
        } else {
            T::from_param(-4.0) * a
        }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        if a >= -T::one() {
            T::from_param(-2.0) * (T::one() - a).max(T::zero())
        } else {
            T::from_param(-4.0)
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        if a < -T::one() || a > T::one() {
            T::zero()
        } else {
            T::from_param(2.0)
        }
    }
}

margin_loss!(ModifiedHuberLoss, "ModifiedHuberLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 1.0 && at != -1.0
    }
});

/// Distance weighted discrimination loss with exponent `q > 0`.
///
/// `1 - a` if `a <= q / (q + 1)`, else `q^q / ((q + 1)^(q + 1) a^q)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DWDMarginLoss {
    q: f64,
    // q / (q + 1), where the two pieces meet
    threshold: f64,
    // q^q / (q + 1)^(q + 1)
    value_coef: f64,
    // (q / (q + 1))^(q + 1)
    deriv_coef: f64,
}

impl DWDMarginLoss {
    pub fn new(q: f64) -> LossResult<Self> {
        if !(q > 0.0) || !q.is_finite() {
            return Err(LossError::invalid_param("DWDMarginLoss", "q", q, "finite and > 0"));
        }
        let threshold = q / (q + 1.0);
        Ok(Self {
            q,
            threshold,
            value_coef: q.powf(q) / (q + 1.0).powf(q + 1.0),
            deriv_coef: threshold.powf(q + 1.0),
        })
    }

    pub fn q(&self) -> f64 {
        self.q
    }
}

impl MarginLoss for DWDMarginLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        if a <= T::from_param(self.threshold) {
            T::one() - a
        } else {
            T::from_param(self.value_coef) / a.powf(T::from_param(self.q))
        }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        if a <= T::from_param(self.threshold) {
            -T::one()
        } else {
            -T::from_param(self.deriv_coef) / a.powf(T::from_param(self.q + 1.0))
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        if a <= T::from_param(self.threshold) {
            T::zero()
        } else {
            T::from_param((self.q + 1.0) * self.deriv_coef) / a.powf(T::from_param(self.q + 2.0))
        }
    }
}

margin_loss!(DWDMarginLoss, "DWDMarginLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: false,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: false,
            symmetric: false,
            class_calibrated: true,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != self.threshold
    }
});

// =============================================================================
// Smooth margin losses
// =============================================================================

/// Margin-based least squares: `(1 - a)^2`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L2MarginLoss;

impl MarginLoss for L2MarginLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        let h = T::one() - a;
        h * h
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        T::from_param(2.0) * (a - T::one())
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _a: T) -> T {
        T::from_param(2.0)
    }
}

margin_loss!(L2MarginLoss, "L2MarginLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: true,
            strongly_convex: true,
            differentiable: true,
            twice_differentiable: true,
            locally_lipschitz: true,
            lipschitz: false,
            nemitski: true,
            clipable: true,
            symmetric: false,
            class_calibrated: true,
        }
    }
});

/// Logistic loss: `ln(1 + e^-a)`
///
/// Computed through `max(-a, 0) + ln(1 + e^-|a|)` so large agreements of
/// either sign stay finite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogitMarginLoss;

impl MarginLoss for LogitMarginLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        (-a).max(T::zero()) + (-a.abs()).exp().ln_1p()
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        let e = (-a.abs()).exp();
        if a >= T::zero() {
            -e / (T::one() + e)
        } else {
            -T::one() / (T::one() + e)
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        let e = (-a.abs()).exp();
        let s = T::one() + e;
        e / (s * s)
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, a: T) -> (T, T) {
        let e = (-a.abs()).exp();
        let value = (-a).max(T::zero()) + e.ln_1p();
        let deriv = if a >= T::zero() {
            -e / (T::one() + e)
        } else {
            -T::one() / (T::one() + e)
        };
        (value, deriv)
    }
}

margin_loss!(LogitMarginLoss, "LogitMarginLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: true,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: true,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: false,
            symmetric: false,
            class_calibrated: true,
        }
    }
});

/// Exponential loss: `e^-a`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpLoss;

impl MarginLoss for ExpLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        (-a).exp()
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        -(-a).exp()
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        (-a).exp()
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, a: T) -> (T, T) {
        let e = (-a).exp();
        (e, -e)
    }
}

margin_loss!(ExpLoss, "ExpLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: true,
            strictly_convex: true,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: true,
            locally_lipschitz: true,
            lipschitz: false,
            nemitski: true,
            clipable: false,
            symmetric: false,
            class_calibrated: true,
        }
    }
});

/// Sigmoid loss: `1 - tanh(a)`, bounded in `(0, 2)` and non-convex
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SigmoidLoss;

impl MarginLoss for SigmoidLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, a: T) -> T {
        T::one() - a.tanh()
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, a: T) -> T {
        let t = a.tanh();
        -(T::one() - t * t)
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, a: T) -> T {
        let t = a.tanh();
        T::from_param(2.0) * t * (T::one() - t * t)
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, a: T) -> (T, T) {
        let t = a.tanh();
        (T::one() - t, -(T::one() - t * t))
    }
}

margin_loss!(SigmoidLoss, "SigmoidLoss", {
    fn properties(&self) -> Properties {
        Properties {
            convex: false,
            strictly_convex: false,
            strongly_convex: false,
            differentiable: true,
            twice_differentiable: true,
            locally_lipschitz: true,
            lipschitz: true,
            nemitski: true,
            clipable: false,
            symmetric: false,
            class_calibrated: true,
        }
    }
});
