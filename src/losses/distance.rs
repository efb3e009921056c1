// src/losses/distance.rs
// Distance-based losses for regression
// All of them are functions of the residual r = output - target

use super::{DistanceLoss, Properties, distance_loss, sign};
use crate::backend::LossFloat;
use crate::error::{LossError, LossResult};
use std::f64::consts::{LN_2, PI};

// =============================================================================
// L1 / L2 / Lp distance
// =============================================================================

/// Absolute distance loss: `L(r) = |r|`
///
/// Lipschitz continuous and convex, but not strictly convex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L1DistLoss;

impl DistanceLoss for L1DistLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        r.abs()
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        sign(r)
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _r: T) -> T {
        T::zero()
    }
}

distance_loss!(L1DistLoss, "L1DistLoss", {
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
            symmetric: true,
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

/// Least squares loss: `L(r) = r^2`
///
/// Strictly and strongly convex; only locally Lipschitz.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct L2DistLoss;

impl DistanceLoss for L2DistLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        r * r
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        r + r
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _r: T) -> T {
        T::from_param(2.0)
    }
}

distance_loss!(L2DistLoss, "L2DistLoss", {
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
            symmetric: true,
            class_calibrated: false,
        }
    }
});

/// P-th power absolute distance loss: `L(r) = |r|^p` for `p >= 1`
///
/// Lipschitz iff `p == 1`, strictly convex iff `p > 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LPDistLoss {
    p: f64,
}

impl LPDistLoss {
    pub fn new(p: f64) -> LossResult<Self> {
        if !(p >= 1.0) || !p.is_finite() {
            return Err(LossError::invalid_param("LPDistLoss", "p", p, "finite and >= 1"));
        }
        Ok(Self { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl DistanceLoss for LPDistLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        r.abs().powf(T::from_param(self.p))
    }

    // p * sign(r) * |r|^(p-1) is p * r * |r|^(p-2) without the 0 * inf at r = 0
    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        let p = T::from_param(self.p);
        p * sign(r) * r.abs().powf(p - T::one())
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, r: T) -> T {
        if self.p == 1.0 {
            return T::zero();
        }
        let p = T::from_param(self.p);
        p * (p - T::one()) * r.abs().powf(p - T::from_param(2.0))
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, r: T) -> (T, T) {
        let p = T::from_param(self.p);
        let a = r.abs();
        let m = a.powf(p - T::one());
        (a * m, p * sign(r) * m)
    }
}

distance_loss!(LPDistLoss, "LPDistLoss", {
    fn properties(&self) -> Properties {
        let p = self.p;
        Properties {
            convex: true,
            strictly_convex: p > 1.0,
            strongly_convex: p == 2.0,
            differentiable: p > 1.0,
            twice_differentiable: p >= 2.0,
            locally_lipschitz: true,
            lipschitz: p == 1.0,
            nemitski: true,
            clipable: true,
            symmetric: true,
            class_calibrated: false,
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        at != 0.0 || self.p > 1.0
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at != 0.0 || self.p >= 2.0
    }
});

// =============================================================================
// Logistic distance
// =============================================================================

/// Distance-based logistic loss: `L(r) = -ln(4 e^r / (1 + e^r)^2)`
///
/// Evaluated as `|r| + 2 ln(1 + e^-|r|) - 2 ln 2`, which never overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogitDistLoss;

impl DistanceLoss for LogitDistLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        let a = r.abs();
        let two = T::from_param(2.0);
        (a + two * (-a).exp().ln_1p() - T::from_param(2.0 * LN_2)).max(T::zero())
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        (r * T::from_param(0.5)).tanh()
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, r: T) -> T {
        let t = (r * T::from_param(0.5)).tanh();
        (T::one() - t * t) * T::from_param(0.5)
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, r: T) -> (T, T) {
        let a = r.abs();
        let e = (-a).exp();
        let value = (a + T::from_param(2.0) * e.ln_1p() - T::from_param(2.0 * LN_2)).max(T::zero());
        // tanh(r / 2) = sign(r) (1 - e^-|r|) / (1 + e^-|r|)
        let deriv = sign(r) * (T::one() - e) / (T::one() + e);
        (value, deriv)
    }
}

distance_loss!(LogitDistLoss, "LogitDistLoss", {
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
            clipable: true,
            symmetric: true,
            class_calibrated: false,
        }
    }
});

// =============================================================================
// Huber
// =============================================================================

/// Huber loss: quadratic for `|r| <= d`, linear beyond.
///
/// `L(r) = r^2 / 2` if `|r| <= d`, else `d |r| - d^2 / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuberLoss {
    d: f64,
}

impl HuberLoss {
    pub fn new(d: f64) -> LossResult<Self> {
        if !(d > 0.0) || !d.is_finite() {
            return Err(LossError::invalid_param("HuberLoss", "d", d, "finite and > 0"));
        }
        Ok(Self { d })
    }

    pub fn d(&self) -> f64 {
        self.d
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self { d: 1.0 }
    }
}

impl DistanceLoss for HuberLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        let d = T::from_param(self.d);
        let a = r.abs();
        if a <= d {
            r * r * T::from_param(0.5)
        } else {
            d * a - d * d * T::from_param(0.5)
        }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        let d = T::from_param(self.d);
        if r.abs() <= d { r } else { d * sign(r) }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, r: T) -> T {
        if r.abs() <= T::from_param(self.d) {
            T::one()
        } else {
            T::zero()
        }
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, r: T) -> (T, T) {
        let d = T::from_param(self.d);
        let a = r.abs();
        if a <= d {
            (r * r * T::from_param(0.5), r)
        } else {
            (d * a - d * d * T::from_param(0.5), d * sign(r))
        }
    }
}

distance_loss!(HuberLoss, "HuberLoss", {
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
            symmetric: true,
            class_calibrated: false,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at.abs() != self.d
    }
});

// =============================================================================
// Epsilon-insensitive
// =============================================================================

/// Epsilon-insensitive loss: `L(r) = max(0, |r| - eps)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L1EpsilonInsLoss {
    eps: f64,
}

/// Common name of [`L1EpsilonInsLoss`]
pub type EpsilonInsLoss = L1EpsilonInsLoss;

impl L1EpsilonInsLoss {
    pub fn new(eps: f64) -> LossResult<Self> {
        if !(eps >= 0.0) || !eps.is_finite() {
            return Err(LossError::invalid_param(
                "L1EpsilonInsLoss",
                "eps",
                eps,
                "finite and >= 0",
            ));
        }
        Ok(Self { eps })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }
}

impl DistanceLoss for L1EpsilonInsLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        (r.abs() - T::from_param(self.eps)).max(T::zero())
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        if r.abs() <= T::from_param(self.eps) {
            T::zero()
        } else {
            sign(r)
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _r: T) -> T {
        T::zero()
    }
}

distance_loss!(L1EpsilonInsLoss, "L1EpsilonInsLoss", {
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
            symmetric: true,
            class_calibrated: false,
        }
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        at.abs() != self.eps
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        at.abs() != self.eps
    }
});

/// Quadratic epsilon-insensitive loss: `L(r) = max(0, |r| - eps)^2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L2EpsilonInsLoss {
    eps: f64,
}

impl L2EpsilonInsLoss {
    pub fn new(eps: f64) -> LossResult<Self> {
        if !(eps >= 0.0) || !eps.is_finite() {
            return Err(LossError::invalid_param(
                "L2EpsilonInsLoss",
                "eps",
                eps,
                "finite and >= 0",
            ));
        }
        Ok(Self { eps })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }
}

impl DistanceLoss for L2EpsilonInsLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        let e = (r.abs() - T::from_param(self.eps)).max(T::zero());
        e * e
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        let e = r.abs() - T::from_param(self.eps);
        if e <= T::zero() {
            T::zero()
        } else {
            T::from_param(2.0) * sign(r) * e
        }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, r: T) -> T {
        if r.abs() <= T::from_param(self.eps) {
            T::zero()
        } else {
            T::from_param(2.0)
        }
    }
}

distance_loss!(L2EpsilonInsLoss, "L2EpsilonInsLoss", {
    fn properties(&self) -> Properties {
        // eps == 0 degenerates to the L2 distance
        let quadratic = self.eps == 0.0;
        Properties {
            convex: true,
            strictly_convex: quadratic,
            strongly_convex: quadratic,
            differentiable: true,
            twice_differentiable: quadratic,
            locally_lipschitz: true,
            lipschitz: false,
            nemitski: true,
            clipable: true,
            symmetric: true,
            class_calibrated: false,
        }
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        self.eps == 0.0 || at.abs() != self.eps
    }
});

// =============================================================================
// Periodic
// =============================================================================

/// Distance on a circle of circumference `c`: `L(r) = 1 - cos(2 pi r / c)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicLoss {
    c: f64,
    k: f64,
}

impl PeriodicLoss {
    pub fn new(c: f64) -> LossResult<Self> {
        if !(c > 0.0) || !c.is_finite() {
            return Err(LossError::invalid_param("PeriodicLoss", "c", c, "finite and > 0"));
        }
        Ok(Self { c, k: 2.0 * PI / c })
    }

    pub fn circumference(&self) -> f64 {
        self.c
    }
}

impl DistanceLoss for PeriodicLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        T::one() - (r * T::from_param(self.k)).cos()
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        let k = T::from_param(self.k);
        k * (r * k).sin()
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, r: T) -> T {
        let k = T::from_param(self.k);
        k * k * (r * k).cos()
    }

    #[inline]
    fn psi_value_deriv<T: LossFloat>(&self, r: T) -> (T, T) {
        let k = T::from_param(self.k);
        let (s, c) = (r * k).sin_cos();
        (T::one() - c, k * s)
    }
}

distance_loss!(PeriodicLoss, "PeriodicLoss", {
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
            symmetric: true,
            class_calibrated: false,
        }
    }
});

// =============================================================================
// Quantile (pinball)
// =============================================================================

/// Quantile (pinball) loss for conditional `tau`-quantiles.
///
/// With `r = output - target`: `L(r) = tau r` if `r >= 0`, else
/// `(tau - 1) r`. Overestimates are weighted by `tau`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileLoss {
    tau: f64,
}

impl QuantileLoss {
    pub fn new(tau: f64) -> LossResult<Self> {
        if !(tau > 0.0 && tau < 1.0) {
            return Err(LossError::invalid_param("QuantileLoss", "tau", tau, "in (0, 1)"));
        }
        Ok(Self { tau })
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }
}

impl DistanceLoss for QuantileLoss {
    #[inline]
    fn psi<T: LossFloat>(&self, r: T) -> T {
        let tau = T::from_param(self.tau);
        if r >= T::zero() {
            tau * r
        } else {
            (tau - T::one()) * r
        }
    }

    #[inline]
    fn psi_deriv<T: LossFloat>(&self, r: T) -> T {
        let tau = T::from_param(self.tau);
        if r >= T::zero() { tau } else { tau - T::one() }
    }

    #[inline]
    fn psi_deriv2<T: LossFloat>(&self, _r: T) -> T {
        T::zero()
    }
}

distance_loss!(QuantileLoss, "QuantileLoss", {
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
            symmetric: self.tau == 0.5,
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
