// src/losses/catalog.rs
// Closed enumeration over every concrete loss, for runtime selection

use super::distance::{
    HuberLoss, L1DistLoss, L1EpsilonInsLoss, L2DistLoss, L2EpsilonInsLoss, LPDistLoss,
    LogitDistLoss, PeriodicLoss, QuantileLoss,
};
use super::margin::{
    DWDMarginLoss, ExpLoss, L1HingeLoss, L2HingeLoss, L2MarginLoss, LogitMarginLoss,
    ModifiedHuberLoss, PerceptronLoss, SigmoidLoss, SmoothedL1HingeLoss, ZeroOneLoss,
};
use super::{LossFamily, Properties, SupervisedLoss};
use crate::backend::LossFloat;
use crate::config::LossConfig;
use crate::error::LossResult;

/// Any concrete loss, chosen at runtime.
///
/// Generic code should prefer the concrete types; this enum exists for
/// configuration-driven selection and for iterating over the whole family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loss {
    L1Dist(L1DistLoss),
    L2Dist(L2DistLoss),
    LPDist(LPDistLoss),
    LogitDist(LogitDistLoss),
    Huber(HuberLoss),
    L1EpsilonIns(L1EpsilonInsLoss),
    L2EpsilonIns(L2EpsilonInsLoss),
    Periodic(PeriodicLoss),
    Quantile(QuantileLoss),
    ZeroOne(ZeroOneLoss),
    Perceptron(PerceptronLoss),
    L1Hinge(L1HingeLoss),
    L2Hinge(L2HingeLoss),
    SmoothedL1Hinge(SmoothedL1HingeLoss),
    ModifiedHuber(ModifiedHuberLoss),
    DWDMargin(DWDMarginLoss),
    L2Margin(L2MarginLoss),
    LogitMargin(LogitMarginLoss),
    Exp(ExpLoss),
    Sigmoid(SigmoidLoss),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Loss::L1Dist($inner) => $body,
            Loss::L2Dist($inner) => $body,
            Loss::LPDist($inner) => $body,
            Loss::LogitDist($inner) => $body,
            Loss::Huber($inner) => $body,
            Loss::L1EpsilonIns($inner) => $body,
            Loss::L2EpsilonIns($inner) => $body,
            Loss::Periodic($inner) => $body,
            Loss::Quantile($inner) => $body,
            Loss::ZeroOne($inner) => $body,
            Loss::Perceptron($inner) => $body,
            Loss::L1Hinge($inner) => $body,
            Loss::L2Hinge($inner) => $body,
            Loss::SmoothedL1Hinge($inner) => $body,
            Loss::ModifiedHuber($inner) => $body,
            Loss::DWDMargin($inner) => $body,
            Loss::L2Margin($inner) => $body,
            Loss::LogitMargin($inner) => $body,
            Loss::Exp($inner) => $body,
            Loss::Sigmoid($inner) => $body,
        }
    };
}

macro_rules! impl_from_loss {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Loss {
                fn from(loss: $ty) -> Self {
                    Loss::$variant(loss)
                }
            }
        )*
    };
}

impl_from_loss!(
    L1Dist(L1DistLoss),
    L2Dist(L2DistLoss),
    LPDist(LPDistLoss),
    LogitDist(LogitDistLoss),
    Huber(HuberLoss),
    L1EpsilonIns(L1EpsilonInsLoss),
    L2EpsilonIns(L2EpsilonInsLoss),
    Periodic(PeriodicLoss),
    Quantile(QuantileLoss),
    ZeroOne(ZeroOneLoss),
    Perceptron(PerceptronLoss),
    L1Hinge(L1HingeLoss),
    L2Hinge(L2HingeLoss),
    SmoothedL1Hinge(SmoothedL1HingeLoss),
    ModifiedHuber(ModifiedHuberLoss),
    DWDMargin(DWDMarginLoss),
    L2Margin(L2MarginLoss),
    LogitMargin(LogitMarginLoss),
    Exp(ExpLoss),
    Sigmoid(SigmoidLoss),
);

impl SupervisedLoss for Loss {
    fn name(&self) -> &'static str {
        dispatch!(self, l => l.name())
    }

    fn family(&self) -> LossFamily {
        dispatch!(self, l => l.family())
    }

    #[inline]
    fn value<T: LossFloat>(&self, target: T, output: T) -> T {
        dispatch!(self, l => l.value(target, output))
    }

    #[inline]
    fn deriv<T: LossFloat>(&self, target: T, output: T) -> T {
        dispatch!(self, l => l.deriv(target, output))
    }

    #[inline]
    fn deriv2<T: LossFloat>(&self, target: T, output: T) -> T {
        dispatch!(self, l => l.deriv2(target, output))
    }

    #[inline]
    fn value_deriv<T: LossFloat>(&self, target: T, output: T) -> (T, T) {
        dispatch!(self, l => l.value_deriv(target, output))
    }

    fn properties(&self) -> Properties {
        dispatch!(self, l => l.properties())
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        dispatch!(self, l => l.is_differentiable_at(at))
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        dispatch!(self, l => l.is_twice_differentiable_at(at))
    }
}

impl Loss {
    /// One instance of every loss kind, parametrized with representative
    /// shape parameters.
    pub fn catalog() -> LossResult<Vec<Loss>> {
        Ok(vec![
            L1DistLoss.into(),
            L2DistLoss.into(),
            LPDistLoss::new(3.0)?.into(),
            LogitDistLoss.into(),
            HuberLoss::new(1.0)?.into(),
            L1EpsilonInsLoss::new(0.5)?.into(),
            L2EpsilonInsLoss::new(0.5)?.into(),
            PeriodicLoss::new(2.0)?.into(),
            QuantileLoss::new(0.7)?.into(),
            ZeroOneLoss.into(),
            PerceptronLoss.into(),
            L1HingeLoss.into(),
            L2HingeLoss.into(),
            SmoothedL1HingeLoss::new(0.5)?.into(),
            ModifiedHuberLoss.into(),
            DWDMarginLoss::new(1.0)?.into(),
            L2MarginLoss.into(),
            LogitMarginLoss.into(),
            ExpLoss.into(),
            SigmoidLoss.into(),
        ])
    }

    /// Serializable description of this loss and its parameters.
    pub fn to_config(&self) -> LossConfig {
        match self {
            Loss::L1Dist(_) => LossConfig::L1Dist,
            Loss::L2Dist(_) => LossConfig::L2Dist,
            Loss::LPDist(l) => LossConfig::LpDist { p: l.p() },
            Loss::LogitDist(_) => LossConfig::LogitDist,
            Loss::Huber(l) => LossConfig::Huber { d: l.d() },
            Loss::L1EpsilonIns(l) => LossConfig::L1EpsilonIns { eps: l.eps() },
            Loss::L2EpsilonIns(l) => LossConfig::L2EpsilonIns { eps: l.eps() },
            Loss::Periodic(l) => LossConfig::Periodic {
                c: l.circumference(),
            },
            Loss::Quantile(l) => LossConfig::Quantile { tau: l.tau() },
            Loss::ZeroOne(_) => LossConfig::ZeroOne,
            Loss::Perceptron(_) => LossConfig::Perceptron,
            Loss::L1Hinge(_) => LossConfig::L1Hinge,
            Loss::L2Hinge(_) => LossConfig::L2Hinge,
            Loss::SmoothedL1Hinge(l) => LossConfig::SmoothedL1Hinge { gamma: l.gamma() },
            Loss::ModifiedHuber(_) => LossConfig::ModifiedHuber,
            Loss::DWDMargin(l) => LossConfig::DwdMargin { q: l.q() },
            Loss::L2Margin(_) => LossConfig::L2Margin,
            Loss::LogitMargin(_) => LossConfig::LogitMargin,
            Loss::Exp(_) => LossConfig::Exp,
            Loss::Sigmoid(_) => LossConfig::Sigmoid,
        }
    }
}
