// src/config.rs
// Declarative loss descriptions, e.g. read from a JSON training config.
//
// {"loss": {"kind": "smoothed_l1_hinge", "gamma": 0.5}, "class_weight": 0.7}

use crate::backend::LossFloat;
use crate::error::LossResult;
use crate::losses::{
    DWDMarginLoss, ExpLoss, HuberLoss, L1DistLoss, L1EpsilonInsLoss, L1HingeLoss, L2DistLoss,
    L2EpsilonInsLoss, L2HingeLoss, L2MarginLoss, LPDistLoss, LogitDistLoss, LogitMarginLoss, Loss,
    LossFamily, ModifiedHuberLoss, PerceptronLoss, PeriodicLoss, Properties, QuantileLoss, Scaled,
    SigmoidLoss, SmoothedL1HingeLoss, SupervisedLoss, Weighted, ZeroOneLoss,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_huber_d() -> f64 {
    1.0
}

/// One catalog loss and its shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LossConfig {
    L1Dist,
    L2Dist,
    LpDist {
        p: f64,
    },
    LogitDist,
    Huber {
        #[serde(default = "default_huber_d")]
        d: f64,
    },
    L1EpsilonIns {
        eps: f64,
    },
    L2EpsilonIns {
        eps: f64,
    },
    Periodic {
        c: f64,
    },
    Quantile {
        tau: f64,
    },
    ZeroOne,
    Perceptron,
    L1Hinge,
    L2Hinge,
    SmoothedL1Hinge {
        gamma: f64,
    },
    ModifiedHuber,
    DwdMargin {
        q: f64,
    },
    L2Margin,
    LogitMargin,
    Exp,
    Sigmoid,
}

impl LossConfig {
    /// Builds the loss, validating parameters through the regular
    /// constructors.
    pub fn build(&self) -> LossResult<Loss> {
        let loss: Loss = match *self {
            LossConfig::L1Dist => L1DistLoss.into(),
            LossConfig::L2Dist => L2DistLoss.into(),
            LossConfig::LpDist { p } => LPDistLoss::new(p)?.into(),
            LossConfig::LogitDist => LogitDistLoss.into(),
            LossConfig::Huber { d } => HuberLoss::new(d)?.into(),
            LossConfig::L1EpsilonIns { eps } => L1EpsilonInsLoss::new(eps)?.into(),
            LossConfig::L2EpsilonIns { eps } => L2EpsilonInsLoss::new(eps)?.into(),
            LossConfig::Periodic { c } => PeriodicLoss::new(c)?.into(),
            LossConfig::Quantile { tau } => QuantileLoss::new(tau)?.into(),
            LossConfig::ZeroOne => ZeroOneLoss.into(),
            LossConfig::Perceptron => PerceptronLoss.into(),
            LossConfig::L1Hinge => L1HingeLoss.into(),
            LossConfig::L2Hinge => L2HingeLoss.into(),
            LossConfig::SmoothedL1Hinge { gamma } => SmoothedL1HingeLoss::new(gamma)?.into(),
            LossConfig::ModifiedHuber => ModifiedHuberLoss.into(),
            LossConfig::DwdMargin { q } => DWDMarginLoss::new(q)?.into(),
            LossConfig::L2Margin => L2MarginLoss.into(),
            LossConfig::LogitMargin => LogitMarginLoss.into(),
            LossConfig::Exp => ExpLoss.into(),
            LossConfig::Sigmoid => SigmoidLoss.into(),
        };
        debug!(loss = loss.name(), "built loss from config");
        Ok(loss)
    }
}

/// A catalog loss plus optional decorators.
///
/// `class_weight` reweights the classes of a margin-based loss; `scale`
/// multiplies the (possibly reweighted) result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossSpec {
    pub loss: LossConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_weight: Option<f64>,
}

impl LossSpec {
    pub fn new(loss: LossConfig) -> Self {
        Self {
            loss,
            scale: None,
            class_weight: None,
        }
    }

    pub fn with_scale(mut self, k: f64) -> Self {
        self.scale = Some(k);
        self
    }

    pub fn with_class_weight(mut self, w: f64) -> Self {
        self.class_weight = Some(w);
        self
    }

    pub fn from_json(text: &str) -> LossResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> LossResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn build(&self) -> LossResult<ConfiguredLoss> {
        let base = self.loss.build()?;
        let built = match (self.class_weight, self.scale) {
            (None, None) => ConfiguredLoss::Plain(base),
            (None, Some(k)) => ConfiguredLoss::Scaled(Scaled::new(base, k)?),
            (Some(w), None) => ConfiguredLoss::Weighted(Weighted::new(base, w)?),
            (Some(w), Some(k)) => {
                ConfiguredLoss::ScaledWeighted(Scaled::new(Weighted::new(base, w)?, k)?)
            }
        };
        debug!(spec = ?self, "built configured loss");
        Ok(built)
    }
}

impl From<LossConfig> for LossSpec {
    fn from(loss: LossConfig) -> Self {
        LossSpec::new(loss)
    }
}

/// Result of [`LossSpec::build`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredLoss {
    Plain(Loss),
    Scaled(Scaled<Loss>),
    Weighted(Weighted<Loss>),
    ScaledWeighted(Scaled<Weighted<Loss>>),
}

macro_rules! configured {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            ConfiguredLoss::Plain($inner) => $body,
            ConfiguredLoss::Scaled($inner) => $body,
            ConfiguredLoss::Weighted($inner) => $body,
            ConfiguredLoss::ScaledWeighted($inner) => $body,
        }
    };
}

impl SupervisedLoss for ConfiguredLoss {
    fn name(&self) -> &'static str {
        configured!(self, l => l.name())
    }

    fn family(&self) -> LossFamily {
        configured!(self, l => l.family())
    }

    #[inline]
    fn value<T: LossFloat>(&self, target: T, output: T) -> T {
        configured!(self, l => l.value(target, output))
    }

    #[inline]
    fn deriv<T: LossFloat>(&self, target: T, output: T) -> T {
        configured!(self, l => l.deriv(target, output))
    }

    #[inline]
    fn deriv2<T: LossFloat>(&self, target: T, output: T) -> T {
        configured!(self, l => l.deriv2(target, output))
    }

    #[inline]
    fn value_deriv<T: LossFloat>(&self, target: T, output: T) -> (T, T) {
        configured!(self, l => l.value_deriv(target, output))
    }

    fn properties(&self) -> Properties {
        configured!(self, l => l.properties())
    }

    fn is_differentiable_at(&self, at: f64) -> bool {
        configured!(self, l => l.is_differentiable_at(at))
    }

    fn is_twice_differentiable_at(&self, at: f64) -> bool {
        configured!(self, l => l.is_twice_differentiable_at(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LossError;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_plain_loss() {
        let spec = LossSpec::from_json(r#"{"loss": {"kind": "l2_dist"}}"#).unwrap();
        assert_eq!(spec, LossSpec::new(LossConfig::L2Dist));
        let loss = spec.build().unwrap();
        assert_eq!(loss, ConfiguredLoss::Plain(Loss::L2Dist(L2DistLoss)));
        assert_eq!(loss.value(1.0, 3.0), 4.0);
    }

    #[test]
    fn test_huber_defaults_its_threshold() {
        let spec = LossSpec::from_json(r#"{"loss": {"kind": "huber"}}"#).unwrap();
        assert_eq!(spec.loss, LossConfig::Huber { d: 1.0 });
    }

    #[test]
    fn test_scaled_and_weighted_spec() {
        let text = r#"{"loss": {"kind": "l1_hinge"}, "scale": 2.0, "class_weight": 0.8}"#;
        let loss = LossSpec::from_json(text).unwrap().build().unwrap();
        assert!(matches!(loss, ConfiguredLoss::ScaledWeighted(_)));
        // 2 * 0.8 * max(0, 1 - (-4))
        assert_relative_eq!(loss.value(1.0, -4.0), 8.0, max_relative = 1e-12);
        assert!(!loss.is_margin_based());
    }

    #[test]
    fn test_spec_round_trips_through_json() {
        let spec = LossSpec::new(LossConfig::Quantile { tau: 0.3 }).with_scale(0.5);
        let text = spec.to_json().unwrap();
        assert!(text.contains(r#""kind":"quantile""#));
        assert!(!text.contains("class_weight"));
        assert_eq!(LossSpec::from_json(&text).unwrap(), spec);
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        let unknown = LossSpec::from_json(r#"{"loss": {"kind": "cross_entropy"}}"#);
        assert!(matches!(unknown, Err(LossError::Config(_))));

        let missing = LossSpec::from_json(r#"{"loss": {"kind": "quantile"}}"#);
        assert!(matches!(missing, Err(LossError::Config(_))));

        let bad_param = LossSpec::new(LossConfig::Quantile { tau: 1.5 }).build();
        assert!(matches!(bad_param, Err(LossError::InvalidParameter { param: "tau", .. })));

        let not_margin = LossSpec::new(LossConfig::L2Dist).with_class_weight(0.3).build();
        assert!(matches!(not_margin, Err(LossError::NotMarginBased { .. })));
    }

    #[test]
    fn test_every_config_kind_builds() {
        for loss in Loss::catalog().unwrap() {
            let spec = LossSpec::from(loss.to_config());
            let json = spec.to_json().unwrap();
            let built = LossSpec::from_json(&json).unwrap().build().unwrap();
            assert_eq!(built, ConfiguredLoss::Plain(loss));
        }
    }
}
