// src/error.rs
// Error taxonomy shared by loss construction, evaluation and configuration

/// Convenience alias used across the crate.
pub type LossResult<T> = Result<T, LossError>;

/// Every way a construction or evaluation call can be rejected.
///
/// Evaluation never returns a sentinel number on failure: contract
/// violations are detected before the first element is computed and
/// reported through this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LossError {
    /// A shape parameter is outside the domain of its loss family.
    #[error("{loss}: parameter `{param}` must be {expected}, got {value}")]
    InvalidParameter {
        loss: &'static str,
        param: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Class reweighting was requested for a loss that is not margin-based.
    #[error("{loss} is not margin-based and cannot be class-weighted")]
    NotMarginBased { loss: String },

    /// Targets and outputs cannot be broadcast together.
    #[error("shapes {left:?} and {right:?} cannot be broadcast together")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// A caller-supplied buffer does not have the required shape.
    #[error("buffer has shape {found:?}, expected {expected:?}")]
    BufferShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// The weight vector does not match the number of observations.
    #[error("got {found} weights for {expected} observations")]
    WeightLength { expected: usize, found: usize },

    /// A weight is negative or NaN.
    #[error("weights must be non-negative, found {value} at index {index}")]
    InvalidWeights { index: usize, value: f64 },

    /// Per-observation reduction needs a secondary axis to reduce over.
    #[error("per-observation reduction needs rank >= {required}, got rank {rank}")]
    RankTooLow { rank: usize, required: usize },

    /// The observation axis does not exist in the broadcast shape.
    #[error("observation axis {axis} is out of bounds for rank {ndim}")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    /// Weighted aggregation of a rank >= 2 array needs an observation axis.
    #[error("weighted aggregation over rank {ndim} arrays requires an observation axis")]
    AxisRequired { ndim: usize },

    /// The aggregate mode cannot be used with this operation.
    #[error("aggregate mode {mode} is not supported by {operation}")]
    UnsupportedMode {
        mode: &'static str,
        operation: &'static str,
    },

    /// A configuration document could not be parsed.
    #[error("invalid loss configuration: {0}")]
    Config(String),
}

impl LossError {
    pub(crate) fn invalid_param(
        loss: &'static str,
        param: &'static str,
        value: f64,
        expected: &'static str,
    ) -> Self {
        LossError::InvalidParameter {
            loss,
            param,
            value,
            expected,
        }
    }
}

impl From<serde_json::Error> for LossError {
    fn from(err: serde_json::Error) -> Self {
        LossError::Config(err.to_string())
    }
}
