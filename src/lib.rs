//! # Ferroloss
//!
//! Ferroloss is a small evaluation engine for supervised loss functions written in Rust,
//! modelled on the loss families of statistical learning theory.
//!
//! ## Features
//!
//! - Distance-based losses for regression and margin-based losses for binary classification
//! - Value, first and second derivative of every loss, plus a fused value-and-derivative
//! - Mathematical property queries (convexity, Lipschitz continuity, calibration, ...)
//! - Element-wise evaluation over `ndarray` arrays with shape broadcasting
//! - Sum, mean and weighted aggregation, whole-array or per observation, without temporaries
//! - Scaling and class-reweighting decorators resolved at compile time
//! - Serde-backed loss configuration
//!
//! ```
//! use ferroloss::{AggMode, L2DistLoss, LossExt, SupervisedLoss};
//! use ndarray::array;
//!
//! let targets = array![1.0, 0.0, -2.0];
//! let outputs = array![0.5, 2.0, -1.0];
//!
//! assert_eq!(L2DistLoss.value(1.0, 0.5), 0.25);
//! let total = L2DistLoss.value_agg(&targets, &outputs, AggMode::Sum).unwrap();
//! assert_eq!(total, 5.25);
//! ```
pub mod backend;
pub mod config;
pub mod error;
pub mod eval;
pub mod losses;
pub mod ops;

// Re-export commonly used types for convenience
pub use backend::{LossFloat, Promote};
pub use config::{ConfiguredLoss, LossConfig, LossSpec};
pub use error::{LossError, LossResult};
pub use eval::LossExt;
pub use losses::{
    DWDMarginLoss, EpsilonInsLoss, ExpLoss, HingeLoss, HuberLoss, L1DistLoss, L1EpsilonInsLoss,
    L1HingeLoss, L2DistLoss, L2EpsilonInsLoss, L2HingeLoss, L2MarginLoss, LPDistLoss,
    LeastSquaresLoss, LogitDistLoss, LogitMarginLoss, Loss, LossFamily, ModifiedHuberLoss,
    PerceptronLoss, PeriodicLoss, Properties, QuantileLoss, Scaled, SigmoidLoss,
    SmoothedL1HingeLoss, SupervisedLoss, Weighted, ZeroOneLoss, least_squares, scaled, weighted,
};
pub use losses::{DistanceLoss, MarginLoss};
pub use ops::{AggMode, ObsAxis};
