pub mod number;

mod tests;

pub use number::Accumulate;
pub use number::LossFloat;
pub use number::Promote;
