// src/backend/number.rs

use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::{AddAssign, MulAssign};

/// Base trait for every element type a loss can be evaluated in.
///
/// Only `f32` and `f64` implement it. Integer inputs are accepted at the API
/// boundary through [`Promote`], but evaluation itself always happens in one
/// of these two float types.
pub trait LossFloat:
    // Transcendental functions, comparisons and constants
    Float + FromPrimitive +
    // Accumulation
    Sum<Self> + AddAssign + MulAssign + Accumulate<Scalar = Self> +
    // Essential traits
    Debug + Display + Default + Send + Sync + 'static
{
    /// Narrows a shape parameter into the evaluation precision.
    ///
    /// Parameters are stored as `f64`, so an `f32` evaluation stays `f32`
    /// no matter how the parameter was written.
    fn from_param(value: f64) -> Self;

    /// Widens the value to `f64` for reporting.
    fn to_param(self) -> f64;
}

impl LossFloat for f64 {
    #[inline]
    fn from_param(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_param(self) -> f64 {
        self
    }
}

impl LossFloat for f32 {
    #[inline]
    fn from_param(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_param(self) -> f64 {
        self as f64
    }
}

// ============= ACCUMULATION =============

/// Running total used by the aggregation engine.
///
/// Implemented for single scalars and for `(value, deriv)` pairs so that a
/// combined reduction still walks the data exactly once.
pub trait Accumulate: Copy {
    /// Scalar type of the scale factors applied to the accumulator
    type Scalar: Copy;

    /// Neutral element for `combine`
    fn identity() -> Self;

    /// Adds another partial result
    fn combine(self, other: Self) -> Self;

    /// Multiplies every component by `k`
    fn scale(self, k: Self::Scalar) -> Self;
}

macro_rules! impl_accumulate_scalar {
    ($($t:ty),*) => {
        $(
            impl Accumulate for $t {
                type Scalar = $t;

                #[inline(always)]
                fn identity() -> Self {
                    0.0
                }

                #[inline(always)]
                fn combine(self, other: Self) -> Self {
                    self + other
                }

                #[inline(always)]
                fn scale(self, k: Self) -> Self {
                    self * k
                }
            }
        )*
    };
}

impl_accumulate_scalar!(f32, f64);

impl<T: LossFloat> Accumulate for (T, T) {
    type Scalar = T;

    #[inline(always)]
    fn identity() -> Self {
        (T::zero(), T::zero())
    }

    #[inline(always)]
    fn combine(self, other: Self) -> Self {
        (self.0 + other.0, self.1 + other.1)
    }

    #[inline(always)]
    fn scale(self, k: T) -> Self {
        (self.0 * k, self.1 * k)
    }
}

// ============= PROMOTION =============

/// Numeric promotion of a `(target, output)` pair.
///
/// The result type is the precision the arithmetic `target op output` would
/// have: `f32` with `f32` stays `f32`, anything paired with `f64` becomes
/// `f64`, integers adopt the float they meet, and two integers evaluate in
/// `f64`.
pub trait Promote<Rhs = Self>: Copy {
    /// Float type the pair is evaluated in
    type Output: LossFloat;

    /// Converts both operands into the promoted type
    fn promote(self, rhs: Rhs) -> (Self::Output, Self::Output);
}

macro_rules! impl_promote {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {
        $(
            impl Promote<$rhs> for $lhs {
                type Output = $out;

                #[inline(always)]
                fn promote(self, rhs: $rhs) -> ($out, $out) {
                    (self as $out, rhs as $out)
                }
            }
        )*
    };
}

impl_promote! {
    f32, f32 => f32;
    f64, f64 => f64;
    f32, f64 => f64;
    f64, f32 => f64;
    i32, f32 => f32;
    f32, i32 => f32;
    i64, f32 => f32;
    f32, i64 => f32;
    i32, f64 => f64;
    f64, i32 => f64;
    i64, f64 => f64;
    f64, i64 => f64;
    i32, i32 => f64;
    i64, i64 => f64;
    i32, i64 => f64;
    i64, i32 => f64;
}
