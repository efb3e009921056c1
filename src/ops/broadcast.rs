// src/ops/broadcast.rs
// Shape broadcasting shared by every array operation

use crate::error::{LossError, LossResult};
use ndarray::{ArrayBase, ArrayViewD, Data, Dimension};
use tracing::{debug, trace};

/// Which array dimension indexes the observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObsAxis {
    /// The leading dimension, one observation per row
    First,
    /// The trailing dimension, one observation per column
    #[default]
    Last,
    /// An explicit dimension index
    Index(usize),
}

impl ObsAxis {
    /// Resolves the axis against an array rank.
    pub fn resolve(self, ndim: usize) -> LossResult<usize> {
        let axis = match self {
            ObsAxis::First => 0,
            ObsAxis::Last => ndim.saturating_sub(1),
            ObsAxis::Index(i) => i,
        };
        if axis >= ndim {
            return Err(LossError::AxisOutOfBounds { axis, ndim });
        }
        Ok(axis)
    }
}

/// Common shape of a `(targets, outputs)` pair, computed once per call.
///
/// Dimensions are aligned from the trailing end; each pair of extents must be
/// equal or one of them must be 1, and missing leading dimensions count as 1.
/// Inputs are then iterated through zero-stride views of this shape, so a
/// broadcast operand is never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPlan {
    shape: Vec<usize>,
}

impl BroadcastPlan {
    pub fn new(left: &[usize], right: &[usize]) -> LossResult<Self> {
        let ndim = left.len().max(right.len());
        let mut shape = vec![1; ndim];

        for k in 0..ndim {
            let l = extent_from_end(left, k);
            let r = extent_from_end(right, k);
            shape[ndim - 1 - k] = match (l, r) {
                (l, r) if l == r => l,
                (1, r) => r,
                (l, 1) => l,
                _ => {
                    debug!(?left, ?right, "shapes are not broadcast compatible");
                    return Err(LossError::ShapeMismatch {
                        left: left.to_vec(),
                        right: right.to_vec(),
                    });
                }
            };
        }

        trace!(?shape, "broadcast plan");
        Ok(Self { shape })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements in the broadcast index space
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-stride view of `array` stretched to the plan's shape.
    pub fn broadcast<'a, A, S, D>(&self, array: &'a ArrayBase<S, D>) -> LossResult<ArrayViewD<'a, A>>
    where
        S: Data<Elem = A>,
        D: Dimension,
    {
        array
            .broadcast(self.shape.as_slice())
            .ok_or_else(|| LossError::ShapeMismatch {
                left: array.shape().to_vec(),
                right: self.shape.clone(),
            })
    }

    /// Caller buffers must match the broadcast shape exactly.
    pub fn check_buffer(&self, found: &[usize]) -> LossResult<()> {
        if found != self.shape.as_slice() {
            debug!(expected = ?self.shape, ?found, "rejected output buffer");
            return Err(LossError::BufferShape {
                expected: self.shape.clone(),
                found: found.to_vec(),
            });
        }
        Ok(())
    }

    /// Resolves an observation axis against the broadcast rank.
    pub fn obs_axis(&self, axis: ObsAxis) -> LossResult<usize> {
        axis.resolve(self.ndim())
    }

    /// Product of every extent except the observation axis
    pub(crate) fn inner_len(&self, axis: usize) -> usize {
        self.shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != axis)
            .map(|(_, &n)| n)
            .product()
    }
}

#[inline]
fn extent_from_end(shape: &[usize], k: usize) -> usize {
    if k < shape.len() {
        shape[shape.len() - 1 - k]
    } else {
        1
    }
}
