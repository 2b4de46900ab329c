//! Defines tensor errors.

use thiserror::Error;

/// An error type for all operations on tensors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TensorError {
    /// An operation was performed on 2 objects with incompatible shapes.
    #[error("incompatible shapes {0:?} and {1:?}")]
    IncompatibleShapes(Vec<usize>, Vec<usize>),

    /// An operation was performed with an axis that does not exist.
    #[error("unknown axis {axis} for a tensor of rank {rank}")]
    UnknownAxis {
        /// The requested axis.
        axis: usize,
        /// The rank of the tensor.
        rank: usize,
    },

    /// The given axes do not form a permutation of the tensor's axes.
    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),

    /// The number of elements does not match the number implied by the shape.
    #[error("unexpected element count (want {want}, but got {got})")]
    ElementCount {
        /// Elements implied by the shape.
        want: usize,
        /// Elements that were given.
        got: usize,
    },

    /// A range along an axis is out of bounds.
    #[error("range {start}..{end} is out of bounds for an axis of size {size}")]
    OutOfRange {
        /// First index of the range.
        start: usize,
        /// One past the last index of the range.
        end: usize,
        /// Size of the axis.
        size: usize,
    },

    /// Concatenation was requested without any tensor.
    #[error("cannot concatenate an empty list of tensors")]
    EmptyConcat,

    /// A shape contains an axis of size zero.
    #[error("shape {0:?} contains a zero-sized axis")]
    ZeroSized(Vec<usize>),
}
