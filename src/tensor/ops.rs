//! Traits defining the operations a tensor backend must provide.

use std::num::NonZeroUsize;

use crate::tensor::{
    cpu,
    dtype::{Elem, Float, Num},
    error::TensorError,
};

/// Low-level tensor operations that must be suppported by the hardware.
///
/// Functions in this trait are considered low-level operations that must be supported by the
/// hardware on which a tensor is used. Higher-level operations in [`crate::tensor::Tensor`] are
/// translated to these operations in order to be used across all hardwares for which [`LL`] is
/// implemented, so the set should be kept small.
///
/// Binary element-wise operations expect both operands to have the same shape. Broadcasting is
/// done by the caller through [`LL::expand`].
pub trait LL {
    /// Representation of a tensor parameterized by its element type `E`.
    type Repr<E>: Clone;

    /// Create a new tensor with the given shape and data.
    ///
    /// The order of the elements in `data` is in increasing order of the last axis, then the second
    /// last, and so on.
    fn new<E>(shape: &[NonZeroUsize], data: &[E]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem;

    /// Return the shape of the tensor.
    fn shape<E>(t: &Self::Repr<E>) -> &[NonZeroUsize];

    /// Apply exp to each element.
    fn exp<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float;

    /// Apply the natural logarithm to each element.
    fn ln<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float;

    /// Apply the hyperbolic tangent to each element.
    fn tanh<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float;

    /// Add `rhs` to `lhs`, element-wise.
    fn add<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Subtract `rhs` from `lhs`, element-wise.
    fn sub<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Multiply `lhs` by `rhs`, element-wise.
    fn mul<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Divide `lhs` by `rhs`, element-wise.
    fn div<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Take the larger of `lhs` and `rhs`, element-wise.
    fn maximum<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Reduce along the given axes by summing all elements. Reduced axes are kept with size 1.
    fn sum<E>(t: &Self::Repr<E>, axes: &[usize]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num;

    /// Reshape the tensor to the given shape, keeping the number of elements unchanged.
    fn reshape<E>(t: &Self::Repr<E>, shape: &[NonZeroUsize]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem;

    /// Permute the tensor axes according to the given permutation.
    fn permute<E>(t: &Self::Repr<E>, permutation: &[usize]) -> Result<Self::Repr<E>, TensorError>;

    /// Expand singleton axes in a tensor to a larger size.
    ///
    /// New axes can be prepended when the target shape has a higher rank.
    fn expand<E>(t: &Self::Repr<E>, shape: &[NonZeroUsize]) -> Result<Self::Repr<E>, TensorError>;

    /// Select `len` consecutive entries along `axis`, starting at `start`.
    fn narrow<E>(
        t: &Self::Repr<E>,
        axis: usize,
        start: usize,
        len: NonZeroUsize,
    ) -> Result<Self::Repr<E>, TensorError>;

    /// Concatenate tensors along `axis`. All other axes must have the same size.
    fn cat<E>(ts: &[&Self::Repr<E>], axis: usize) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem;
}

/// Tensor that supports converting itself into a representation on the CPU.
pub trait ToCpu: LL {
    /// Return a clone of the tensor on the CPU.
    fn to_cpu<E>(t: &Self::Repr<E>) -> cpu::Tensor<E>;
}
