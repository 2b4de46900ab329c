//! An N-dimensional array.

use std::{
    fmt,
    marker::PhantomData,
    num::NonZeroUsize,
    ops::{Add, Div, Mul, Sub},
};

pub mod cpu;
pub mod dtype;
pub mod error;
pub mod ops;

use self::{
    dtype::{Elem, Float, Num},
    error::TensorError,
    ops::{ToCpu, LL},
};

/// Create a shape from axis sizes known at compile time.
///
/// # Panics
///
/// Panics if one of the sizes is zero.
#[must_use]
pub fn shape<const N: usize>(dims: [usize; N]) -> [NonZeroUsize; N] {
    dims.map(|d| NonZeroUsize::new(d).expect("axis sizes must be non-zero"))
}

/// Create a shape from axis sizes known at run time.
///
/// # Errors
///
/// Returns an error if one of the sizes is zero.
pub fn try_shape(dims: &[usize]) -> Result<Vec<NonZeroUsize>, TensorError> {
    dims.iter()
        .map(|&d| NonZeroUsize::new(d))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| TensorError::ZeroSized(dims.to_vec()))
}

pub(crate) fn dims(shape: &[NonZeroUsize]) -> Vec<usize> {
    shape.iter().map(|d| d.get()).collect()
}

/// A high-level tensor representation.
///
/// All methods on this struct are delegated to those in [`LL`], enabling support for multiple
/// hardwares. For convinience, binary operations are broadcasted by default, and traits from
/// [`std`] are implemented to overloads common operations for a numeric/container type.
pub struct Tensor<E, Ops = cpu::TensorOps>
where
    Ops: LL,
{
    raw: Ops::Repr<E>,
    _marker: PhantomData<(E, Ops)>,
}

impl<E, Ops> Clone for Tensor<E, Ops>
where
    Ops: LL,
{
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<E, Ops> fmt::Debug for Tensor<E, Ops>
where
    Ops: LL,
    Ops::Repr<E>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor").field("raw", &self.raw).finish()
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident) => {
        impl<E, Ops> $trait<Self> for &Tensor<E, Ops>
        where
            E: Num,
            Ops: LL,
        {
            type Output = Tensor<E, Ops>;

            fn $method(self, other: Self) -> Self::Output {
                Tensor::$method(self, other).expect("tensors can be broadcasted")
            }
        }
    };
}

impl_binary_operator!(Add, add);
impl_binary_operator!(Sub, sub);
impl_binary_operator!(Mul, mul);
impl_binary_operator!(Div, div);

impl<E, Ops> Tensor<E, Ops>
where
    Ops: LL,
{
    fn from_raw(raw: Ops::Repr<E>) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Create a tensor given its shape and data.
    ///
    /// The order of the elements in `data` is in increasing order of the last axis, then the second
    /// last, and so on.
    pub fn new(shape: &[NonZeroUsize], data: &[E]) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        Ops::new(shape, data).map(Self::from_raw)
    }

    /// Create a scalar holding the given value.
    ///
    /// This is a special tensor that has no shape.
    pub fn scalar(value: E) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        Self::new(&[], &[value])
    }

    /// Create a tensor given its shape filled with a single value.
    pub fn fill(shape: &[NonZeroUsize], value: E) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        let tensor = Self::new(&vec![NonZeroUsize::MIN; shape.len()], &[value])?;
        tensor.expand(shape)
    }

    /// Create a tensor given its shape filled with zeros.
    pub fn zeros(shape: &[NonZeroUsize]) -> Result<Self, TensorError>
    where
        E: Num,
    {
        Self::fill(shape, E::zero())
    }

    /// Return the shape of the tensor.
    pub fn shape(&self) -> &[NonZeroUsize] {
        Ops::shape::<E>(&self.raw)
    }

    /// Return the shape of the tensor as plain sizes.
    pub fn dims(&self) -> Vec<usize> {
        dims(self.shape())
    }

    /// Return the number of axes of the tensor.
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Apply exp to each element.
    #[must_use]
    pub fn exp(&self) -> Self
    where
        E: Float,
    {
        Self::from_raw(Ops::exp::<E>(&self.raw))
    }

    /// Apply the natural logarithm to each element.
    #[must_use]
    pub fn ln(&self) -> Self
    where
        E: Float,
    {
        Self::from_raw(Ops::ln::<E>(&self.raw))
    }

    /// Apply the hyperbolic tangent to each element.
    #[must_use]
    pub fn tanh(&self) -> Self
    where
        E: Float,
    {
        Self::from_raw(Ops::tanh::<E>(&self.raw))
    }

    /// Apply the logistic function to each element.
    ///
    /// Computed as `(tanh(x / 2) + 1) / 2`, which doesn't overflow for large negative inputs.
    pub fn sigmoid(&self) -> Result<Self, TensorError>
    where
        E: Float,
    {
        let half = Self::scalar(E::from_f64(0.5))?;
        self.mul(&half)?.tanh().mul(&half)?.add(&half)
    }

    /// Apply the leaky rectifier `max(x, slope * x)` to each element. `slope` must be in `[0, 1]`.
    pub fn leaky_relu(&self, slope: E) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.maximum(&self.mul(&Self::scalar(slope)?)?)
    }

    /// Add `other` to `self`, element-wise.
    ///
    /// The tensors are broadcasted to the same shape before adding if necessary.
    pub fn add(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.broadcast(other, Ops::add::<E>)
    }

    /// Subtract `other` from `self`, element-wise.
    ///
    /// The tensors are broadcasted to the same shape before subtracting if necessary.
    pub fn sub(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.broadcast(other, Ops::sub::<E>)
    }

    /// Multiply `self` by `other`, element-wise.
    ///
    /// The tensors are broadcasted to the same shape before multiplying if necessary.
    pub fn mul(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.broadcast(other, Ops::mul::<E>)
    }

    /// Divide `self` by `other`, element-wise.
    ///
    /// The tensors are broadcasted to the same shape before dividing if necessary.
    pub fn div(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.broadcast(other, Ops::div::<E>)
    }

    /// Take the larger of `self` and `other`, element-wise.
    ///
    /// The tensors are broadcasted to the same shape before comparing if necessary.
    pub fn maximum(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        self.broadcast(other, Ops::maximum::<E>)
    }

    /// Reduce along the given axes by summing all elements.
    pub fn sum(&self, axes: &[usize]) -> Result<Self, TensorError>
    where
        E: Num,
    {
        Ops::sum::<E>(&self.raw, axes).map(Self::from_raw)
    }

    /// Reshape the tensor to the given shape, keeping the number of elements unchanged.
    pub fn reshape(&self, shape: &[NonZeroUsize]) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        Ops::reshape::<E>(&self.raw, shape).map(Self::from_raw)
    }

    /// Permute the tensor axes according to the given permutation.
    pub fn permute(&self, permutation: &[usize]) -> Result<Self, TensorError> {
        Ops::permute::<E>(&self.raw, permutation).map(Self::from_raw)
    }

    /// Expand singleton axes in a tensor to a larger size.
    pub fn expand(&self, shape: &[NonZeroUsize]) -> Result<Self, TensorError> {
        Ops::expand::<E>(&self.raw, shape).map(Self::from_raw)
    }

    /// Swaps 2 dimensions of the tensor without cloning its data.
    pub fn transpose(&self, axis0: usize, axis1: usize) -> Result<Self, TensorError> {
        let rank = self.rank();
        if let Some(&axis) = [axis0, axis1].iter().find(|&&axis| axis >= rank) {
            return Err(TensorError::UnknownAxis { axis, rank });
        }
        let mut permutation: Vec<_> = (0..rank).collect();
        permutation.swap(axis0, axis1);
        self.permute(&permutation)
    }

    /// Select `len` consecutive entries along `axis` starting at `start`, without cloning data.
    pub fn narrow(&self, axis: usize, start: usize, len: usize) -> Result<Self, TensorError> {
        let Some(len) = NonZeroUsize::new(len) else {
            let mut dims = self.dims();
            if let Some(size) = dims.get_mut(axis) {
                *size = 0;
            }
            return Err(TensorError::ZeroSized(dims));
        };
        Ops::narrow::<E>(&self.raw, axis, start, len).map(Self::from_raw)
    }

    /// Concatenate tensors along `axis`. All other axes must have the same size.
    pub fn cat(tensors: &[&Self], axis: usize) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        let raws: Vec<_> = tensors.iter().map(|t| &t.raw).collect();
        Ops::cat::<E>(&raws, axis).map(Self::from_raw)
    }

    /// Pad `axis` with `before` entries at the start and `after` entries at the end, all set to
    /// `value`.
    pub fn pad(&self, axis: usize, before: usize, after: usize, value: E) -> Result<Self, TensorError>
    where
        E: Elem,
    {
        let rank = self.rank();
        if axis >= rank {
            return Err(TensorError::UnknownAxis { axis, rank });
        }
        let padding = |size: usize| -> Result<Option<Self>, TensorError> {
            let Some(size) = NonZeroUsize::new(size) else {
                return Ok(None);
            };
            let mut shape = self.shape().to_vec();
            shape[axis] = size;
            Self::fill(&shape, value.clone()).map(Some)
        };
        let head = padding(before)?;
        let tail = padding(after)?;
        let parts: Vec<&Self> = head.iter().chain([self]).chain(tail.iter()).collect();
        Self::cat(&parts, axis)
    }

    /// Matrix product of two arrays.
    ///
    /// The behavior depends on the arguments in the following ways:
    /// + If both arguments are 2-D they are multiplied like conventional matrices.
    /// + If either argument is N-D, N > 2, it is treated as a stack of matrices residing in the last
    ///   two indexes and broadcast accordingly.
    /// + If the first argument is 1-D, it is promoted to a matrix by prepending a 1 to its axes.
    ///   After matrix multiplication the prepended 1 is removed.
    /// + If the second argument is 1-D, it is promoted to a matrix by appending a 1 to its axes.
    ///   After matrix multiplication the appended 1 is removed.
    pub fn matmul(&self, other: &Self) -> Result<Self, TensorError>
    where
        E: Num,
    {
        let incompatible = || TensorError::IncompatibleShapes(self.dims(), other.dims());
        let mut lhs_shape = self.shape().to_vec();
        let mut rhs_shape = other.shape().to_vec();
        let orig_lhs_rank = lhs_shape.len();
        let orig_rhs_rank = rhs_shape.len();
        // Can't do matrix multiplication with scalars
        if orig_lhs_rank == 0 || orig_rhs_rank == 0 {
            return Err(incompatible());
        }
        // If the LHS shape is (k), make it (1, k)
        if orig_lhs_rank == 1 {
            lhs_shape.insert(0, NonZeroUsize::MIN);
        }
        // If the RHS shape is (k), make it (k, 1)
        if orig_rhs_rank == 1 {
            rhs_shape.push(NonZeroUsize::MIN);
        }
        // The last axis of the LHS must match the second-to-last axis of the RHS
        if lhs_shape[lhs_shape.len() - 1] != rhs_shape[rhs_shape.len() - 2] {
            return Err(incompatible());
        }
        // Turn (..., m, k) into (..., m, 1, k)
        lhs_shape.insert(lhs_shape.len() - 1, NonZeroUsize::MIN);
        // Turn (..., k, n) into (..., 1, k, n)
        rhs_shape.insert(rhs_shape.len() - 2, NonZeroUsize::MIN);
        // Multiply (..., m, 1, k) with (..., 1, n, k) to get (..., m, n, k)
        let lhs = self.reshape(&lhs_shape)?;
        let rhs = other.reshape(&rhs_shape)?;
        let rhs_rank = rhs_shape.len();
        let mul = lhs.mul(&rhs.transpose(rhs_rank - 1, rhs_rank - 2)?)?;
        // Sum the last axis to get (..., m, n, 1)
        let sum = mul.sum(&[mul.rank() - 1])?;
        // Remove last axis
        let mut shape = {
            let s = sum.shape();
            s[..s.len() - 1].to_vec()
        };
        // Remove prepended axis if necessary
        if orig_lhs_rank == 1 {
            shape.remove(shape.len() - 2);
        }
        // Remove appended axis if necessary
        if orig_rhs_rank == 1 {
            shape.remove(shape.len() - 1);
        }
        sum.reshape(&shape)
    }

    fn broadcast<F>(&self, other: &Self, op: F) -> Result<Self, TensorError>
    where
        F: Fn(&Ops::Repr<E>, &Ops::Repr<E>) -> Result<Ops::Repr<E>, TensorError>,
    {
        let lhs_shape = self.shape();
        let rhs_shape = other.shape();
        if lhs_shape == rhs_shape {
            return op(&self.raw, &other.raw).map(Self::from_raw);
        }
        // Determine which shape has more dimensions.
        let (small, large) = if lhs_shape.len() < rhs_shape.len() {
            (lhs_shape, rhs_shape)
        } else {
            (rhs_shape, lhs_shape)
        };
        // Zipping the 2 shapes in reverse order while filling in 1 for the missing dimensions.
        let mut broadcasted_shape = large.to_vec();
        for dim in 0..small.len() {
            let sm_idx = small.len() - dim - 1;
            let lg_idx = large.len() - dim - 1;
            let sm_size = small[sm_idx];
            let lg_size = large[lg_idx];
            if sm_size == lg_size || sm_size == NonZeroUsize::MIN {
                continue;
            }
            if lg_size == NonZeroUsize::MIN {
                broadcasted_shape[lg_idx] = sm_size;
            } else {
                return Err(TensorError::IncompatibleShapes(self.dims(), other.dims()));
            }
        }
        // Expand the tensors to the same shape and apply the operation to the expanded versions.
        let lhs = Ops::expand::<E>(&self.raw, &broadcasted_shape)?;
        let rhs = Ops::expand::<E>(&other.raw, &broadcasted_shape)?;
        op(&lhs, &rhs).map(Self::from_raw)
    }
}

impl<E, Ops> Tensor<E, Ops>
where
    Ops: ToCpu,
{
    /// Collect all elements of the tensor into a [`Vec`].
    pub fn ravel(&self) -> Vec<E>
    where
        E: Clone,
    {
        Ops::to_cpu::<E>(&self.raw).ravel()
    }
}
