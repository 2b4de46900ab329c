//! Low-level tensor operations and representation on the CPU.

use std::{iter, num::NonZeroUsize, sync::Arc};

use crate::tensor::{
    dims,
    dtype::{Elem, Float, Num},
    error::TensorError,
    ops::{ToCpu, LL},
};

/// Low-level tensor operations on the CPU.
#[derive(Debug)]
pub struct TensorOps;

impl LL for TensorOps {
    type Repr<E> = Tensor<E>;

    fn new<E>(shape: &[NonZeroUsize], data: &[E]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem,
    {
        let layout = Layout::from(shape);
        let want = layout.capacity().get();
        if want != data.len() {
            return Err(TensorError::ElementCount {
                want,
                got: data.len(),
            });
        }
        Ok(Tensor {
            buffer: Arc::from(data),
            layout,
        })
    }

    fn shape<E>(t: &Self::Repr<E>) -> &[NonZeroUsize] {
        &t.layout.shape
    }

    fn exp<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float,
    {
        t.map(|x| x.exp())
    }

    fn ln<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float,
    {
        t.map(|x| x.ln())
    }

    fn tanh<E>(t: &Self::Repr<E>) -> Self::Repr<E>
    where
        E: Float,
    {
        t.map(|x| x.tanh())
    }

    fn add<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        lhs.zip(rhs, |&x, &y| x + y)
    }

    fn sub<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        lhs.zip(rhs, |&x, &y| x - y)
    }

    fn mul<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        lhs.zip(rhs, |&x, &y| x * y)
    }

    fn div<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        lhs.zip(rhs, |&x, &y| x / y)
    }

    fn maximum<E>(lhs: &Self::Repr<E>, rhs: &Self::Repr<E>) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        lhs.zip(rhs, |&x, &y| if x >= y { x } else { y })
    }

    fn sum<E>(t: &Self::Repr<E>, axes: &[usize]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Num,
    {
        t.reduce(axes, E::zero, |&acc, &x| acc + x)
    }

    fn reshape<E>(t: &Self::Repr<E>, shape: &[NonZeroUsize]) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem,
    {
        let layout = Layout::from(shape);
        if layout.capacity() != t.layout.capacity() {
            return Err(TensorError::IncompatibleShapes(
                dims(&t.layout.shape),
                dims(shape),
            ));
        }
        if t.layout.is_contiguous() {
            // Elements are already laid out in row-major order starting at the offset, so only the
            // strides need to change.
            return Ok(Tensor {
                buffer: Arc::clone(&t.buffer),
                layout: Layout {
                    offset: t.layout.offset,
                    ..layout
                },
            });
        }
        Ok(Tensor {
            buffer: t.iter().cloned().collect(),
            layout,
        })
    }

    fn permute<E>(t: &Self::Repr<E>, permutation: &[usize]) -> Result<Self::Repr<E>, TensorError> {
        Ok(Tensor {
            buffer: Arc::clone(&t.buffer),
            layout: t.layout.permute(permutation)?,
        })
    }

    fn expand<E>(t: &Self::Repr<E>, shape: &[NonZeroUsize]) -> Result<Self::Repr<E>, TensorError> {
        Ok(Tensor {
            buffer: Arc::clone(&t.buffer),
            layout: t.layout.expand(shape)?,
        })
    }

    fn narrow<E>(
        t: &Self::Repr<E>,
        axis: usize,
        start: usize,
        len: NonZeroUsize,
    ) -> Result<Self::Repr<E>, TensorError> {
        Ok(Tensor {
            buffer: Arc::clone(&t.buffer),
            layout: t.layout.narrow(axis, start, len)?,
        })
    }

    fn cat<E>(ts: &[&Self::Repr<E>], axis: usize) -> Result<Self::Repr<E>, TensorError>
    where
        E: Elem,
    {
        let Some((first, rest)) = ts.split_first() else {
            return Err(TensorError::EmptyConcat);
        };
        let rank = first.layout.shape.len();
        if axis >= rank {
            return Err(TensorError::UnknownAxis { axis, rank });
        }
        let mut shape = first.layout.shape.to_vec();
        for t in rest {
            let other = &t.layout.shape;
            let compatible = other.len() == rank
                && (0..rank).all(|d| d == axis || other[d] == shape[d]);
            if !compatible {
                return Err(TensorError::IncompatibleShapes(dims(&shape), dims(other)));
            }
            let size = shape[axis]
                .checked_add(other[axis].get())
                .ok_or_else(|| TensorError::IncompatibleShapes(dims(&shape), dims(other)))?;
            shape[axis] = size;
        }
        let layout = Layout::from(shape);
        let mut buffer = Vec::with_capacity(layout.capacity().get());
        for mut idx in &layout {
            // Walk through the parts until the index along the concatenated axis falls into one.
            let mut part = 0;
            while idx[axis] >= ts[part].layout.shape[axis].get() {
                idx[axis] -= ts[part].layout.shape[axis].get();
                part += 1;
            }
            let t = ts[part];
            buffer.push(t.buffer[t.layout.translate(&idx)].clone());
        }
        Ok(Tensor {
            buffer: buffer.into(),
            layout,
        })
    }
}

impl ToCpu for TensorOps {
    fn to_cpu<E>(t: &Self::Repr<E>) -> self::Tensor<E> {
        t.clone()
    }
}

/// Low-level tensor representation on the CPU.
#[derive(Debug)]
pub struct Tensor<E> {
    buffer: Arc<[E]>,
    layout: Layout,
}

impl<E> Clone for Tensor<E> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.clone(),
        }
    }
}

impl<'a, E> IntoIterator for &'a Tensor<E> {
    type Item = &'a E;

    type IntoIter = TensorIter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter {
            tensor: self,
            indices: self.layout.iter(),
        }
    }
}

impl<E> Tensor<E> {
    /// Create row-major iterator over the tensor.
    #[must_use]
    pub fn iter(&self) -> TensorIter<'_, E> {
        self.into_iter()
    }

    /// Collect all elements of the tensor into a [`Vec`].
    #[must_use]
    pub fn ravel(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.iter().cloned().collect()
    }

    fn map<F, T>(&self, op: F) -> Tensor<T>
    where
        F: Fn(&E) -> T,
    {
        let buffer = self.iter().map(op);
        Tensor {
            buffer: buffer.collect(),
            layout: Layout::from(self.layout.shape.clone()),
        }
    }

    fn zip<F, T>(&self, other: &Self, op: F) -> Result<Tensor<T>, TensorError>
    where
        F: Fn(&E, &E) -> T,
    {
        if self.layout.shape != other.layout.shape {
            return Err(TensorError::IncompatibleShapes(
                dims(&self.layout.shape),
                dims(&other.layout.shape),
            ));
        }
        let buffer = self.iter().zip(other.iter()).map(|(x, y)| op(x, y));
        Ok(Tensor {
            buffer: buffer.collect(),
            layout: Layout::from(self.layout.shape.clone()),
        })
    }

    fn reduce<D, F, T>(&self, axes: &[usize], default: D, op: F) -> Result<Tensor<T>, TensorError>
    where
        D: Fn() -> T,
        F: Fn(&T, &E) -> T,
    {
        let (layout, reducer) = self.layout.reduce(axes)?;
        let mut buffer: Vec<_> = iter::repeat_with(default)
            .take(layout.capacity().get())
            .collect();
        for idx in &self.layout {
            let dst_pos = reducer.translate(&idx);
            let src_pos = self.layout.translate(&idx);
            buffer[dst_pos] = op(&buffer[dst_pos], &self.buffer[src_pos]);
        }
        Ok(Tensor {
            buffer: buffer.into(),
            layout,
        })
    }
}

/// A row-major iterator over a tensor.
#[derive(Debug)]
pub struct TensorIter<'a, E> {
    tensor: &'a Tensor<E>,
    indices: IndexIter<'a>,
}

impl<'a, T> Iterator for TensorIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.indices
            .next()
            .map(|idx| &self.tensor.buffer[self.tensor.layout.translate(&idx)])
    }
}

/// A layout describes how a tensor is laid out on the CPU's memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Layout {
    /// The number of elements in each axis.
    shape: Box<[NonZeroUsize]>,

    /// The number of elements in the memory array that need to be skipped to move to the next
    /// element in each axis.
    strides: Box<[usize]>,

    /// Position of the first element in the memory array.
    offset: usize,
}

impl<T> From<T> for Layout
where
    T: Into<Box<[NonZeroUsize]>>,
{
    fn from(shape: T) -> Self {
        let shape = shape.into();
        if shape.is_empty() {
            return Self::scalar();
        }
        Self::contiguous(shape)
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = Box<[usize]>;
    type IntoIter = IndexIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndexIter {
            layout: self,
            index: Box::from(vec![0; self.shape.len()]),
            exhausted: false,
        }
    }
}

impl Layout {
    /// Creates a contiguous row-major layout based on the given shape.
    fn contiguous(shape: Box<[NonZeroUsize]>) -> Self {
        let strides = contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Returns the layout for a scalar, which has no shape nor strides.
    fn scalar() -> Self {
        Self::default()
    }

    /// Creates a row-major iterator over all indices of the tensor.
    fn iter(&self) -> IndexIter<'_> {
        self.into_iter()
    }

    /// Returns the number of elements in the tensor having this layout.
    fn capacity(&self) -> NonZeroUsize {
        self.shape
            .iter()
            .copied()
            .reduce(|x, y| x.saturating_mul(y))
            .unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns true if the elements are stored in row-major order without gaps. Singleton axes are
    /// ignored since their stride is never used to address memory.
    fn is_contiguous(&self) -> bool {
        let expected = contiguous_strides(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(expected.iter()))
            .all(|(&size, (stride, want))| size == NonZeroUsize::MIN || stride == want)
    }

    /// Translates a tensor index into a position in the data buffer.
    fn translate(&self, index: &[usize]) -> usize {
        let index_it = index.iter().rev();
        let strides_it = self.strides.iter().rev();
        self.offset + index_it.zip(strides_it).map(|(x, s)| x * s).sum::<usize>()
    }

    /// Returns 2 layouts where the first is reduced layout and the second is the reducer layout.
    /// The reducer layout is used to map an index in the original tensor to a memory position in
    /// the reduced tensor.
    #[allow(clippy::similar_names)]
    fn reduce(&self, axes: &[usize]) -> Result<(Self, Self), TensorError> {
        let rank = self.shape.len();
        let mut reduced_shape = self.shape.clone();
        for &d in axes {
            if d >= rank {
                return Err(TensorError::UnknownAxis { axis: d, rank });
            }
            reduced_shape[d] = NonZeroUsize::MIN;
        }
        let reduced_layout = Self::from(reduced_shape);
        let mut reducer_layout = reduced_layout.clone();
        for &d in axes {
            // Zeroing the strides of the reduced axes maps every element along them to the same
            // memory position in the reduced tensor.
            reducer_layout.strides[d] = 0;
        }
        Ok((reduced_layout, reducer_layout))
    }

    /// Returns a new layout where the dimensions are permuted.
    fn permute(&self, permutation: &[usize]) -> Result<Self, TensorError> {
        let rank = self.shape.len();
        let mut seen = vec![false; rank];
        let valid = permutation.len() == rank
            && permutation
                .iter()
                .all(|&axis| axis < rank && !std::mem::replace(&mut seen[axis], true));
        if !valid {
            return Err(TensorError::InvalidPermutation(permutation.to_vec()));
        }
        let shape: Vec<_> = permutation.iter().map(|&axis| self.shape[axis]).collect();
        let strides: Vec<_> = permutation.iter().map(|&axis| self.strides[axis]).collect();
        Ok(Self {
            shape: Box::from(shape),
            strides: Box::from(strides),
            offset: self.offset,
        })
    }

    /// Returns a new layout for a tensor with singleton dimensions expanded to a larger size.
    ///
    /// Tensor can also be expanded to a larger number of dimensions, and the new ones will be
    /// appended at the front.
    ///
    /// Expanding a tensor does not allocate new memory, but only creates a new view on the
    /// existing tensor where a dimension of size one is expanded to a larger size by setting
    /// the strides to 0.
    fn expand(&self, new_shape: &[NonZeroUsize]) -> Result<Self, TensorError> {
        let rank = self.shape.len();
        let incompatible =
            || TensorError::IncompatibleShapes(dims(&self.shape), dims(new_shape));
        if new_shape.len() < rank {
            return Err(incompatible());
        }
        let mut new_strides = vec![0; new_shape.len()];
        for dim in 0..rank {
            let old_idx = rank - dim - 1;
            let new_idx = new_shape.len() - dim - 1;
            if self.shape[old_idx] == new_shape[new_idx] {
                new_strides[new_idx] = self.strides[old_idx];
            } else if self.shape[old_idx] != NonZeroUsize::MIN {
                return Err(incompatible());
            }
        }
        Ok(Self {
            shape: Box::from(new_shape),
            strides: Box::from(new_strides),
            offset: self.offset,
        })
    }

    /// Returns a new layout viewing `len` entries along `axis` starting at `start`.
    fn narrow(&self, axis: usize, start: usize, len: NonZeroUsize) -> Result<Self, TensorError> {
        let rank = self.shape.len();
        if axis >= rank {
            return Err(TensorError::UnknownAxis { axis, rank });
        }
        let size = self.shape[axis].get();
        let end = start.saturating_add(len.get());
        if end > size {
            return Err(TensorError::OutOfRange { start, end, size });
        }
        let mut shape = self.shape.clone();
        shape[axis] = len;
        Ok(Self {
            shape,
            strides: self.strides.clone(),
            offset: self.offset + start * self.strides[axis],
        })
    }
}

/// Go backwards through the shape to calculate the strides. The last stride is always 1.
fn contiguous_strides(shape: &[NonZeroUsize]) -> Box<[usize]> {
    let mut strides = vec![1; shape.len()].into_boxed_slice();
    for idx in (0..shape.len().saturating_sub(1)).rev() {
        strides[idx] = strides[idx + 1] * shape[idx + 1].get();
    }
    strides
}

/// An iterator over a tensor's indices.
#[derive(Debug)]
struct IndexIter<'a> {
    layout: &'a Layout,
    index: Box<[usize]>,
    exhausted: bool,
}

impl Iterator for IndexIter<'_> {
    type Item = Box<[usize]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let index = self.index.clone();
        for (i, s) in self.layout.shape.iter().enumerate().rev() {
            self.index[i] += 1;
            if self.index[i] < s.get() {
                return Some(index);
            }
            self.index[i] = 0;
        }
        self.exhausted = true;
        Some(index)
    }
}
