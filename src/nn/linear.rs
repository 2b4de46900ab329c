use rand::Rng;

use crate::{
    nn::{init, Init, Module},
    tensor::{dtype::Float, error::TensorError, try_shape, Tensor},
};

/// A fully connected layer computing `xs * weightᵀ + bias` over the last axis of its input.
#[derive(Debug, Clone)]
pub struct Linear<E> {
    weight: Tensor<E>,
    bias: Tensor<E>,
}

impl<E> Linear<E>
where
    E: Float,
{
    /// Create a layer mapping `in_dim` features to `out_dim` features.
    pub fn new<R>(in_dim: usize, out_dim: usize, rng: &mut R) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let bound = Init::fan_in(in_dim);
        Ok(Self {
            weight: init(bound, &try_shape(&[out_dim, in_dim])?, rng)?,
            bias: init(bound, &try_shape(&[out_dim])?, rng)?,
        })
    }

    /// Number of input features.
    pub fn in_dim(&self) -> usize {
        self.weight.dims()[1]
    }

    /// Number of output features.
    pub fn out_dim(&self) -> usize {
        self.weight.dims()[0]
    }
}

impl<E> Module<E> for Linear<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, _train: bool) -> Result<Tensor<E>, TensorError> {
        xs.matmul(&self.weight.transpose(0, 1)?)?.add(&self.bias)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        vec![&self.weight, &self.bias]
    }
}
