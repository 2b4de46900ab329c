use crate::tensor::{dtype::Float, error::TensorError, Tensor};

/// A tensor transformation holding learned parameters.
pub trait Module<E>
where
    E: Float,
{
    /// Propagate `xs` through the module.
    ///
    /// Stochastic layers such as dropout are only active when `train` is true.
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError>;

    /// Propagate `xs` through the module in evaluation mode.
    fn forward(&self, xs: &Tensor<E>) -> Result<Tensor<E>, TensorError> {
        self.forward_t(xs, false)
    }

    /// Returns all learned parameters of the module.
    fn parameters(&self) -> Vec<&Tensor<E>>;

    /// Returns the number of learned values held by the module.
    fn parameter_count(&self) -> usize {
        self.parameters()
            .iter()
            .map(|p| p.dims().iter().product::<usize>())
            .sum()
    }
}
