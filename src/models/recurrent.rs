use rand::Rng;

use crate::{
    nn::{CellKind, Linear, Module, Rnn, RnnConfig},
    tensor::{dtype::Float, error::TensorError, Tensor},
};

/// A recurrent stack followed by a position-wise linear projection.
///
/// The projection reads `hidden_dim` features, or twice as many when the stack is bidirectional,
/// so the output width never depends on the direction count.
#[derive(Debug, Clone)]
pub struct Recurrent<E> {
    rnn: Rnn<E>,
    linear: Linear<E>,
}

impl<E> Recurrent<E>
where
    E: Float,
{
    /// Create a recurrent model using `cell` in every layer.
    pub fn new<R>(
        cell: CellKind,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        config: RnnConfig,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let rnn = Rnn::new(cell, input_dim, hidden_dim, config, rng)?;
        let linear = Linear::new(rnn.output_dim(), output_dim, rng)?;
        Ok(Self { rnn, linear })
    }

    /// The cell used by the recurrent stack.
    pub fn cell(&self) -> CellKind {
        self.rnn.kind()
    }

    /// "LSTM" or "GRU", depending on the cell.
    pub fn name(&self) -> &'static str {
        match self.cell() {
            CellKind::Lstm => "LSTM",
            CellKind::Gru => "GRU",
        }
    }
}

impl<E> Module<E> for Recurrent<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        let hidden = self.rnn.forward_t(xs, train)?;
        self.linear.forward_t(&hidden, train)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        let mut parameters = self.rnn.parameters();
        parameters.extend(self.linear.parameters());
        parameters
    }
}
