use rand::Rng;

use crate::{
    models::Recurrent,
    nn::{CellKind, Conv1d, ConvConfig, Module, RnnConfig},
    tensor::{dtype::Float, error::TensorError, Tensor},
};

const KERNEL_SIZE: usize = 11;
const NEGATIVE_SLOPE: f64 = 0.1;

/// Three same-length convolutions along the time axis, each followed by a leaky rectifier.
///
/// Reads and writes batch-first `(batch, time, features)` tensors.
#[derive(Debug, Clone)]
struct ConvStack<E> {
    convs: Vec<Conv1d<E>>,
}

impl<E> ConvStack<E>
where
    E: Float,
{
    fn new<R>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let config = ConvConfig::same(KERNEL_SIZE);
        Ok(Self {
            convs: vec![
                Conv1d::new(input_dim, hidden_dim, config, rng)?,
                Conv1d::new(hidden_dim, hidden_dim, config, rng)?,
                Conv1d::new(hidden_dim, output_dim, config, rng)?,
            ],
        })
    }
}

impl<E> Module<E> for ConvStack<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        let slope = E::from_f64(NEGATIVE_SLOPE);
        // Convolutions want the features as channels: (batch, features, time).
        let mut xs = xs.transpose(1, 2)?;
        for conv in &self.convs {
            xs = conv.forward_t(&xs, train)?.leaky_relu(slope)?;
        }
        xs.transpose(1, 2)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        self.convs.iter().flat_map(Module::parameters).collect()
    }
}

/// Convolutional feature extractor followed by a GRU model.
#[derive(Debug, Clone)]
pub struct ConvGru<E> {
    convs: ConvStack<E>,
    rnn: Recurrent<E>,
}

impl<E> ConvGru<E>
where
    E: Float,
{
    /// Create the model. `config` applies to the GRU stage.
    pub fn new<R>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        config: RnnConfig,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let convs = ConvStack::new(input_dim, hidden_dim, hidden_dim, rng)?;
        let rnn = Recurrent::new(
            CellKind::Gru,
            hidden_dim,
            hidden_dim,
            output_dim,
            config,
            rng,
        )?;
        Ok(Self { convs, rnn })
    }
}

impl<E> Module<E> for ConvGru<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        let features = self.convs.forward_t(xs, train)?;
        self.rnn.forward_t(&features, train)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        let mut parameters = self.convs.parameters();
        parameters.extend(self.rnn.parameters());
        parameters
    }
}

/// Purely convolutional model; the last convolution projects to the output features.
///
/// Each output step only sees the 31 input steps around it.
#[derive(Debug, Clone)]
pub struct FullyConv<E> {
    convs: ConvStack<E>,
}

impl<E> FullyConv<E>
where
    E: Float,
{
    /// Create the model.
    pub fn new<R>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        Ok(Self {
            convs: ConvStack::new(input_dim, hidden_dim, output_dim, rng)?,
        })
    }
}

impl<E> Module<E> for FullyConv<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        self.convs.forward_t(xs, train)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        self.convs.parameters()
    }
}
