//! Benchmark sequence-to-sequence regression models.
//!
//! Every model maps a `(batch, time, input_dim)` tensor to a `(batch, time, output_dim)` tensor.
//! The variants span a range of temporal modelling capacity: [`Ffn`] looks at each step on its
//! own, [`FullyConv`] at a fixed window around it, and [`Recurrent`] and [`ConvGru`] at the whole
//! history of the sequence.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    nn::{CellKind, Module, RnnConfig},
    tensor::{dtype::Float, error::TensorError, Tensor},
};

mod conv;
pub use conv::{ConvGru, FullyConv};

mod ffn;
pub use ffn::Ffn;

mod recurrent;
pub use recurrent::Recurrent;

/// The architecture of a benchmark model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Recurrent stack of LSTM cells followed by a linear projection.
    Lstm,
    /// Recurrent stack of GRU cells followed by a linear projection.
    Gru,
    /// Three convolutions feeding a GRU model.
    ConvGru,
    /// Three convolutions, the last one projecting to the output features.
    FullyConv,
    /// Position-wise stack of linear layers.
    Ffn,
}

fn default_num_layers() -> usize {
    1
}

/// Architecture hyperparameters of a model, fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Which architecture to build.
    pub kind: ModelKind,
    /// Number of features of each input step.
    pub input_dim: usize,
    /// Latent width.
    pub hidden_dim: usize,
    /// Number of features of each output step.
    pub output_dim: usize,
    /// Number of recurrent layers, or of layer widths for [`ModelKind::Ffn`].
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    /// Dropout probability between recurrent layers.
    #[serde(default)]
    pub dropout: f64,
    /// Whether recurrent layers also run over the reversed sequence.
    #[serde(default)]
    pub bidirectional: bool,
}

impl ModelConfig {
    /// Create a configuration with a single layer, no dropout and a single direction.
    #[must_use]
    pub fn new(kind: ModelKind, input_dim: usize, hidden_dim: usize, output_dim: usize) -> Self {
        Self {
            kind,
            input_dim,
            hidden_dim,
            output_dim,
            num_layers: default_num_layers(),
            dropout: 0.0,
            bidirectional: false,
        }
    }

    /// The part of the configuration that concerns recurrent stacks.
    #[must_use]
    pub fn rnn(&self) -> RnnConfig {
        RnnConfig {
            num_layers: self.num_layers,
            dropout: self.dropout,
            bidirectional: self.bidirectional,
        }
    }
}

/// One of the benchmark models.
#[derive(Debug, Clone)]
pub enum Model<E> {
    /// An LSTM or GRU model.
    Recurrent(Recurrent<E>),
    /// A convolutional GRU model.
    ConvGru(ConvGru<E>),
    /// A fully convolutional model.
    FullyConv(FullyConv<E>),
    /// A feed-forward model.
    Ffn(Ffn<E>),
}

impl<E> Model<E>
where
    E: Float,
{
    /// Build the model described by `config`, drawing its initial parameters from `rng`.
    pub fn new<R>(config: &ModelConfig, rng: &mut R) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let ModelConfig {
            kind,
            input_dim,
            hidden_dim,
            output_dim,
            num_layers,
            ..
        } = *config;
        let model = match kind {
            ModelKind::Lstm | ModelKind::Gru => {
                let cell = if kind == ModelKind::Lstm {
                    CellKind::Lstm
                } else {
                    CellKind::Gru
                };
                Self::Recurrent(Recurrent::new(
                    cell,
                    input_dim,
                    hidden_dim,
                    output_dim,
                    config.rnn(),
                    rng,
                )?)
            }
            ModelKind::ConvGru => Self::ConvGru(ConvGru::new(
                input_dim,
                hidden_dim,
                output_dim,
                config.rnn(),
                rng,
            )?),
            ModelKind::FullyConv => {
                Self::FullyConv(FullyConv::new(input_dim, hidden_dim, output_dim, rng)?)
            }
            ModelKind::Ffn => Self::Ffn(Ffn::new(
                input_dim, hidden_dim, output_dim, num_layers, rng,
            )?),
        };
        debug!(
            "built {} with {} parameters from {:?}",
            model.name(),
            model.parameter_count(),
            config
        );
        Ok(model)
    }

    /// The display name of the architecture.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recurrent(m) => m.name(),
            Self::ConvGru(_) => "ConvGru",
            Self::FullyConv(_) => "FullyConv",
            Self::Ffn(_) => "FFN",
        }
    }

    /// The architecture of the model.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Recurrent(m) => match m.cell() {
                CellKind::Lstm => ModelKind::Lstm,
                CellKind::Gru => ModelKind::Gru,
            },
            Self::ConvGru(_) => ModelKind::ConvGru,
            Self::FullyConv(_) => ModelKind::FullyConv,
            Self::Ffn(_) => ModelKind::Ffn,
        }
    }
}

impl<E> Module<E> for Model<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        match self {
            Self::Recurrent(m) => m.forward_t(xs, train),
            Self::ConvGru(m) => m.forward_t(xs, train),
            Self::FullyConv(m) => m.forward_t(xs, train),
            Self::Ffn(m) => m.forward_t(xs, train),
        }
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        match self {
            Self::Recurrent(m) => m.parameters(),
            Self::ConvGru(m) => m.parameters(),
            Self::FullyConv(m) => m.parameters(),
            Self::Ffn(m) => m.parameters(),
        }
    }
}
