use std::cell::RefCell;

use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    nn::{dropout, init, Init, Module},
    tensor::{dtype::Float, error::TensorError, try_shape, Tensor},
};

/// The cell used by each layer of a recurrent stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Long short-term memory cell with input, forget, cell and output gates.
    Lstm,
    /// Gated recurrent unit with reset, update and new gates.
    Gru,
}

impl CellKind {
    /// Number of gate blocks stacked in the weight matrices.
    fn gates(self) -> usize {
        match self {
            Self::Lstm => 4,
            Self::Gru => 3,
        }
    }
}

/// Hyperparameters of a recurrent stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RnnConfig {
    /// Number of stacked layers.
    pub num_layers: usize,
    /// Dropout probability applied to the outputs of every layer but the last during training.
    pub dropout: f64,
    /// Whether every layer also runs over the reversed sequence.
    pub bidirectional: bool,
}

impl Default for RnnConfig {
    fn default() -> Self {
        Self {
            num_layers: 1,
            dropout: 0.0,
            bidirectional: false,
        }
    }
}

/// Parameters of one direction of one layer. Gate blocks are stacked along the first axis.
#[derive(Debug, Clone)]
struct Weights<E> {
    w_ih: Tensor<E>,
    w_hh: Tensor<E>,
    b_ih: Tensor<E>,
    b_hh: Tensor<E>,
}

impl<E> Weights<E>
where
    E: Float,
{
    fn new<R>(
        kind: CellKind,
        input_dim: usize,
        hidden_dim: usize,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let bound = Init::fan_in(hidden_dim);
        let gates = kind.gates() * hidden_dim;
        Ok(Self {
            w_ih: init(bound, &try_shape(&[gates, input_dim])?, rng)?,
            w_hh: init(bound, &try_shape(&[gates, hidden_dim])?, rng)?,
            b_ih: init(bound, &try_shape(&[gates])?, rng)?,
            b_hh: init(bound, &try_shape(&[gates])?, rng)?,
        })
    }
}

/// A batch-first multi-layer recurrent network.
///
/// Maps `(batch, time, input_dim)` to `(batch, time, hidden_dim * directions)`, starting from zero
/// hidden and cell states. Only the output sequence of the last layer is returned.
///
/// Dropout masks come from a generator seeded by the construction RNG, so two stacks built from
/// the same seed go through the same sequence of training passes.
#[derive(Debug, Clone)]
pub struct Rnn<E> {
    kind: CellKind,
    config: RnnConfig,
    input_dim: usize,
    hidden_dim: usize,
    layers: Vec<Vec<Weights<E>>>,
    masks: RefCell<StdRng>,
}

impl<E> Rnn<E>
where
    E: Float,
{
    /// Create a recurrent stack of `kind` cells.
    pub fn new<R>(
        kind: CellKind,
        input_dim: usize,
        hidden_dim: usize,
        config: RnnConfig,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        if config.dropout > 0.0 && config.num_layers == 1 {
            warn!(
                "dropout of {} has no effect on a recurrent stack with a single layer",
                config.dropout
            );
        }
        let directions = if config.bidirectional { 2 } else { 1 };
        let mut layers = Vec::with_capacity(config.num_layers);
        for layer in 0..config.num_layers {
            let layer_input = if layer == 0 {
                input_dim
            } else {
                hidden_dim * directions
            };
            let mut weights = Vec::with_capacity(directions);
            for _ in 0..directions {
                weights.push(Weights::new(kind, layer_input, hidden_dim, rng)?);
            }
            layers.push(weights);
        }
        Ok(Self {
            kind,
            config,
            input_dim,
            hidden_dim,
            layers,
            masks: RefCell::new(StdRng::seed_from_u64(rng.gen())),
        })
    }

    /// Returns the kind of cell used by every layer.
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Returns the hyperparameters of the stack.
    pub fn config(&self) -> RnnConfig {
        self.config
    }

    /// Number of features of each output step, doubled when the stack is bidirectional.
    pub fn output_dim(&self) -> usize {
        if self.config.bidirectional {
            self.hidden_dim * 2
        } else {
            self.hidden_dim
        }
    }

    /// Run one direction of one layer over the whole sequence.
    fn run(&self, w: &Weights<E>, xs: &Tensor<E>, reverse: bool) -> Result<Tensor<E>, TensorError> {
        let dims = xs.dims();
        let (batch, steps) = (dims[0], dims[1]);
        let hidden = self.hidden_dim;
        let gates = self.kind.gates() * hidden;

        // The input contribution of every step is computed at once, outside of the recurrence.
        let projected = xs.matmul(&w.w_ih.transpose(0, 1)?)?.add(&w.b_ih)?;
        let w_hh = w.w_hh.transpose(0, 1)?;
        let step_shape = try_shape(&[batch, gates])?;
        let state_shape = try_shape(&[batch, hidden])?;
        let output_shape = try_shape(&[batch, 1, hidden])?;

        let mut h = Tensor::zeros(&state_shape)?;
        let mut c = Tensor::zeros(&state_shape)?;
        let mut outputs = Vec::with_capacity(steps);
        for i in 0..steps {
            let t = if reverse { steps - 1 - i } else { i };
            let gx = projected.narrow(1, t, 1)?.reshape(&step_shape)?;
            let gh = h.matmul(&w_hh)?.add(&w.b_hh)?;
            match self.kind {
                CellKind::Lstm => {
                    let gates = gx.add(&gh)?;
                    let chunk = |k: usize| gates.narrow(1, k * hidden, hidden);
                    let input_gate = chunk(0)?.sigmoid()?;
                    let forget_gate = chunk(1)?.sigmoid()?;
                    let cell_gate = chunk(2)?.tanh();
                    let output_gate = chunk(3)?.sigmoid()?;
                    c = forget_gate.mul(&c)?.add(&input_gate.mul(&cell_gate)?)?;
                    h = output_gate.mul(&c.tanh())?;
                }
                CellKind::Gru => {
                    let chunk_x = |k: usize| gx.narrow(1, k * hidden, hidden);
                    let chunk_h = |k: usize| gh.narrow(1, k * hidden, hidden);
                    let reset = chunk_x(0)?.add(&chunk_h(0)?)?.sigmoid()?;
                    let update = chunk_x(1)?.add(&chunk_h(1)?)?.sigmoid()?;
                    let new = chunk_x(2)?.add(&reset.mul(&chunk_h(2)?)?)?.tanh();
                    // (1 - z) * n + z * h
                    h = new.add(&update.mul(&h.sub(&new)?)?)?;
                }
            }
            outputs.push(h.reshape(&output_shape)?);
        }
        if reverse {
            outputs.reverse();
        }
        let outputs: Vec<_> = outputs.iter().collect();
        Tensor::cat(&outputs, 1)
    }
}

impl<E> Module<E> for Rnn<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        if xs.rank() != 3 || xs.dims()[2] != self.input_dim {
            return Err(TensorError::IncompatibleShapes(
                xs.dims(),
                vec![self.input_dim],
            ));
        }
        let mut output = xs.clone();
        for (idx, layer) in self.layers.iter().enumerate() {
            if idx > 0 {
                output = dropout(
                    &output,
                    self.config.dropout,
                    train,
                    &mut *self.masks.borrow_mut(),
                )?;
            }
            let directions = layer
                .iter()
                .enumerate()
                .map(|(direction, w)| self.run(w, &output, direction == 1))
                .collect::<Result<Vec<_>, _>>()?;
            let directions: Vec<_> = directions.iter().collect();
            output = Tensor::cat(&directions, 2)?;
        }
        Ok(output)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        self.layers
            .iter()
            .flatten()
            .flat_map(|w| [&w.w_ih, &w.w_hh, &w.b_ih, &w.b_hh])
            .collect()
    }
}
