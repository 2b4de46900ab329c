use rand::Rng;

use crate::{
    nn::{Linear, Module},
    tensor::{dtype::Float, error::TensorError, Tensor},
};

/// A stack of linear layers applied to every time step independently.
///
/// There is no activation between the layers.
#[derive(Debug, Clone)]
pub struct Ffn<E> {
    layers: Vec<Linear<E>>,
}

impl<E> Ffn<E>
where
    E: Float,
{
    /// Create `num_layers - 1` linear layers over the widths
    /// `[input_dim, hidden_dim, ..., hidden_dim, output_dim]`.
    ///
    /// With fewer than two layer widths (`num_layers` of 0 or 1) there is nothing to connect and
    /// the model is the identity, which only fits inputs with `output_dim` features.
    pub fn new<R>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        num_layers: usize,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let mut widths = vec![hidden_dim; num_layers];
        if let Some(first) = widths.first_mut() {
            *first = input_dim;
        }
        if let Some(last) = widths.last_mut() {
            *last = output_dim;
        }
        let layers = widths
            .windows(2)
            .map(|pair| Linear::new(pair[0], pair[1], rng))
            .collect::<Result<_, _>>()?;
        Ok(Self { layers })
    }

    /// The linear layers in application order.
    pub fn layers(&self) -> &[Linear<E>] {
        &self.layers
    }
}

impl<E> Module<E> for Ffn<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, train: bool) -> Result<Tensor<E>, TensorError> {
        self.layers
            .iter()
            .try_fold(xs.clone(), |xs, layer| layer.forward_t(&xs, train))
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        self.layers.iter().flat_map(Module::parameters).collect()
    }
}
