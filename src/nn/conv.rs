use rand::Rng;

use crate::{
    nn::{init, Init, Module},
    tensor::{dtype::Float, error::TensorError, try_shape, Tensor},
};

/// Hyperparameters of a stride-1 convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvConfig {
    /// Width of the kernel along the convolved axis.
    pub kernel_size: usize,
    /// Number of zeros added at both ends of the convolved axis.
    pub padding: usize,
}

impl ConvConfig {
    /// A configuration whose output has the same length as its input when `kernel_size` is odd.
    #[must_use]
    pub fn same(kernel_size: usize) -> Self {
        Self {
            kernel_size,
            padding: kernel_size / 2,
        }
    }
}

/// A 1-D convolution over a channels-first `(batch, channels, time)` tensor.
///
/// The weight has shape `(out_channels, in_channels, kernel_size)`. As with most deep learning
/// libraries the kernel is not flipped, so this is a cross-correlation.
#[derive(Debug, Clone)]
pub struct Conv1d<E> {
    weight: Tensor<E>,
    bias: Tensor<E>,
    config: ConvConfig,
}

impl<E> Conv1d<E>
where
    E: Float,
{
    /// Create a convolution mapping `in_channels` to `out_channels`.
    pub fn new<R>(
        in_channels: usize,
        out_channels: usize,
        config: ConvConfig,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let bound = Init::fan_in(in_channels * config.kernel_size);
        Ok(Self {
            weight: init(
                bound,
                &try_shape(&[out_channels, in_channels, config.kernel_size])?,
                rng,
            )?,
            bias: init(bound, &try_shape(&[out_channels])?, rng)?,
            config,
        })
    }

    /// Returns the hyperparameters of the convolution.
    pub fn config(&self) -> ConvConfig {
        self.config
    }
}

impl<E> Module<E> for Conv1d<E>
where
    E: Float,
{
    fn forward_t(&self, xs: &Tensor<E>, _train: bool) -> Result<Tensor<E>, TensorError> {
        let in_channels = self.weight.dims()[1];
        if xs.rank() != 3 || xs.dims()[1] != in_channels {
            return Err(TensorError::IncompatibleShapes(
                xs.dims(),
                self.weight.dims(),
            ));
        }
        let ConvConfig {
            kernel_size,
            padding,
        } = self.config;
        let padded = xs.pad(2, padding, padding, E::zero())?;
        let padded_len = padded.dims()[2];
        let steps = (padded_len + 1)
            .checked_sub(kernel_size)
            .filter(|&steps| steps > 0)
            .ok_or(TensorError::OutOfRange {
                start: 0,
                end: kernel_size,
                size: padded_len,
            })?;

        // Gather the receptive field of every output step into (batch, kernel * in, steps), where
        // row `k * in + c` holds channel `c` shifted by `k`.
        let windows = (0..kernel_size)
            .map(|k| padded.narrow(2, k, steps))
            .collect::<Result<Vec<_>, _>>()?;
        let windows: Vec<_> = windows.iter().collect();
        let columns = Tensor::cat(&windows, 1)?.transpose(1, 2)?;

        // Arrange the weight as (kernel * in, out) with the same row order as the columns.
        let kernel = self
            .weight
            .permute(&[2, 1, 0])?
            .reshape(&try_shape(&[kernel_size * in_channels, self.weight.dims()[0]])?)?;

        columns
            .matmul(&kernel)?
            .add(&self.bias)?
            .transpose(1, 2)
    }

    fn parameters(&self) -> Vec<&Tensor<E>> {
        vec![&self.weight, &self.bias]
    }
}
