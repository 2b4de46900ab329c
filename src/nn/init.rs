use std::num::NonZeroUsize;

use rand::Rng;
use rand_distr::Uniform;

use crate::tensor::{dtype::Float, error::TensorError, Tensor};

/// How the values of a new parameter are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// Every value is set to the constant. None of the layers use it; it builds parameters with
    /// known values.
    Const(f64),

    /// Values are drawn uniformly from `[lo, up)`.
    Uniform {
        /// Lower bound, inclusive.
        lo: f64,
        /// Upper bound, exclusive.
        up: f64,
    },
}

impl Init {
    /// Uniform over `[-k, k)` with `k = 1 / sqrt(fan_in)`, the default for linear, convolutional and
    /// recurrent layers.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fan_in(fan_in: usize) -> Self {
        let bound = 1.0 / (fan_in as f64).sqrt();
        Self::Uniform {
            lo: -bound,
            up: bound,
        }
    }
}

/// Create a tensor with the given shape whose values are drawn according to `init`.
pub fn init<E, R>(init: Init, shape: &[NonZeroUsize], rng: &mut R) -> Result<Tensor<E>, TensorError>
where
    E: Float,
    R: Rng + ?Sized,
{
    match init {
        Init::Const(value) => Tensor::fill(shape, E::from_f64(value)),
        // An empty range would make the distribution panic, so it collapses to its lower bound.
        Init::Uniform { lo, up } if lo >= up => Tensor::fill(shape, E::from_f64(lo)),
        Init::Uniform { lo, up } => {
            let distribution = Uniform::new(lo, up);
            let count = shape.iter().map(|d| d.get()).product();
            let data: Vec<E> = (0..count)
                .map(|_| E::from_f64(rng.sample(&distribution)))
                .collect();
            Tensor::new(shape, &data)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::tensor::shape;

    #[test]
    fn fan_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = init::<f64, _>(Init::fan_in(16), &shape([32, 16]), &mut rng).unwrap();
        let values = t.ravel();
        assert!(values.iter().all(|v| (-0.25..0.25).contains(v)));
        // Not all the same value.
        assert!(values.iter().any(|&v| v != values[0]));
    }

    #[test]
    fn seeded_draws_repeat() {
        let draw = || {
            let mut rng = StdRng::seed_from_u64(7);
            init::<f32, _>(Init::fan_in(3), &shape([4]), &mut rng).unwrap().ravel()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn constant_and_empty_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = init::<f32, _>(Init::Const(0.5), &shape([2, 2]), &mut rng).unwrap();
        assert_eq!(t.ravel(), vec![0.5; 4]);
        let t = init::<f32, _>(Init::Uniform { lo: 1.0, up: 1.0 }, &shape([2]), &mut rng).unwrap();
        assert_eq!(t.ravel(), vec![1.0; 2]);
    }
}
