use rand::Rng;

use crate::tensor::{dtype::Float, error::TensorError, Tensor};

/// Zero each element of `xs` with probability `p` and scale the survivors by `1 / (1 - p)`.
///
/// The mask is drawn from `rng`. Returns `xs` unchanged outside of training or when `p` is not
/// positive, NaN included.
pub fn dropout<E, R>(xs: &Tensor<E>, p: f64, train: bool, rng: &mut R) -> Result<Tensor<E>, TensorError>
where
    E: Float,
    R: Rng + ?Sized,
{
    if !train || !(p > 0.0) {
        return Ok(xs.clone());
    }
    if p >= 1.0 {
        return Tensor::zeros(xs.shape());
    }
    let keep = 1.0 - p;
    let scale = E::from_f64(keep.recip());
    let count = xs.dims().iter().product();
    let mask: Vec<E> = (0..count)
        .map(|_| if rng.gen_bool(keep) { scale } else { E::zero() })
        .collect();
    xs.mul(&Tensor::new(xs.shape(), &mask)?)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::tensor::shape;

    #[test]
    fn identity_outside_training() {
        let mut rng = StdRng::seed_from_u64(0);
        let xs = Tensor::<f32>::fill(&shape([4, 8]), 3.0).unwrap();
        assert_eq!(dropout(&xs, 0.5, false, &mut rng).unwrap().ravel(), xs.ravel());
        assert_eq!(dropout(&xs, 0.0, true, &mut rng).unwrap().ravel(), xs.ravel());
    }

    #[test]
    fn nan_probability_keeps_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let xs = Tensor::<f64>::fill(&shape([2, 3]), 1.5).unwrap();
        assert_eq!(dropout(&xs, f64::NAN, true, &mut rng).unwrap().ravel(), vec![1.5; 6]);
    }

    #[test]
    fn survivors_are_rescaled() {
        let mut rng = StdRng::seed_from_u64(0);
        let xs = Tensor::<f64>::fill(&shape([64, 64]), 1.0).unwrap();
        let ys = dropout(&xs, 0.75, true, &mut rng).unwrap().ravel();
        assert!(ys.iter().all(|&y| y == 0.0 || (y - 4.0).abs() < 1e-12));
        let kept = ys.iter().filter(|&&y| y > 0.0).count();
        assert!(kept > 0 && kept < ys.len());
    }

    #[test]
    fn seeded_masks_repeat() {
        let xs = Tensor::<f32>::fill(&shape([16, 16]), 1.0).unwrap();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            dropout(&xs, 0.5, true, &mut rng).unwrap().ravel()
        };
        assert_eq!(draw(3), draw(3));
        assert_ne!(draw(3), draw(4));
    }

    #[test]
    fn drops_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let xs = Tensor::<f32>::fill(&shape([3]), 1.0).unwrap();
        assert_eq!(dropout(&xs, 1.0, true, &mut rng).unwrap().ravel(), vec![0.0; 3]);
    }
}
