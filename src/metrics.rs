//! Goodness-of-fit scores for simulated time series.
//!
//! Both scores equal 1 for a perfect fit. Observations with no variance, or with a zero mean for
//! [`kge`], make the scores undefined; they come out as NaN or infinite rather than as errors.

use num::Float;
use thiserror::Error;

/// Reasons a pair of series can't be scored.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MetricError {
    /// The observed and predicted series have different lengths.
    #[error("observed series has {observed} values but predicted series has {predicted}")]
    LengthMismatch {
        /// Length of the observed series.
        observed: usize,
        /// Length of the predicted series.
        predicted: usize,
    },
    /// There are no values to score.
    #[error("cannot score empty series")]
    Empty,
}

/// The three terms combined by the Kling-Gupta efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KgeComponents<F> {
    /// Pearson correlation between observations and predictions.
    pub r: F,
    /// Ratio of the predicted standard deviation to the observed one.
    pub alpha: F,
    /// Ratio of the predicted mean to the observed mean.
    pub beta: F,
}

impl<F> KgeComponents<F>
where
    F: Float,
{
    /// The Euclidean distance of the components from the ideal point `(1, 1, 1)`, subtracted
    /// from one.
    pub fn efficiency(&self) -> F {
        let one = F::one();
        let distance = [self.r, self.alpha, self.beta]
            .iter()
            .map(|&c| (c - one).powi(2))
            .fold(F::zero(), |acc, d| acc + d)
            .sqrt();
        one - distance
    }
}

/// Both scores for one pair of series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores<F> {
    /// Nash-Sutcliffe efficiency.
    pub nse: F,
    /// Kling-Gupta efficiency.
    pub kge: F,
}

/// Nash-Sutcliffe efficiency: one minus the squared error of `predicted` relative to the variance
/// of `observed`.
///
/// A score of 0 means the predictions are as good as always guessing the observed mean.
pub fn nse<F>(observed: &[F], predicted: &[F]) -> Result<F, MetricError>
where
    F: Float,
{
    check(observed, predicted)?;
    let mean = mean(observed);
    let (error, variance) = observed.iter().zip(predicted).fold(
        (F::zero(), F::zero()),
        |(error, variance), (&o, &p)| (error + (p - o).powi(2), variance + (o - mean).powi(2)),
    );
    Ok(F::one() - error / variance)
}

/// Kling-Gupta efficiency.
pub fn kge<F>(observed: &[F], predicted: &[F]) -> Result<F, MetricError>
where
    F: Float,
{
    kge_components(observed, predicted).map(|c| c.efficiency())
}

/// Correlation, variability ratio and bias ratio of `predicted` against `observed`.
///
/// Standard deviations are population ones.
pub fn kge_components<F>(observed: &[F], predicted: &[F]) -> Result<KgeComponents<F>, MetricError>
where
    F: Float,
{
    check(observed, predicted)?;
    let mean_o = mean(observed);
    let mean_p = mean(predicted);
    let (cov, var_o, var_p) = observed.iter().zip(predicted).fold(
        (F::zero(), F::zero(), F::zero()),
        |(cov, var_o, var_p), (&o, &p)| {
            let (do_, dp) = (o - mean_o, p - mean_p);
            (cov + do_ * dp, var_o + do_ * do_, var_p + dp * dp)
        },
    );
    Ok(KgeComponents {
        r: cov / (var_o * var_p).sqrt(),
        alpha: (var_p / var_o).sqrt(),
        beta: mean_p / mean_o,
    })
}

/// Compute both scores at once.
pub fn evaluate<F>(observed: &[F], predicted: &[F]) -> Result<Scores<F>, MetricError>
where
    F: Float,
{
    Ok(Scores {
        nse: nse(observed, predicted)?,
        kge: kge(observed, predicted)?,
    })
}

fn check<F>(observed: &[F], predicted: &[F]) -> Result<(), MetricError> {
    if observed.len() != predicted.len() {
        return Err(MetricError::LengthMismatch {
            observed: observed.len(),
            predicted: predicted.len(),
        });
    }
    if observed.is_empty() {
        return Err(MetricError::Empty);
    }
    Ok(())
}

fn mean<F>(xs: &[F]) -> F
where
    F: Float,
{
    let sum = xs.iter().fold(F::zero(), |acc, &x| acc + x);
    sum / <F as num::NumCast>::from(xs.len()).unwrap_or_else(F::infinity)
}
