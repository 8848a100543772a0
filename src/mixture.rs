//! Weighted mixtures of posterior-predictive draws.
//!
//! Given per-model normalized weights, each output draw picks a model index
//! from the weights and then emits one of that model's predictive rows, so the
//! combined sample reflects model uncertainty on top of parameter uncertainty.

use crate::Error;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

/// Tolerance on the weight sum; weights outside the simplex are rejected, not
/// renormalized.
const WEIGHT_TOL: f64 = 1e-6;

/// Mixture draws plus the model each row came from.
pub struct MixturePredictive {
    /// `[n_draws, n_observations]`
    pub draws: Array2<f64>,
    /// Index into the model list for each output row.
    pub sources: Vec<usize>,
}

/// Draw a combined predictive sample from several models.
///
/// `models` holds each model's posterior-predictive draws as an
/// `[n_model_draws, n_observations]` matrix; all models must describe the same
/// observations. Each output row is copied verbatim from one model's pool, so
/// provenance is exact.
///
/// # Errors
/// - [`Error::InvalidWeights`] if any weight is negative or the sum is not 1
///   within `1e-6`.
/// - [`Error::Shape`] if the models disagree on the observation count or a
///   pool is empty.
///
/// # Panics
/// Panics if `models` and `weights` differ in length, or `n_draws` is zero.
pub fn weighted_posterior_predictive<R: Rng>(
    models: &[ArrayView2<f64>],
    weights: &[f64],
    n_draws: usize,
    rng: &mut R,
) -> Result<MixturePredictive, Error> {
    assert_eq!(models.len(), weights.len(), "one weight per model");
    assert!(!models.is_empty(), "need at least one model");
    assert!(n_draws > 0, "need at least one output draw");

    let sum: f64 = weights.iter().sum();
    if weights.iter().any(|&w| w < 0.0) || (sum - 1.0).abs() > WEIGHT_TOL {
        return Err(Error::InvalidWeights { sum });
    }

    let n_obs = models[0].ncols();
    for (idx, m) in models.iter().enumerate() {
        if m.ncols() != n_obs {
            return Err(Error::Shape(format!(
                "model {idx} has {} observations, expected {n_obs}",
                m.ncols()
            )));
        }
        if m.nrows() == 0 {
            return Err(Error::Shape(format!("model {idx} has no predictive draws")));
        }
    }

    let mut draws = Array2::zeros((n_draws, n_obs));
    let mut sources = Vec::with_capacity(n_draws);
    for out in 0..n_draws {
        let idx = sample_index(weights, rng);
        let pool = &models[idx];
        let row = pool.row(rng.gen_range(0..pool.nrows()));
        draws.row_mut(out).assign(&row);
        sources.push(idx);
    }

    Ok(MixturePredictive { draws, sources })
}

/// Categorical draw by cumulative weight.
fn sample_index<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let mut u: f64 = rng.gen_range(0.0..1.0);
    for (idx, &w) in weights.iter().enumerate() {
        if u < w {
            return idx;
        }
        u -= w;
    }
    // u can exceed the running sum by float rounding; fall back to the last
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tagged_pool(value: f64, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_elem((rows, cols), value)
    }

    #[test]
    fn negative_weights_are_rejected() {
        let a = tagged_pool(1.0, 5, 3);
        let b = tagged_pool(2.0, 5, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let got =
            weighted_posterior_predictive(&[a.view(), b.view()], &[1.5, -0.5], 10, &mut rng);
        assert!(matches!(got, Err(Error::InvalidWeights { .. })));
    }

    #[test]
    fn non_normalized_weights_are_rejected() {
        let a = tagged_pool(1.0, 5, 3);
        let b = tagged_pool(2.0, 5, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let got = weighted_posterior_predictive(&[a.view(), b.view()], &[0.6, 0.6], 10, &mut rng);
        assert!(matches!(got, Err(Error::InvalidWeights { .. })));
    }

    #[test]
    fn mismatched_observation_counts_are_rejected() {
        let a = tagged_pool(1.0, 5, 3);
        let b = tagged_pool(2.0, 5, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let got = weighted_posterior_predictive(&[a.view(), b.view()], &[0.5, 0.5], 10, &mut rng);
        assert!(matches!(got, Err(Error::Shape(_))));
    }

    #[test]
    fn every_row_comes_verbatim_from_its_tagged_source() {
        // Pools tagged by constant values make provenance verifiable.
        let a = tagged_pool(7.0, 4, 6);
        let b = tagged_pool(-3.0, 9, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mix =
            weighted_posterior_predictive(&[a.view(), b.view()], &[0.5, 0.5], 200, &mut rng)
                .unwrap();

        assert_eq!(mix.draws.dim(), (200, 6));
        assert_eq!(mix.sources.len(), 200);
        for (row, &src) in mix.draws.rows().into_iter().zip(&mix.sources) {
            let expected = if src == 0 { 7.0 } else { -3.0 };
            assert!(row.iter().all(|&v| v == expected));
        }
        // Both models should actually appear under half/half weights.
        assert!(mix.sources.iter().any(|&s| s == 0));
        assert!(mix.sources.iter().any(|&s| s == 1));
    }

    #[test]
    fn degenerate_weight_routes_everything_to_one_model() {
        let a = tagged_pool(1.0, 3, 2);
        let b = tagged_pool(2.0, 3, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mix =
            weighted_posterior_predictive(&[a.view(), b.view()], &[1.0, 0.0], 50, &mut rng)
                .unwrap();
        assert!(mix.sources.iter().all(|&s| s == 0));
        assert!(mix.draws.iter().all(|&v| v == 1.0));
    }
}
