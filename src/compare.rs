//! WAIC and model-weight comparison.
//!
//! [`waic`] estimates out-of-sample predictive accuracy from a pointwise
//! log-likelihood matrix; [`compare`] turns the per-model estimates into a
//! ranked table with normalized model weights, either by the exp(−Δ/2)
//! softmax (pseudo-BMA) or by Bayesian-bootstrap reweighting of the pointwise
//! contributions (BB-pseudo-BMA).

use crate::stats::log_sum_exp;
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Exp;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// WAIC on the deviance scale (lower is better).
#[derive(Debug, Clone)]
pub struct Waic {
    /// Point estimate, −2·(lppd − p_waic).
    pub waic: f64,
    /// Standard error of the point estimate.
    pub se: f64,
    /// Effective number of parameters.
    pub p_waic: f64,
    /// Pointwise elpd contributions (log scale), one per observation.
    pub pointwise: Vec<f64>,
}

/// Compute WAIC from an `[n_draws, n_observations]` log-likelihood matrix.
///
/// The log pointwise predictive density is averaged over posterior draws via
/// logsumexp; the complexity penalty is the variance of each observation's
/// log-likelihood across draws.
///
/// # Panics
/// Panics with fewer than two draws or fewer than two observations (the
/// standard error is undefined otherwise).
pub fn waic(log_lik: ArrayView2<f64>) -> Waic {
    let (s, n) = log_lik.dim();
    assert!(s > 1, "need at least two posterior draws");
    assert!(n > 1, "need at least two observations");

    let mut pointwise = Vec::with_capacity(n);
    let mut p_waic = 0.0;
    for i in 0..n {
        let col = log_lik.column(i).to_vec();
        let lppd_i = log_sum_exp(&col) - (s as f64).ln();
        let mean = col.iter().sum::<f64>() / s as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (s as f64 - 1.0);
        p_waic += var;
        pointwise.push(lppd_i - var);
    }

    let elpd: f64 = pointwise.iter().sum();
    let mean_pw = elpd / n as f64;
    let var_pw =
        pointwise.iter().map(|v| (v - mean_pw).powi(2)).sum::<f64>() / (n as f64 - 1.0);

    Waic {
        waic: -2.0 * elpd,
        se: 2.0 * (n as f64 * var_pw).sqrt(),
        p_waic,
        pointwise,
    }
}

/// How model weights are derived from the criterion.
#[derive(Debug, Clone, Copy)]
pub enum WeightMethod {
    /// exp(−Δ/2) softmax over deviance-scale differences.
    PseudoBma,
    /// Bayesian-bootstrap pseudo-BMA: Dirichlet-reweight the pointwise elpd
    /// contributions, softmax per replicate, average over replicates.
    BbPseudoBma { replicates: usize },
}

/// One row of the comparison table.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub name: String,
    /// 0 is the best model by the criterion.
    pub rank: usize,
    pub waic: f64,
    pub se: f64,
    /// Normalized model weight; the column sums to 1.
    pub weight: f64,
}

/// Ranked comparison of models by WAIC, with normalized weights.
#[derive(Debug, Clone)]
pub struct ComparisonTable {
    /// Rows in rank order (best first; stable on exact ties).
    pub rows: Vec<ComparisonRow>,
}

/// Build the comparison table for a set of fitted models.
///
/// The RNG only drives the Bayesian bootstrap; `PseudoBma` is deterministic.
///
/// # Panics
/// Panics on an empty model list, or for `BbPseudoBma` when the models'
/// pointwise vectors differ in length (they must describe the same dataset).
pub fn compare<R: Rng>(
    models: &[(&str, &Waic)],
    method: WeightMethod,
    rng: &mut R,
) -> ComparisonTable {
    assert!(!models.is_empty(), "nothing to compare");

    let weights = match method {
        WeightMethod::PseudoBma => pseudo_bma_weights(models),
        WeightMethod::BbPseudoBma { replicates } => {
            bb_pseudo_bma_weights(models, replicates, rng)
        }
    };

    // Rank ascending by criterion; sort_by is stable, so exact ties keep
    // their input order.
    let mut order: Vec<usize> = (0..models.len()).collect();
    order.sort_by(|&a, &b| {
        models[a]
            .1
            .waic
            .partial_cmp(&models[b].1.waic)
            .expect("WAIC values must not be NaN")
    });

    let rows = order
        .into_iter()
        .enumerate()
        .map(|(rank, idx)| ComparisonRow {
            name: models[idx].0.to_string(),
            rank,
            waic: models[idx].1.waic,
            se: models[idx].1.se,
            weight: weights[idx],
        })
        .collect();

    ComparisonTable { rows }
}

fn pseudo_bma_weights(models: &[(&str, &Waic)]) -> Vec<f64> {
    // elpd scale: −waic / 2
    let elpds: Vec<f64> = models.iter().map(|(_, w)| -0.5 * w.waic).collect();
    softmax(&elpds)
}

fn bb_pseudo_bma_weights<R: Rng>(
    models: &[(&str, &Waic)],
    replicates: usize,
    rng: &mut R,
) -> Vec<f64> {
    assert!(replicates > 0, "need at least one bootstrap replicate");
    let n = models[0].1.pointwise.len();
    assert!(
        models.iter().all(|(_, w)| w.pointwise.len() == n),
        "models were scored on different numbers of observations"
    );
    let pointwise: Vec<&[f64]> = models.iter().map(|(_, w)| w.pointwise.as_slice()).collect();

    // One seed per replicate keeps the result deterministic for a seeded
    // caller even when the replicates run in parallel.
    let base = rng.next_u64();
    let seeds: Vec<u64> = (0..replicates)
        .map(|i| base.wrapping_add(i as u64))
        .collect();

    #[cfg(feature = "rayon")]
    let replicate_sums: Vec<f64> = {
        let partials: Vec<Vec<f64>> = seeds
            .par_iter()
            .map(|&seed| bb_replicate(&pointwise, n, seed))
            .collect();
        fold_replicates(models.len(), partials)
    };

    #[cfg(not(feature = "rayon"))]
    let replicate_sums: Vec<f64> = {
        let partials: Vec<Vec<f64>> = seeds
            .iter()
            .map(|&seed| bb_replicate(&pointwise, n, seed))
            .collect();
        fold_replicates(models.len(), partials)
    };

    replicate_sums
        .into_iter()
        .map(|total| total / replicates as f64)
        .collect()
}

/// One Bayesian-bootstrap replicate: Dirichlet(1,…,1) weights over the
/// observations, weighted total elpd per model, softmax across models.
fn bb_replicate(pointwise: &[&[f64]], n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let exp = Exp::new(1.0).expect("Exp(1) is always valid");

    // Dirichlet(1^n) via normalized Exp(1) draws
    let mut dir: Vec<f64> = (0..n).map(|_| rng.sample(exp)).collect();
    let total: f64 = dir.iter().sum();
    for w in &mut dir {
        *w /= total;
    }

    let z: Vec<f64> = pointwise
        .iter()
        .map(|pw| {
            n as f64
                * pw.iter()
                    .zip(&dir)
                    .map(|(elpd_i, w_i)| elpd_i * w_i)
                    .sum::<f64>()
        })
        .collect();
    softmax(&z)
}

fn fold_replicates(n_models: usize, partials: Vec<Vec<f64>>) -> Vec<f64> {
    let mut sums = vec![0.0; n_models];
    for rep in partials {
        for (acc, w) in sums.iter_mut().zip(rep) {
            *acc += w;
        }
    }
    sums
}

fn softmax(xs: &[f64]) -> Vec<f64> {
    let lse = log_sum_exp(xs);
    xs.iter().map(|x| (x - lse).exp()).collect()
}

impl std::fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<6} {:<15} {:<12} {:<12} {:<10}",
            "rank", "model", "waic", "se", "weight"
        )?;
        writeln!(f, "{}", "-".repeat(57))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<6} {:<15} {:<12.2} {:<12.2} {:<10.3}",
                row.rank, row.name, row.waic, row.se, row.weight
            )?;
        }
        Ok(())
    }
}
