//! Gibbs sampler for Bayesian polynomial regression.
//!
//! # Model
//! On standardized features X (n × k, columns x¹…xᵏ) and standardized target y:
//! - α ~ Normal(0, intercept_scale)
//! - βⱼ ~ Normal(0, slope_scale), j = 1..k
//! - σ ~ HalfNormal(noise_scale)
//! - yᵢ | α, β, σ ~ Normal(α + Σⱼ βⱼ Xᵢⱼ, σ)
//!
//! The full conditionals of α and each βⱼ are normal (conjugate), so those
//! coordinates are sampled exactly. σ has no standard full conditional under
//! the half-normal prior; its coordinate runs a short log-scale random-walk
//! Metropolis update inside the same Gibbs sweep.

use crate::stats::{iqr, mean};
use mini_mcmc::core::{ChainRunner, init_det};
use mini_mcmc::distributions::Conditional;
use mini_mcmc::gibbs::GibbsSampler;
use mini_mcmc::stats::RunStats;
use ndarray::{Array1, Array2, Array3, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;
use std::error::Error;

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;

/// Prior scales shared by every model order.
#[derive(Debug, Clone, Copy)]
pub struct RegressionPriors {
    /// Scale of the Normal(0, ·) prior on the intercept.
    pub intercept_scale: f64,
    /// Scale of the Normal(0, ·) prior on each slope.
    pub slope_scale: f64,
    /// Scale of the HalfNormal(·) prior on the noise sd.
    pub noise_scale: f64,
}

impl Default for RegressionPriors {
    /// Weak intercept prior, broad slope prior, half-normal noise prior.
    fn default() -> Self {
        Self {
            intercept_scale: 1.0,
            slope_scale: 10.0,
            noise_scale: 5.0,
        }
    }
}

/// A Gibbs sampler for Bayesian polynomial regression.
///
/// The model order is the number of design columns: pass a one-column design
/// for the linear model, a k-column power design for the order-k polynomial.
/// Both variants then share priors, sampler, and downstream comparison code.
///
/// # Type Parameters
/// * `R` - The random number generator type (defaults to `ChaCha8Rng`)
///
/// # Example
/// ```rust
/// use bayescmp::data::{polynomial_design, ScalarStandardizer, Standardizer};
/// use bayescmp::regression::{PolyRegression, RegressionPriors};
/// use ndarray::array;
///
/// let x = array![4.0, 5.0, 6.0, 9.0, 12.0, 14.0];
/// let y = array![4.2, 6.0, 6.0, 9.0, 10.0, 10.0];
///
/// let design = polynomial_design(&x, 1);
/// let (_, xs) = Standardizer::fit_transform(&design).unwrap();
/// let (_, ys) = ScalarStandardizer::fit_transform(&y).unwrap();
///
/// let model = PolyRegression::new(xs, ys, RegressionPriors::default(), 2, 42);
/// let results = model.run(200, 500).expect("MCMC failed");
/// results.summary();
/// ```
pub struct PolyRegression<R = ChaCha8Rng>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    x: Array2<f64>,
    y: Array1<f64>,
    priors: RegressionPriors,
    n_chains: usize,
    seed: u64,
    rng: R,
}

impl PolyRegression<ChaCha8Rng> {
    /// Create a sampler with the default seeded RNG.
    ///
    /// # Arguments
    /// * `x` - Standardized design matrix of shape `(n_observations, order)`,
    ///   without an intercept column.
    /// * `y` - Standardized target vector of shape `(n_observations,)`.
    /// * `priors` - Shared prior scales, see [`RegressionPriors`].
    /// * `n_chains` - Number of independent MCMC chains (≥ 1).
    /// * `seed` - Random seed for reproducibility.
    ///
    /// # Panics
    /// - If `x` and `y` have incompatible dimensions
    /// - If any prior scale is not positive
    /// - If `n_chains` is zero
    pub fn new(
        x: Array2<f64>,
        y: Array1<f64>,
        priors: RegressionPriors,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), x, y, priors, n_chains, seed)
    }
}

impl<R: SeedableRng + Rng + Clone + Send + Sync> PolyRegression<R> {
    /// Create a sampler with a custom RNG.
    pub fn from_rng(
        rng: R,
        x: Array2<f64>,
        y: Array1<f64>,
        priors: RegressionPriors,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        assert_eq!(x.nrows(), y.len(), "design and target lengths differ");
        assert!(x.ncols() >= 1, "design needs at least one column");
        assert!(
            priors.intercept_scale > 0.0 && priors.slope_scale > 0.0 && priors.noise_scale > 0.0,
            "prior scales must be positive"
        );
        assert!(n_chains >= 1, "need at least one chain");
        Self {
            x,
            y,
            priors,
            n_chains,
            seed,
            rng,
        }
    }

    /// Run the sampler and pool the chains.
    ///
    /// The state vector is `[α, β₁..βₖ, σ]`; burn-in draws are discarded per
    /// chain, the rest are pooled row-wise for the posterior summaries.
    pub fn run(
        self,
        burn_in: usize,
        samples: usize,
    ) -> Result<PolyRegressionResults, Box<dyn Error>> {
        let k = self.x.ncols();
        let dim = k + 2;

        log::debug!(
            "fitting order-{k} regression: n={}, chains={}, burn_in={burn_in}, samples={samples}",
            self.x.nrows(),
            self.n_chains
        );

        let cond = PolyConditional {
            x: self.x.clone(),
            y: self.y.clone(),
            priors: self.priors,
            rng: self.rng,
        };

        // Initialize chains: coefficients 0, σ = 1
        let mut init: Vec<Vec<f64>> = init_det(self.n_chains, dim);
        for state in &mut init {
            state[k + 1] = 1.0;
        }

        let mut gibbs = GibbsSampler::new(cond, init).set_seed(self.seed);
        let (all_samples, run_stats) = gibbs.run_progress(samples, burn_in)?;

        let pooled = all_samples
            .to_shape((self.n_chains * samples, dim))?
            .to_owned();

        let posterior_means: Vec<f64> = (0..dim).map(|j| pooled.column(j).mean().unwrap()).collect();
        let posterior_sds: Vec<f64> = (0..dim).map(|j| pooled.column(j).std(1.0)).collect();

        Ok(PolyRegressionResults {
            posterior_means,
            posterior_sds,
            samples: all_samples,
            run_stats,
            pooled,
            x: self.x,
            y: self.y,
        })
    }
}

/// Results from fitting one polynomial regression model.
pub struct PolyRegressionResults {
    /// Posterior means, layout `[α, β₁..βₖ, σ]`.
    pub posterior_means: Vec<f64>,

    /// Posterior standard deviations, same layout.
    pub posterior_sds: Vec<f64>,

    /// All MCMC samples, dimensions `[n_chains, n_samples, k + 2]`.
    pub samples: Array3<f64>,

    /// Runtime statistics and diagnostics from the sampler.
    pub run_stats: RunStats,

    pooled: Array2<f64>,
    x: Array2<f64>,
    y: Array1<f64>,
}

impl PolyRegressionResults {
    /// Model order (number of slope terms).
    pub fn order(&self) -> usize {
        self.x.ncols()
    }

    /// Chain-pooled trace, `[total_draws, k + 2]`.
    pub fn pooled(&self) -> ArrayView2<'_, f64> {
        self.pooled.view()
    }

    /// The standardized target the model was fitted on.
    pub fn observed(&self) -> &Array1<f64> {
        &self.y
    }

    /// Posterior-mean prediction at a new standardized design.
    ///
    /// The design must be transformed with the *training* standardizer before
    /// calling this.
    ///
    /// # Panics
    /// Panics if the design's column count differs from the fitted order.
    pub fn mean_curve(&self, design: &Array2<f64>) -> Array1<f64> {
        let k = self.order();
        assert_eq!(design.ncols(), k, "design order differs from the fitted model");
        let alpha = self.posterior_means[0];
        let betas = &self.posterior_means[1..=k];
        Array1::from_iter(design.rows().into_iter().map(|row| {
            alpha
                + row
                    .iter()
                    .zip(betas)
                    .map(|(xij, bj)| xij * bj)
                    .sum::<f64>()
        }))
    }

    /// Draw simulated datasets from the posterior predictive distribution.
    ///
    /// One simulated target vector per draw; when `n_draws` exceeds the
    /// pooled trace length the posterior rows are reused cyclically.
    pub fn posterior_predictive<Rg: Rng>(&self, n_draws: usize, rng: &mut Rg) -> PosteriorPredictive {
        assert!(n_draws > 0, "need at least one predictive draw");
        let total = self.pooled.nrows();
        let n = self.x.nrows();
        let k = self.order();
        let mut draws = Array2::zeros((n_draws, n));
        for s in 0..n_draws {
            let params = self.pooled.row(s % total);
            let sigma = params[k + 1];
            for i in 0..n {
                let mut mu = params[0];
                for j in 0..k {
                    mu += self.x[(i, j)] * params[1 + j];
                }
                let eps: f64 = rng.sample(Normal::standard());
                draws[(s, i)] = mu + sigma * eps;
            }
        }
        PosteriorPredictive { draws }
    }

    /// Pointwise log-likelihood over the pooled trace, `[total_draws, n]`.
    ///
    /// This is the input to [`crate::compare::waic`].
    pub fn log_likelihood(&self) -> Array2<f64> {
        let total = self.pooled.nrows();
        let n = self.x.nrows();
        let k = self.order();
        let mut ll = Array2::zeros((total, n));
        for s in 0..total {
            let params = self.pooled.row(s);
            let sigma = params[k + 1];
            let ln_sigma = sigma.ln();
            for i in 0..n {
                let mut mu = params[0];
                for j in 0..k {
                    mu += self.x[(i, j)] * params[1 + j];
                }
                let z = (self.y[i] - mu) / sigma;
                ll[(s, i)] = -HALF_LN_2PI - ln_sigma - 0.5 * z * z;
            }
        }
        ll
    }

    /// Print a parameter summary table.
    pub fn summary(&self) {
        let k = self.order();
        println!("{:<10} {:<15} {:<15}", "Parameter", "Mean", "Std. Dev.");
        println!("{}", "-".repeat(40));
        for (i, (mean, sd)) in self
            .posterior_means
            .iter()
            .zip(&self.posterior_sds)
            .enumerate()
        {
            let name = if i == 0 {
                "alpha".to_string()
            } else if i <= k {
                format!("beta[{}]", i - 1)
            } else {
                "sigma".to_string()
            };
            println!("{name:<10} {mean:<15.4} {sd:<15.4}");
        }
    }
}

/// Simulated datasets from a model's posterior predictive distribution.
pub struct PosteriorPredictive {
    /// `[n_draws, n_observations]`
    pub draws: Array2<f64>,
}

impl PosteriorPredictive {
    /// Per-draw values of a scalar test statistic, compared against the
    /// observed data: the p-value is `P(T_sim ≥ T_obs)`.
    pub fn check<F>(&self, name: &'static str, observed: &Array1<f64>, stat: F) -> PredictiveCheck
    where
        F: Fn(&[f64]) -> f64,
    {
        let obs = observed.as_slice().expect("observed vector is contiguous");
        let t_obs = stat(obs);
        let simulated: Vec<f64> = self
            .draws
            .rows()
            .into_iter()
            .map(|row| stat(row.as_slice().expect("predictive rows are contiguous")))
            .collect();
        let p_value =
            simulated.iter().filter(|&&t| t >= t_obs).count() as f64 / simulated.len() as f64;
        PredictiveCheck {
            statistic: name,
            observed: t_obs,
            simulated,
            p_value,
        }
    }

    /// Mean and interquartile-range checks, the two used by the analysis.
    pub fn standard_checks(&self, observed: &Array1<f64>) -> Vec<PredictiveCheck> {
        vec![
            self.check("mean", observed, mean),
            self.check("iqr", observed, iqr),
        ]
    }
}

/// Posterior-predictive check of one scalar test statistic.
#[derive(Debug, Clone)]
pub struct PredictiveCheck {
    pub statistic: &'static str,
    /// The statistic evaluated on the observed data.
    pub observed: f64,
    /// The statistic evaluated on each simulated dataset.
    pub simulated: Vec<f64>,
    /// `P(T_sim ≥ T_obs)` under the posterior predictive.
    pub p_value: f64,
}

impl std::fmt::Display for PredictiveCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: observed {:.4}, simulated {:.4} ± {:.4}, p-value {:.2}",
            self.statistic,
            self.observed,
            mean(&self.simulated),
            crate::stats::variance(&self.simulated).sqrt(),
            self.p_value
        )
    }
}

/// Full conditionals for the Gibbs sweep over `[α, β₁..βₖ, σ]`.
///
/// α and the βⱼ are conjugate normal updates written as precision /
/// precision-mean accumulations over the observations; σ is a short
/// Metropolis run on the log scale targeting its conditional posterior.
#[derive(Clone)]
struct PolyConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Standardized design (n × k)
    x: Array2<f64>,
    /// Standardized target (n,)
    y: Array1<f64>,
    priors: RegressionPriors,
    rng: R,
}

/// Step size of the log-scale σ walk.
const SIGMA_STEP: f64 = 0.3;
/// Inner Metropolis iterations per σ coordinate visit.
const SIGMA_MH_STEPS: usize = 5;

impl<R> PolyConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Conditional mean vector α + Xβ evaluated row by row is folded into the
    /// residual sums below; this helper computes the residual sum of squares.
    fn residual_ss(&self, given: &[f64]) -> f64 {
        let k = self.x.ncols();
        let mut sse = 0.0;
        for i in 0..self.x.nrows() {
            let mut mu = given[0];
            for j in 0..k {
                mu += self.x[(i, j)] * given[1 + j];
            }
            let r = self.y[i] - mu;
            sse += r * r;
        }
        sse
    }

    /// Log conditional density of σ up to a constant: normal likelihood plus
    /// the HalfNormal(noise_scale) prior.
    fn sigma_log_density(&self, sigma: f64, sse: f64) -> f64 {
        let n = self.x.nrows() as f64;
        let s = self.priors.noise_scale;
        -n * sigma.ln() - 0.5 * sse / (sigma * sigma) - 0.5 * (sigma / s).powi(2)
    }

    fn update_sigma(&mut self, given: &[f64]) -> f64 {
        let sse = self.residual_ss(given);
        let mut sigma = given[self.x.ncols() + 1];
        let mut logp = self.sigma_log_density(sigma, sse);
        for _ in 0..SIGMA_MH_STEPS {
            let eps: f64 = self.rng.sample(Normal::standard());
            let proposal = sigma * (SIGMA_STEP * eps).exp();
            let logp_prop = self.sigma_log_density(proposal, sse);
            // log-scale walk: the Jacobian contributes ln(proposal / sigma)
            let log_accept = logp_prop - logp + proposal.ln() - sigma.ln();
            let u: f64 = self.rng.gen_range(0.0..1.0);
            if u.ln() < log_accept {
                sigma = proposal;
                logp = logp_prop;
            }
        }
        sigma
    }
}

impl<R> Conditional<f64> for PolyConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Sample one coordinate of `[α, β₁..βₖ, σ]` from its full conditional.
    fn sample(&mut self, i: usize, given: &[f64]) -> f64 {
        let n = self.x.nrows();
        let k = self.x.ncols();

        if i > k {
            return self.update_sigma(given);
        }

        let sigma = given[k + 1];
        let inv_var = 1.0 / (sigma * sigma);

        let mut precision;
        let mut precision_mean = 0.0;
        if i == 0 {
            // Intercept: every observation contributes weight 1
            let scale = self.priors.intercept_scale;
            precision = 1.0 / (scale * scale) + n as f64 * inv_var;
            for row_idx in 0..n {
                let mut dot = 0.0;
                for (j, bj) in given[1..=k].iter().enumerate() {
                    dot += self.x[(row_idx, j)] * bj;
                }
                precision_mean += (self.y[row_idx] - dot) * inv_var;
            }
        } else {
            // Slope β_{i-1}: partial residuals against all other coordinates
            let j = i - 1;
            let col = self.x.column(j);
            let scale = self.priors.slope_scale;
            precision = 1.0 / (scale * scale);
            for row_idx in 0..n {
                let xij = col[row_idx];
                precision += xij * xij * inv_var;

                let mut dot_minus_j = given[0];
                for (m, bm) in given[1..=k].iter().enumerate() {
                    if m != j {
                        dot_minus_j += self.x[(row_idx, m)] * bm;
                    }
                }
                precision_mean += xij * (self.y[row_idx] - dot_minus_j) * inv_var;
            }
        }

        let var_i = 1.0 / precision;
        let mean_i = precision_mean * var_i;
        let eps: f64 = self.rng.sample(Normal::standard());
        mean_i + eps * var_i.sqrt()
    }
}
