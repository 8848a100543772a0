//! Bayes factors between two Beta priors on a Bernoulli parameter.
//!
//! A single model holds a discrete latent index m ∈ {0, 1} with fixed prior
//! probabilities, a success probability θ whose Beta hyperparameters are
//! selected by the index, and a Bernoulli likelihood over the observed flips.
//! The Gibbs sweep alternates two exact updates:
//!
//! - m | θ: categorical with p(m) ∝ prior(m) · Beta_pdf(θ; m)
//! - θ | m: conjugate Beta(αₘ + heads, βₘ + tails)
//!
//! Both run behind the same sampler interface, so the model specification
//! never knows which sub-sampler handles which parameter. The posterior mean
//! of the index then converts into a Bayes factor through the prior odds.

use crate::Error;
use mini_mcmc::core::{ChainRunner, init_det};
use mini_mcmc::distributions::Conditional;
use mini_mcmc::gibbs::GibbsSampler;
use mini_mcmc::stats::RunStats;
use ndarray::{Array2, Array3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{Beta, Continuous};
use std::error::Error as StdError;

/// Beta(α, β) hyperparameter pair for one hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPrior {
    /// # Panics
    /// Panics unless both hyperparameters are positive.
    pub fn new(alpha: f64, beta: f64) -> Self {
        assert!(alpha > 0.0 && beta > 0.0, "Beta hyperparameters must be positive");
        Self { alpha, beta }
    }

    pub(crate) fn ln_pdf(&self, theta: f64) -> f64 {
        Beta::new(self.alpha, self.beta)
            .expect("hyperparameters validated at construction")
            .ln_pdf(theta)
    }
}

/// Pick a hypothesis' hyperparameters by the latent index.
///
/// Pure switch semantics: index 0 selects `option_a`, anything else
/// `option_b`.
pub fn select(index: usize, option_a: BetaPrior, option_b: BetaPrior) -> BetaPrior {
    if index == 0 { option_a } else { option_b }
}

/// The model-index formulation for estimating a Bayes factor in one run.
///
/// # Type Parameters
/// * `R` - The random number generator type (defaults to `ChaCha8Rng`)
///
/// # Example
/// ```rust
/// use bayescmp::bayes_factor::{BetaPrior, ModelIndexBayesFactor};
///
/// let model = ModelIndexBayesFactor::new(
///     [BetaPrior::new(4.0, 8.0), BetaPrior::new(8.0, 4.0)],
///     [0.5, 0.5],
///     9,   // heads
///     30,  // flips
///     2,   // chains
///     42,  // seed
/// );
/// let results = model.run(200, 500).expect("MCMC failed");
/// println!("P(m = 0 | y) = {:.3}", results.posterior_prob_0());
/// ```
pub struct ModelIndexBayesFactor<R = ChaCha8Rng>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    priors: [BetaPrior; 2],
    prior_probs: [f64; 2],
    heads: u64,
    trials: u64,
    n_chains: usize,
    seed: u64,
    rng: R,
}

impl ModelIndexBayesFactor<ChaCha8Rng> {
    /// Create the model with the default seeded RNG.
    ///
    /// # Arguments
    /// * `priors` - The two competing Beta hyperparameter pairs.
    /// * `prior_probs` - Prior probabilities of the two hypotheses.
    /// * `heads` - Number of successes observed.
    /// * `trials` - Total number of Bernoulli observations.
    /// * `n_chains` - Number of independent MCMC chains (≥ 1).
    /// * `seed` - Random seed for reproducibility.
    ///
    /// # Panics
    /// - If `heads > trials` or `trials` is zero
    /// - If the prior probabilities are not positive or do not sum to 1
    /// - If `n_chains` is zero
    pub fn new(
        priors: [BetaPrior; 2],
        prior_probs: [f64; 2],
        heads: u64,
        trials: u64,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        Self::from_rng(
            ChaCha8Rng::seed_from_u64(seed),
            priors,
            prior_probs,
            heads,
            trials,
            n_chains,
            seed,
        )
    }
}

impl<R: SeedableRng + Rng + Clone + Send + Sync> ModelIndexBayesFactor<R> {
    /// Create the model with a custom RNG.
    #[allow(clippy::too_many_arguments)]
    pub fn from_rng(
        rng: R,
        priors: [BetaPrior; 2],
        prior_probs: [f64; 2],
        heads: u64,
        trials: u64,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        assert!(trials > 0, "need at least one observation");
        assert!(heads <= trials, "more successes than observations");
        assert!(
            prior_probs.iter().all(|&p| p > 0.0),
            "prior model probabilities must be positive"
        );
        assert!(
            (prior_probs[0] + prior_probs[1] - 1.0).abs() < 1e-6,
            "prior model probabilities must sum to 1"
        );
        assert!(n_chains >= 1, "need at least one chain");
        Self {
            priors,
            prior_probs,
            heads,
            trials,
            n_chains,
            seed,
            rng,
        }
    }

    /// Run the Gibbs sweep over `[m, θ]` and pool the chains.
    pub fn run(self, burn_in: usize, samples: usize) -> Result<ModelIndexResults, Box<dyn StdError>> {
        log::debug!(
            "model-index run: heads={}/{} chains={} burn_in={burn_in} samples={samples}",
            self.heads,
            self.trials,
            self.n_chains
        );

        let cond = IndexConditional {
            priors: self.priors,
            prior_probs: self.prior_probs,
            heads: self.heads as f64,
            tails: (self.trials - self.heads) as f64,
            rng: self.rng,
        };

        // Initialize chains: alternate starting hypothesis, θ = 0.5
        let mut init: Vec<Vec<f64>> = init_det(self.n_chains, 2);
        for (chain, state) in init.iter_mut().enumerate() {
            state[0] = (chain % 2) as f64;
            state[1] = 0.5;
        }

        let mut gibbs = GibbsSampler::new(cond, init).set_seed(self.seed);
        let (all_samples, run_stats) = gibbs.run_progress(samples, burn_in)?;

        let pooled = all_samples
            .to_shape((self.n_chains * samples, 2))?
            .to_owned();

        Ok(ModelIndexResults {
            samples: all_samples,
            run_stats,
            prior_probs: self.prior_probs,
            pooled,
        })
    }
}

/// Results from the model-index run.
pub struct ModelIndexResults {
    /// All MCMC samples, dimensions `[n_chains, n_samples, 2]`; the first
    /// parameter is the index, the second θ.
    pub samples: Array3<f64>,

    /// Runtime statistics and diagnostics from the sampler.
    pub run_stats: RunStats,

    prior_probs: [f64; 2],
    pooled: Array2<f64>,
}

impl ModelIndexResults {
    /// Fraction of posterior draws on hypothesis 1.
    pub fn posterior_prob_1(&self) -> f64 {
        self.pooled.column(0).mean().unwrap()
    }

    /// Fraction of posterior draws on hypothesis 0.
    pub fn posterior_prob_0(&self) -> f64 {
        1.0 - self.posterior_prob_1()
    }

    /// Posterior mean of the success probability (marginal over the index).
    pub fn posterior_mean_theta(&self) -> f64 {
        self.pooled.column(1).mean().unwrap()
    }

    /// Bayes factor for hypothesis 0 over hypothesis 1:
    /// posterior odds divided by prior odds.
    ///
    /// # Errors
    /// [`Error::ZeroPosteriorMass`] when every draw fell on one hypothesis;
    /// the ratio is unbounded there, and a caller should report it as such
    /// rather than divide.
    pub fn bayes_factor(&self) -> Result<f64, Error> {
        let pm1 = self.posterior_prob_1();
        let pm0 = 1.0 - pm1;
        if pm1 <= 0.0 {
            return Err(Error::ZeroPosteriorMass { index: 0 });
        }
        if pm0 <= 0.0 {
            return Err(Error::ZeroPosteriorMass { index: 1 });
        }
        Ok((pm0 / pm1) * (self.prior_probs[1] / self.prior_probs[0]))
    }

    /// Print the posterior split over hypotheses and the Bayes factor.
    pub fn summary(&self) {
        println!(
            "P(m=0 | y) = {:.3}   P(m=1 | y) = {:.3}   E[theta | y] = {:.3}",
            self.posterior_prob_0(),
            self.posterior_prob_1(),
            self.posterior_mean_theta()
        );
        match self.bayes_factor() {
            Ok(bf) => println!("BF(0 vs 1) = {bf:.2}"),
            Err(err) => println!("BF(0 vs 1) undefined: {err}"),
        }
    }
}

/// Pointwise Bernoulli log-likelihood over exact conjugate posterior draws.
///
/// For a single fixed-hyperparameter Beta-Bernoulli model the posterior is
/// Beta(α + heads, β + tails) in closed form, so the trace for a WAIC
/// comparison can be drawn directly. Returns `[n_draws, trials]` with the
/// `heads` success observations first.
pub fn beta_bernoulli_log_likelihood<R: Rng>(
    prior: BetaPrior,
    heads: u64,
    trials: u64,
    n_draws: usize,
    rng: &mut R,
) -> Array2<f64> {
    assert!(trials > 0 && heads <= trials, "invalid flip counts");
    assert!(n_draws > 1, "need at least two posterior draws");
    let tails = trials - heads;
    let posterior = Beta::new(prior.alpha + heads as f64, prior.beta + tails as f64)
        .expect("posterior Beta parameters are positive");

    let mut ll = Array2::zeros((n_draws, trials as usize));
    for s in 0..n_draws {
        let theta: f64 = rng.sample(posterior);
        let ln_theta = theta.ln();
        let ln_1m = (1.0 - theta).ln();
        for i in 0..trials as usize {
            ll[(s, i)] = if (i as u64) < heads { ln_theta } else { ln_1m };
        }
    }
    ll
}

/// Exact Gibbs updates for the `[m, θ]` block.
#[derive(Clone)]
struct IndexConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    priors: [BetaPrior; 2],
    prior_probs: [f64; 2],
    heads: f64,
    tails: f64,
    rng: R,
}

impl<R> Conditional<f64> for IndexConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Sample either the discrete index (i = 0) or θ (i = 1) from its exact
    /// full conditional.
    fn sample(&mut self, i: usize, given: &[f64]) -> f64 {
        if i == 0 {
            // m | θ: two-way categorical on the log scale
            let theta = given[1];
            let lp0 = self.prior_probs[0].ln() + self.priors[0].ln_pdf(theta);
            let lp1 = self.prior_probs[1].ln() + self.priors[1].ln_pdf(theta);
            let p1 = 1.0 / (1.0 + (lp0 - lp1).exp());
            let u: f64 = self.rng.gen_range(0.0..1.0);
            if u < p1 { 1.0 } else { 0.0 }
        } else {
            // θ | m: conjugate Beta update under the selected hyperparameters
            let prior = select(given[0] as usize, self.priors[0], self.priors[1]);
            let posterior = Beta::new(prior.alpha + self.heads, prior.beta + self.tails)
                .expect("posterior Beta parameters are positive");
            self.rng.sample(posterior)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn select_is_a_pure_switch() {
        let a = BetaPrior::new(4.0, 8.0);
        let b = BetaPrior::new(8.0, 4.0);
        assert_eq!(select(0, a, b), a);
        assert_eq!(select(1, a, b), b);
    }

    #[test]
    fn nine_heads_in_thirty_favor_the_low_theta_prior() {
        let model = ModelIndexBayesFactor::new(
            [BetaPrior::new(4.0, 8.0), BetaPrior::new(8.0, 4.0)],
            [0.5, 0.5],
            9,
            30,
            2,
            42,
        );
        let results = model.run(500, 2500).expect("MCMC failed");
        assert!(results.posterior_prob_0() > 0.5);
        let bf = results.bayes_factor().expect("both hypotheses keep mass");
        assert!(bf > 1.0, "BF = {bf}");
        // 9/30 heads, so the marginal posterior mean of θ sits below 0.5.
        assert!(results.posterior_mean_theta() < 0.5);
    }

    #[test]
    fn hopeless_hypothesis_yields_zero_mass_error() {
        // Beta(500, 1) concentrates near θ = 1; zero heads in 200 flips
        // leaves it no posterior mass at all.
        let model = ModelIndexBayesFactor::new(
            [BetaPrior::new(500.0, 1.0), BetaPrior::new(1.0, 10.0)],
            [0.5, 0.5],
            0,
            200,
            1,
            7,
        );
        let results = model.run(200, 2000).expect("MCMC failed");
        match results.bayes_factor() {
            Err(Error::ZeroPosteriorMass { index: 1 }) => {}
            other => panic!("expected ZeroPosteriorMass for hypothesis 1's rival, got {other:?}"),
        }
    }

    #[test]
    fn prior_odds_rescale_the_factor() {
        // Same data, asymmetric prior odds: the reported factor divides the
        // posterior odds by the prior odds, so it shifts accordingly.
        let run = |prior_probs| {
            let model = ModelIndexBayesFactor::new(
                [BetaPrior::new(4.0, 8.0), BetaPrior::new(8.0, 4.0)],
                prior_probs,
                9,
                30,
                2,
                11,
            );
            model.run(500, 4000).expect("MCMC failed")
        };
        let even = run([0.5, 0.5]).bayes_factor().unwrap();
        let skewed = run([0.8, 0.2]).bayes_factor().unwrap();
        // Both estimate the same evidence ratio, within MCMC noise.
        assert!((even / skewed) > 0.5 && (even / skewed) < 2.0);
    }

    #[test]
    fn conjugate_log_likelihood_has_expected_shape() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let ll =
            beta_bernoulli_log_likelihood(BetaPrior::new(4.0, 8.0), 9, 30, 100, &mut rng);
        assert_eq!(ll.dim(), (100, 30));
        // log-probabilities of binary outcomes are strictly negative
        assert!(ll.iter().all(|&v| v < 0.0 && v.is_finite()));
    }
}
