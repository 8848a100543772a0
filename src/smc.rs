//! Sequential Monte Carlo marginal-likelihood estimation.
//!
//! An independent cross-check for the model-index Bayes factor in
//! [`crate::bayes_factor`]: each fixed-hyperparameter Beta-Bernoulli model
//! gets its own likelihood-tempered SMC run, and the ratio of the two
//! marginal likelihoods is a second estimate of the same factor.
//!
//! Particles start at the prior; a temperature ladder raises the likelihood
//! from power 0 to 1. At every rung the incremental importance weights are
//! accumulated on the log scale, particles are resampled systematically when
//! the effective sample size collapses, and a short logit-scale random-walk
//! Metropolis pass rejuvenates the population against the tempered posterior.

use crate::bayes_factor::BetaPrior;
use crate::stats::log_sum_exp;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{Beta, Normal};
use statrs::function::beta::ln_beta;

/// Tuning knobs for one tempered SMC run.
#[derive(Debug, Clone, Copy)]
pub struct SmcConfig {
    pub particles: usize,
    /// Number of rungs in the temperature ladder.
    pub temperatures: usize,
    /// Metropolis rejuvenation sweeps per rung.
    pub rejuvenation_steps: usize,
    pub seed: u64,
}

impl Default for SmcConfig {
    fn default() -> Self {
        Self {
            particles: 2000,
            temperatures: 30,
            rejuvenation_steps: 5,
            seed: 0,
        }
    }
}

/// Log marginal likelihood estimate plus run bookkeeping.
#[derive(Debug, Clone)]
pub struct SmcEstimate {
    pub log_marginal_likelihood: f64,
    /// Smallest effective sample size seen across the ladder.
    pub ess_min: f64,
    /// Number of resampling events.
    pub resamples: usize,
}

/// Step size of the logit-scale rejuvenation walk.
const LOGIT_STEP: f64 = 0.5;

/// Estimate the log marginal likelihood of a Beta-Bernoulli model.
///
/// # Panics
/// Panics if `trials` is zero, `heads > trials`, or the configuration asks
/// for no particles or no temperatures.
pub fn marginal_likelihood(
    prior: BetaPrior,
    heads: u64,
    trials: u64,
    config: SmcConfig,
) -> SmcEstimate {
    assert!(trials > 0, "need at least one observation");
    assert!(heads <= trials, "more successes than observations");
    assert!(config.particles > 1, "need at least two particles");
    assert!(config.temperatures >= 1, "need at least one temperature rung");

    let h = heads as f64;
    let t = (trials - heads) as f64;
    let log_lik = |theta: f64| h * theta.ln() + t * (1.0 - theta).ln();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let prior_dist =
        Beta::new(prior.alpha, prior.beta).expect("hyperparameters validated at construction");

    let p = config.particles;
    let mut particles: Vec<f64> = (0..p).map(|_| rng.sample(prior_dist)).collect();
    let mut log_weights = vec![0.0_f64; p];
    let mut log_ml = 0.0;
    let mut ess_min = p as f64;
    let mut resamples = 0;

    // Quartic ramp: dense rungs near temperature 0, where the tempered
    // posterior moves fastest away from the prior.
    let ladder: Vec<f64> = (1..=config.temperatures)
        .map(|k| (k as f64 / config.temperatures as f64).powi(4))
        .collect();

    let mut t_prev = 0.0;
    for &temp in &ladder {
        let delta = temp - t_prev;
        t_prev = temp;

        for (w, &theta) in log_weights.iter_mut().zip(&particles) {
            *w += delta * log_lik(theta);
        }

        let lse = log_sum_exp(&log_weights);
        let ess = 1.0
            / log_weights
                .iter()
                .map(|w| (2.0 * (w - lse)).exp())
                .sum::<f64>();
        ess_min = ess_min.min(ess);

        if ess < p as f64 / 2.0 {
            // Fold the accumulated increments into the running estimate, then
            // restart from an equally weighted population.
            log_ml += lse - (p as f64).ln();
            let norm: Vec<f64> = log_weights.iter().map(|w| (w - lse).exp()).collect();
            particles = systematic_resample(&particles, &norm, &mut rng);
            log_weights.iter_mut().for_each(|w| *w = 0.0);
            resamples += 1;
        }

        rejuvenate(
            &mut particles,
            prior,
            temp,
            &log_lik,
            config.rejuvenation_steps,
            &mut rng,
        );
    }

    log_ml += log_sum_exp(&log_weights) - (p as f64).ln();

    log::debug!(
        "smc: Beta({}, {}) heads={heads}/{trials} log_ml={log_ml:.4} ess_min={ess_min:.1} resamples={resamples}",
        prior.alpha,
        prior.beta
    );

    SmcEstimate {
        log_marginal_likelihood: log_ml,
        ess_min,
        resamples,
    }
}

/// Independent Bayes-factor estimate from two marginal-likelihood runs.
///
/// Same convention as the model-index formulation: the factor reports
/// evidence for `prior0` over `prior1`.
pub fn bayes_factor(
    prior0: BetaPrior,
    prior1: BetaPrior,
    heads: u64,
    trials: u64,
    config: SmcConfig,
) -> f64 {
    let m0 = marginal_likelihood(prior0, heads, trials, config);
    let m1 = marginal_likelihood(
        prior1,
        heads,
        trials,
        SmcConfig {
            seed: config.seed.wrapping_add(1),
            ..config
        },
    );
    (m0.log_marginal_likelihood - m1.log_marginal_likelihood).exp()
}

/// Closed-form log marginal likelihood of the Beta-Bernoulli model,
/// `ln B(α + h, β + t) − ln B(α, β)`. Used as a test oracle.
pub fn exact_log_marginal_likelihood(prior: BetaPrior, heads: u64, trials: u64) -> f64 {
    assert!(heads <= trials, "more successes than observations");
    let h = heads as f64;
    let t = (trials - heads) as f64;
    ln_beta(prior.alpha + h, prior.beta + t) - ln_beta(prior.alpha, prior.beta)
}

/// Systematic resampling: one uniform offset, evenly spaced targets through
/// the cumulative weights.
fn systematic_resample<R: Rng>(particles: &[f64], norm_weights: &[f64], rng: &mut R) -> Vec<f64> {
    let p = particles.len();
    let offset: f64 = rng.gen_range(0.0..1.0) / p as f64;
    let mut out = Vec::with_capacity(p);
    let mut cumulative = norm_weights[0];
    let mut idx = 0;
    for k in 0..p {
        let target = offset + k as f64 / p as f64;
        while cumulative < target && idx + 1 < p {
            idx += 1;
            cumulative += norm_weights[idx];
        }
        out.push(particles[idx]);
    }
    out
}

/// Random-walk Metropolis on logit(θ) targeting prior × likelihood^temp.
fn rejuvenate<R: Rng, L: Fn(f64) -> f64>(
    particles: &mut [f64],
    prior: BetaPrior,
    temp: f64,
    log_lik: &L,
    steps: usize,
    rng: &mut R,
) {
    let tempered = |theta: f64| {
        (prior.alpha - 1.0) * theta.ln()
            + (prior.beta - 1.0) * (1.0 - theta).ln()
            + temp * log_lik(theta)
    };
    // Jacobian of the logit transform
    let log_jacobian = |theta: f64| theta.ln() + (1.0 - theta).ln();

    for theta in particles.iter_mut() {
        let mut current = *theta;
        let mut logp = tempered(current) + log_jacobian(current);
        for _ in 0..steps {
            let eps: f64 = rng.sample(Normal::standard());
            let z = (current / (1.0 - current)).ln() + LOGIT_STEP * eps;
            let proposal = 1.0 / (1.0 + (-z).exp());
            let logp_prop = tempered(proposal) + log_jacobian(proposal);
            let u: f64 = rng.gen_range(0.0..1.0);
            if u.ln() < logp_prop - logp {
                current = proposal;
                logp = logp_prop;
            }
        }
        *theta = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tracks_the_closed_form() {
        let prior = BetaPrior::new(4.0, 8.0);
        let est = marginal_likelihood(prior, 9, 30, SmcConfig::default());
        let exact = exact_log_marginal_likelihood(prior, 9, 30);
        assert!(
            (est.log_marginal_likelihood - exact).abs() < 0.15,
            "estimate {} vs exact {exact}",
            est.log_marginal_likelihood
        );
        assert!(est.ess_min > 0.0);
    }

    #[test]
    fn factor_agrees_with_the_exact_ratio() {
        let p0 = BetaPrior::new(4.0, 8.0);
        let p1 = BetaPrior::new(8.0, 4.0);
        let bf = bayes_factor(p0, p1, 9, 30, SmcConfig { seed: 5, ..SmcConfig::default() });
        let exact = (exact_log_marginal_likelihood(p0, 9, 30)
            - exact_log_marginal_likelihood(p1, 9, 30))
        .exp();
        assert!(bf > 1.0, "9/30 heads must favor Beta(4, 8), got {bf}");
        assert!(
            bf / exact > 0.5 && bf / exact < 2.0,
            "estimate {bf} vs exact {exact}"
        );
    }

    #[test]
    fn estimates_are_deterministic_per_seed() {
        let prior = BetaPrior::new(2.0, 2.0);
        let a = marginal_likelihood(prior, 3, 10, SmcConfig::default());
        let b = marginal_likelihood(prior, 3, 10, SmcConfig::default());
        assert_eq!(a.log_marginal_likelihood, b.log_marginal_likelihood);
    }

    #[test]
    fn systematic_resample_concentrates_on_heavy_particles() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let particles = [0.1, 0.5, 0.9];
        let weights = [0.0, 1.0, 0.0];
        let out = systematic_resample(&particles, &weights, &mut rng);
        assert!(out.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn zero_heads_is_handled() {
        // h·ln θ with h = 0 must contribute nothing, not NaN.
        let prior = BetaPrior::new(1.0, 1.0);
        let est = marginal_likelihood(prior, 0, 5, SmcConfig::default());
        let exact = exact_log_marginal_likelihood(prior, 0, 5);
        assert!((est.log_marginal_likelihood - exact).abs() < 0.2);
    }
}
