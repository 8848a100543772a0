//! End-to-end scenarios for the model-comparison pipeline, with fixed seeds
//! and analytic oracles where they exist.

use bayescmp::bayes_factor::{BetaPrior, ModelIndexBayesFactor, beta_bernoulli_log_likelihood};
use bayescmp::compare::{self, WeightMethod};
use bayescmp::data::{ScalarStandardizer, Standardizer, polynomial_design};
use bayescmp::mixture::weighted_posterior_predictive;
use bayescmp::regression::{PolyRegression, RegressionPriors, polyfit, r_squared};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const X: [f64; 6] = [4.0, 5.0, 6.0, 9.0, 12.0, 14.0];
const Y: [f64; 6] = [4.2, 6.0, 6.0, 9.0, 10.0, 10.0];

const PRIOR_0: BetaPrior = BetaPrior { alpha: 4.0, beta: 8.0 };
const PRIOR_1: BetaPrior = BetaPrior { alpha: 8.0, beta: 4.0 };

/// On the fixed six-point dataset, degree 0 explains nothing and the
/// saturated degree explains everything.
#[test]
fn ols_degree_sweep_brackets_r_squared() {
    let flat = polyfit(&X, &Y, 0);
    assert!(r_squared(&flat, &X, &Y).abs() < 1e-12);

    let saturated = polyfit(&X, &Y, X.len() - 1);
    assert!((r_squared(&saturated, &X, &Y) - 1.0).abs() < 1e-6);
}

/// The full regression pipeline on the fixed dataset: standardization
/// invariants hold, both models fit, and comparison weights form a simplex.
#[test]
fn regression_pipeline_produces_a_valid_comparison() {
    let x = Array1::from(X.to_vec());
    let y = Array1::from(Y.to_vec());

    let design = polynomial_design(&x, 2);
    let (_, xs) = Standardizer::fit_transform(&design).unwrap();
    let (_, ys) = ScalarStandardizer::fit_transform(&y).unwrap();

    for col in xs.columns() {
        assert!(col.mean().unwrap().abs() < 1e-10);
        assert!((col.std(0.0) - 1.0).abs() < 1e-10);
    }
    assert!(ys.mean().unwrap().abs() < 1e-10);
    assert!((ys.std(0.0) - 1.0).abs() < 1e-10);

    let xs_linear = xs.column(0).insert_axis(ndarray::Axis(1)).to_owned();
    let linear = PolyRegression::new(xs_linear, ys.clone(), RegressionPriors::default(), 2, 42)
        .run(500, 1000)
        .expect("linear fit failed");
    let poly = PolyRegression::new(xs, ys.clone(), RegressionPriors::default(), 2, 43)
        .run(500, 1000)
        .expect("order-2 fit failed");

    let w_linear = compare::waic(linear.log_likelihood().view());
    let w_poly = compare::waic(poly.log_likelihood().view());

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for method in [
        WeightMethod::PseudoBma,
        WeightMethod::BbPseudoBma { replicates: 500 },
    ] {
        let table = compare::compare(&[("linear", &w_linear), ("order_2", &w_poly)], method, &mut rng);
        let total: f64 = table.rows.iter().map(|r| r.weight).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(table.rows.iter().all(|r| r.weight >= 0.0));
        assert_eq!(table.rows[0].rank, 0);
        assert!(table.rows[0].waic <= table.rows[1].waic);
    }

    // Mixture of the two posterior predictives: requested size, exact
    // provenance, both sources present under 50/50 weights.
    let linear_pred = linear.posterior_predictive(400, &mut rng);
    let poly_pred = poly.posterior_predictive(400, &mut rng);
    let mix = weighted_posterior_predictive(
        &[linear_pred.draws.view(), poly_pred.draws.view()],
        &[0.5, 0.5],
        300,
        &mut rng,
    )
    .unwrap();
    assert_eq!(mix.draws.nrows(), 300);
    assert_eq!(mix.sources.len(), 300);
    assert!(mix.sources.iter().all(|&s| s < 2));
    assert!(mix.sources.iter().any(|&s| s == 0));
    assert!(mix.sources.iter().any(|&s| s == 1));
}

/// The model-index factor and the SMC marginal-likelihood ratio estimate the
/// same quantity: they must agree within sampling noise, and both must favor
/// Beta(4, 8) for 9 heads in 30 flips.
#[test]
fn gibbs_and_smc_bayes_factors_agree() {
    let model = ModelIndexBayesFactor::new([PRIOR_0, PRIOR_1], [0.5, 0.5], 9, 30, 4, 42);
    let results = model.run(1000, 5000).expect("MCMC failed");
    let bf_gibbs = results.bayes_factor().expect("both hypotheses keep mass");

    let config = bayescmp::smc::SmcConfig { seed: 5, ..Default::default() };
    let bf_smc = bayescmp::smc::bayes_factor(PRIOR_0, PRIOR_1, 9, 30, config);

    let bf_exact = (bayescmp::smc::exact_log_marginal_likelihood(PRIOR_0, 9, 30)
        - bayescmp::smc::exact_log_marginal_likelihood(PRIOR_1, 9, 30))
    .exp();

    assert!(bf_gibbs > 1.0, "Gibbs BF must favor Beta(4, 8), got {bf_gibbs}");
    assert!(bf_smc > 1.0, "SMC BF must favor Beta(4, 8), got {bf_smc}");

    let ratio = bf_gibbs / bf_smc;
    assert!(ratio > 0.5 && ratio < 2.0, "estimates disagree: {bf_gibbs} vs {bf_smc}");
    let vs_exact = bf_gibbs / bf_exact;
    assert!(vs_exact > 0.5 && vs_exact < 2.0, "Gibbs {bf_gibbs} vs exact {bf_exact}");
}

/// Ten times the data at the same proportion sharpens the
/// posterior, shrinks the per-observation WAIC SE, and strengthens the
/// evidence for the better prior (visible in the marginal-likelihood ratio).
#[test]
fn more_data_sharpens_posterior_and_evidence() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut se_per_obs = Vec::new();
    for (coins, heads) in [(30u64, 9u64), (300, 90)] {
        let w0 = compare::waic(
            beta_bernoulli_log_likelihood(PRIOR_0, heads, coins, 4000, &mut rng).view(),
        );
        let w1 = compare::waic(
            beta_bernoulli_log_likelihood(PRIOR_1, heads, coins, 4000, &mut rng).view(),
        );
        // The low-theta prior fits 30% heads better at either size.
        assert!(w0.waic < w1.waic, "coins={coins}: {} vs {}", w0.waic, w1.waic);
        se_per_obs.push(w0.se / coins as f64);
    }
    assert!(se_per_obs[1] < se_per_obs[0], "per-obs SE did not shrink: {se_per_obs:?}");

    // Posterior variance of θ under the better prior shrinks with the data:
    // Var[Beta(a, b)] = ab / ((a+b)²(a+b+1)).
    let post_var = |prior: BetaPrior, heads: f64, tails: f64| {
        let a = prior.alpha + heads;
        let b = prior.beta + tails;
        a * b / ((a + b).powi(2) * (a + b + 1.0))
    };
    assert!(post_var(PRIOR_0, 90.0, 210.0) < post_var(PRIOR_0, 9.0, 21.0));

    // Evidence ratio: the exact Bayes factor grows in magnitude with the
    // larger dataset.
    let exact_bf = |heads, coins| {
        (bayescmp::smc::exact_log_marginal_likelihood(PRIOR_0, heads, coins)
            - bayescmp::smc::exact_log_marginal_likelihood(PRIOR_1, heads, coins))
        .exp()
    };
    let small = exact_bf(9, 30);
    let large = exact_bf(90, 300);
    assert!(small > 1.0 && large > small, "BF did not grow: {small} vs {large}");
}
