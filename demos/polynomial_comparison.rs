//! Compare Bayesian polynomial regression models of increasing order.
//!
//! The analysis:
//! 1. Loads a two-column dataset (path as the first argument) or falls back to
//!    a small built-in one.
//! 2. Standardizes the polynomial features and the target.
//! 3. Fits a linear (order 1) and an order-2 model by Gibbs sampling.
//! 4. Runs posterior-predictive checks on the mean and IQR statistics.
//! 5. Compares the models by WAIC with Bayesian-bootstrap pseudo-BMA weights.
//! 6. Draws a 50/50 weighted mixture of both posterior predictives.
//! 7. Sweeps OLS polynomial fits over degrees 0..5 to show R² always
//!    rewarding complexity.

use bayescmp::compare::{self, WeightMethod};
use bayescmp::data::{ScalarStandardizer, Standardizer, load_xy, polynomial_design};
use bayescmp::mixture::weighted_posterior_predictive;
use bayescmp::regression::{PolyRegression, RegressionPriors, polyfit, r_squared};
use bayescmp::stats::{iqr, mean, percentile};
use ndarray::{Array1, s};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;

const ORDER: usize = 2;
const BURN_IN: usize = 1000;
const SAMPLES: usize = 2000;
const CHAINS: usize = 4;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let (x, y) = match std::env::args().nth(1) {
        Some(path) => load_xy(path)?,
        None => dummy_data(),
    };
    println!("dataset: {} points", x.len());

    // Feature expansion and standardization; prediction-time inputs reuse the
    // same fitted statistics.
    let design = polynomial_design(&x, ORDER);
    let (standardizer, xs) = Standardizer::fit_transform(&design)?;
    let (_, ys) = ScalarStandardizer::fit_transform(&y)?;

    // Linear model: first power only. Polynomial model: all columns.
    let xs_linear = xs.slice(s![.., ..1]).to_owned();
    let linear = PolyRegression::new(xs_linear, ys.clone(), RegressionPriors::default(), CHAINS, 42)
        .run(BURN_IN, SAMPLES)?;
    let poly = PolyRegression::new(xs.clone(), ys.clone(), RegressionPriors::default(), CHAINS, 43)
        .run(BURN_IN, SAMPLES)?;

    println!("\n== linear model ==");
    linear.summary();
    println!("\n== order-{ORDER} model ==");
    poly.summary();

    // Posterior-mean curves over an evenly spaced grid of new inputs,
    // transformed with the training statistics.
    let x_min = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let grid = Array1::from_iter((0..100).map(|i| x_min + (x_max - x_min) * i as f64 / 99.0));
    let grid_design = standardizer.transform(&polynomial_design(&grid, ORDER));
    let linear_curve = linear.mean_curve(&grid_design.slice(s![.., ..1]).to_owned());
    let poly_curve = poly.mean_curve(&grid_design);
    println!(
        "\nposterior-mean curve endpoints (standardized): linear [{:.3}, {:.3}], order-{ORDER} [{:.3}, {:.3}]",
        linear_curve[0],
        linear_curve[99],
        poly_curve[0],
        poly_curve[99]
    );

    // Posterior predictive checks: mean and IQR, as in the source analysis.
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let linear_pred = linear.posterior_predictive(200, &mut rng);
    let poly_pred = poly.posterior_predictive(2000, &mut rng);

    println!("\n== posterior-predictive summaries (standardized target) ==");
    summarize("data", ys.as_slice().expect("contiguous"));
    summarize("linear model", linear_pred.draws.as_slice().expect("contiguous"));
    summarize("order-2 model", poly_pred.draws.as_slice().expect("contiguous"));

    println!("\n== predictive checks ==");
    for check in linear_pred
        .standard_checks(&ys)
        .iter()
        .chain(poly_pred.standard_checks(&ys).iter())
    {
        println!("{check}");
    }

    // WAIC comparison with Bayesian-bootstrap pseudo-BMA weights.
    let w_linear = compare::waic(linear.log_likelihood().view());
    let w_poly = compare::waic(poly.log_likelihood().view());
    let table = compare::compare(
        &[("linear", &w_linear), ("order_2", &w_poly)],
        WeightMethod::BbPseudoBma { replicates: 1000 },
        &mut rng,
    );
    println!("\n== model comparison (WAIC, BB-pseudo-BMA) ==\n{table}");

    // Fixed 50/50 mixture of the two posterior predictives.
    let mix = weighted_posterior_predictive(
        &[linear_pred.draws.view(), poly_pred.draws.view()],
        &[0.5, 0.5],
        1000,
        &mut rng,
    )?;
    summarize("weighted mixture", mix.draws.as_slice().expect("contiguous"));
    let from_linear = mix.sources.iter().filter(|&&m| m == 0).count();
    println!(
        "mixture sources: {from_linear} draws from linear, {} from order-2",
        mix.sources.len() - from_linear
    );

    // OLS degree sweep: raw fit quality always rewards complexity.
    println!("\n== OLS R² by degree ==");
    let xv = x.to_vec();
    let yv = y.to_vec();
    for degree in [0usize, 1, 2, 5] {
        if xv.len() <= degree {
            continue;
        }
        let coeffs = polyfit(&xv, &yv, degree);
        println!("order {degree}: R² = {:.2}", r_squared(&coeffs, &xv, &yv));
    }

    Ok(())
}

fn summarize(label: &str, values: &[f64]) {
    println!(
        "{label:<18} mean {:>7.3}   IQR {:>7.3}   [p25 {:>7.3}, p75 {:>7.3}]",
        mean(values),
        iqr(values),
        percentile(values, 25.0),
        percentile(values, 75.0)
    );
}

fn dummy_data() -> (Array1<f64>, Array1<f64>) {
    (
        Array1::from(vec![4.0, 5.0, 6.0, 9.0, 12.0, 14.0]),
        Array1::from(vec![4.2, 6.0, 6.0, 9.0, 10.0, 10.0]),
    )
}
