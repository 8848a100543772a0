//! Bayesian polynomial regression via Gibbs sampling.
//!
//! Competing regression models of increasing polynomial order share one
//! parametric form: normal priors on the intercept and slopes, a half-normal
//! prior on the noise scale, and a normal likelihood over the standardized
//! target. Keeping the prior families and scales identical across orders
//! isolates the model comparison to complexity (the number of slope terms)
//! rather than prior strength.
//!
//! # Available pieces
//! - [`PolyRegression`]: the Gibbs sampler; order 1 is the "linear" model.
//! - [`PolyRegressionResults`]: pooled trace, posterior predictive draws,
//!   pointwise log-likelihood for WAIC.
//! - [`polyfit`] / [`r_squared`]: ordinary least-squares cross-check.
//!
//! # Examples
//! See the demos directory for complete analyses.

pub use gibbs::{
    PolyRegression, PolyRegressionResults, PosteriorPredictive, PredictiveCheck, RegressionPriors,
};
pub use ols::{polyfit, polyval, r_squared};

mod gibbs;
mod ols;
