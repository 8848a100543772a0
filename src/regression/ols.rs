//! Ordinary least-squares polynomial fits.
//!
//! A frequentist cross-check for the Bayesian models: sweeping the degree from
//! 0 (flat line at the mean, R² = 0) to n−1 (exact interpolation, R² = 1)
//! illustrates how raw fit quality always rewards complexity, which is what
//! the WAIC penalty in [`crate::compare`] corrects for.

use nalgebra::{DMatrix, DVector};

/// Least-squares polynomial fit of the given degree.
///
/// Returns coefficients lowest order first: `c₀ + c₁x + c₂x² + …`. The solve
/// runs through an SVD of the Vandermonde matrix, so rank-deficient designs
/// still yield the minimum-norm solution.
///
/// # Panics
/// Panics if `x` and `y` differ in length or if there are not more points
/// than coefficients.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Vec<f64> {
    assert_eq!(x.len(), y.len(), "x and y lengths differ");
    assert!(
        x.len() > degree,
        "need more than {degree} points for a degree-{degree} fit"
    );
    let n = x.len();
    let vandermonde = DMatrix::from_fn(n, degree + 1, |i, j| x[i].powi(j as i32));
    let rhs = DVector::from_column_slice(y);
    let svd = vandermonde.svd(true, true);
    let coeffs = svd
        .solve(&rhs, 1e-12)
        .expect("SVD solve cannot fail when U and V are computed");
    coeffs.iter().copied().collect()
}

/// Evaluate a polynomial (coefficients lowest order first) by Horner's rule.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Coefficient of determination of the fit at the observed points.
///
/// Computed as explained variance, SS_reg / SS_tot, which for a least-squares
/// fit with an intercept term equals the usual R².
pub fn r_squared(coeffs: &[f64], x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "x and y lengths differ");
    let ybar = y.iter().sum::<f64>() / y.len() as f64;
    let ssreg: f64 = x
        .iter()
        .map(|&xi| (polyval(coeffs, xi) - ybar).powi(2))
        .sum();
    let sstot: f64 = y.iter().map(|&yi| (yi - ybar).powi(2)).sum();
    ssreg / sstot
}
