//! Data loading, polynomial feature expansion, and standardization.
//!
//! The regression models in this crate are fitted on standardized data: each
//! feature column and the target vector are shifted and scaled to zero mean
//! and unit standard deviation. The statistics are estimated once, on the
//! training design, and any prediction-time input must be transformed with the
//! same [`Standardizer`]; recomputing them per input would make the fitted
//! coefficients meaningless.

use crate::Error;
use ndarray::{Array1, Array2};
use std::fs;
use std::path::Path;

/// Read a two-column numeric table, whitespace- or comma-delimited.
///
/// Blank lines and lines starting with `#` are skipped. Extra columns after
/// the first two are ignored.
pub fn load_xy(path: impl AsRef<Path>) -> Result<(Array1<f64>, Array1<f64>), Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line
            .split(|ch: char| ch.is_whitespace() || ch == ',')
            .filter(|f| !f.is_empty());
        let mut next_number = || -> Result<f64, Error> {
            fields
                .next()
                .and_then(|f| f.parse().ok())
                .ok_or_else(|| Error::Parse {
                    line: idx + 1,
                    found: line.to_string(),
                })
        };
        xs.push(next_number()?);
        ys.push(next_number()?);
    }
    if xs.is_empty() {
        return Err(Error::Parse {
            line: 0,
            found: "no data rows".to_string(),
        });
    }
    Ok((Array1::from(xs), Array1::from(ys)))
}

/// Design matrix with columns x¹…xᵏ.
///
/// No intercept column: the intercept is a separate model parameter in
/// [`crate::regression::PolyRegression`].
///
/// # Panics
/// Panics if `order` is zero (a pure-intercept model has an empty design).
pub fn polynomial_design(x: &Array1<f64>, order: usize) -> Array2<f64> {
    assert!(order >= 1, "polynomial order must be at least 1");
    Array2::from_shape_fn((x.len(), order), |(i, j)| x[i].powi(j as i32 + 1))
}

/// Per-column standardization statistics, fitted on the training design.
#[derive(Debug, Clone)]
pub struct Standardizer {
    means: Array1<f64>,
    sds: Array1<f64>,
}

impl Standardizer {
    /// Fit column means and (population) standard deviations.
    ///
    /// A zero-variance column is a fatal precondition violation, not a silent
    /// division.
    pub fn fit(design: &Array2<f64>) -> Result<Self, Error> {
        let mut means = Array1::zeros(design.ncols());
        let mut sds = Array1::zeros(design.ncols());
        for (j, col) in design.columns().into_iter().enumerate() {
            let mean = col.mean().unwrap_or(0.0);
            let sd = col.std(0.0);
            if !(sd > 0.0) || !sd.is_finite() {
                return Err(Error::DegenerateColumn { index: j });
            }
            means[j] = mean;
            sds[j] = sd;
        }
        Ok(Self { means, sds })
    }

    /// Apply the fitted statistics to a design with the same column layout.
    ///
    /// # Panics
    /// Panics if the column count differs from the fitted design.
    pub fn transform(&self, design: &Array2<f64>) -> Array2<f64> {
        assert_eq!(
            design.ncols(),
            self.means.len(),
            "design has a different number of columns than the fitted one"
        );
        Array2::from_shape_fn(design.dim(), |(i, j)| {
            (design[(i, j)] - self.means[j]) / self.sds[j]
        })
    }

    /// Fit and transform in one step.
    pub fn fit_transform(design: &Array2<f64>) -> Result<(Self, Array2<f64>), Error> {
        let fitted = Self::fit(design)?;
        let transformed = fitted.transform(design);
        Ok((fitted, transformed))
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn sds(&self) -> &Array1<f64> {
        &self.sds
    }
}

/// Standardization statistics for the target vector.
#[derive(Debug, Clone, Copy)]
pub struct ScalarStandardizer {
    pub mean: f64,
    pub sd: f64,
}

impl ScalarStandardizer {
    pub fn fit(y: &Array1<f64>) -> Result<Self, Error> {
        let mean = y.mean().unwrap_or(0.0);
        let sd = y.std(0.0);
        if !(sd > 0.0) || !sd.is_finite() {
            return Err(Error::DegenerateTarget);
        }
        Ok(Self { mean, sd })
    }

    pub fn transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| (v - self.mean) / self.sd)
    }

    /// Map a standardized value back to the original scale.
    pub fn inverse(&self, z: f64) -> f64 {
        z * self.sd + self.mean
    }

    pub fn fit_transform(y: &Array1<f64>) -> Result<(Self, Array1<f64>), Error> {
        let fitted = Self::fit(y)?;
        let transformed = fitted.transform(y);
        Ok((fitted, transformed))
    }
}
