//! Shannon entropy of discrete distributions.
//!
//! Closes the analysis with the information-theoretic view of model fit: the
//! entropy of an empirically estimated "true" distribution is put side by
//! side with candidate approximating pmfs over the same finite support.

use std::fmt;

/// Base-e Shannon entropy, with the 0·ln 0 = 0 convention.
///
/// The input is expected to be a normalized pmf; entries are used as given.
pub fn entropy(pmf: &[f64]) -> f64 {
    pmf.iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum()
}

/// Frequency estimate of a pmf over the support `0..support`.
///
/// # Panics
/// Panics if `support` is zero or no draw falls inside the support.
pub fn empirical_pmf(draws: &[usize], support: usize) -> Vec<f64> {
    assert!(support > 0, "empty support");
    let mut counts = vec![0.0_f64; support];
    for &d in draws {
        if d < support {
            counts[d] += 1.0;
        }
    }
    let total: f64 = counts.iter().sum();
    assert!(total > 0.0, "no draws fell inside the support");
    counts.iter().map(|c| c / total).collect()
}

/// Named pmfs lined up for a side-by-side entropy report.
#[derive(Debug, Clone, Default)]
pub struct EntropyReport {
    rows: Vec<EntropyRow>,
}

#[derive(Debug, Clone)]
pub struct EntropyRow {
    pub name: String,
    pub pmf: Vec<f64>,
    pub entropy: f64,
}

impl EntropyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a distribution; its entropy is computed on insertion.
    pub fn push(&mut self, name: impl Into<String>, pmf: Vec<f64>) {
        let entropy = entropy(&pmf);
        self.rows.push(EntropyRow {
            name: name.into(),
            pmf,
            entropy,
        });
    }

    pub fn rows(&self) -> &[EntropyRow] {
        &self.rows
    }
}

impl fmt::Display for EntropyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:<10}", "distribution", "entropy")?;
        writeln!(f, "{}", "-".repeat(30))?;
        for row in &self.rows {
            writeln!(f, "{:<20} {:<10.2}", row.name, row.entropy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn uniform_entropy_is_ln_k() {
        for k in [2usize, 5, 10, 100] {
            let pmf = vec![1.0 / k as f64; k];
            assert_relative_eq!(entropy(&pmf), (k as f64).ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn point_mass_entropy_is_zero() {
        let pmf = [0.0, 0.0, 1.0, 0.0];
        assert_eq!(entropy(&pmf), 0.0);
    }

    #[test]
    fn empirical_pmf_normalizes_counts() {
        let draws = [0, 0, 1, 2, 2, 2];
        let pmf = empirical_pmf(&draws, 3);
        assert_relative_eq!(pmf[0], 2.0 / 6.0);
        assert_relative_eq!(pmf[1], 1.0 / 6.0);
        assert_relative_eq!(pmf[2], 3.0 / 6.0);
        assert_relative_eq!(pmf.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn out_of_support_draws_are_dropped() {
        let draws = [0, 1, 9, 9, 9];
        let pmf = empirical_pmf(&draws, 2);
        assert_relative_eq!(pmf[0], 0.5);
        assert_relative_eq!(pmf[1], 0.5);
    }

    #[test]
    fn report_lists_rows_in_insertion_order() {
        let mut report = EntropyReport::new();
        report.push("uniform", vec![0.25; 4]);
        report.push("point", vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(report.rows().len(), 2);
        assert_eq!(report.rows()[0].name, "uniform");
        assert_relative_eq!(report.rows()[0].entropy, 4f64.ln());
        assert_eq!(report.rows()[1].entropy, 0.0);
    }

    proptest! {
        #[test]
        fn uniform_maximizes_entropy_over_its_support(
            raw in prop::collection::vec(0.01..10.0f64, 2..20)
        ) {
            let total: f64 = raw.iter().sum();
            let pmf: Vec<f64> = raw.iter().map(|v| v / total).collect();
            let k = pmf.len() as f64;
            prop_assert!(entropy(&pmf) <= k.ln() + 1e-9);
            prop_assert!(entropy(&pmf) >= 0.0);
        }
    }
}
