//! Small numerical helpers shared by the stopping-boundary solvers.

use statrs::distribution::{Binomial, Discrete};

use crate::error::AuditError;

/// Tabulate the Binomial(n, p) probability mass function over 0..=n.
///
/// Both boundary solvers convolve their state tables against this row once
/// per round, so it is computed eagerly rather than point-by-point.
pub(crate) fn binomial_row(n: u64, p: f64) -> Result<Vec<f64>, AuditError> {
    let dist = Binomial::new(p, n).map_err(|_| AuditError::InvalidMargin(2.0 * p - 1.0))?;
    Ok((0..=n).map(|k| dist.pmf(k)).collect())
}

/// Convolve a probability table with a fresh-draws pmf row.
///
/// `prev` is sparse after the absorption clamp (everything at or above the
/// previous threshold is zero), so zero entries are skipped.
pub(crate) fn convolve(prev: &[f64], row: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; prev.len() + row.len() - 1];
    for (i, &p) in prev.iter().enumerate() {
        if p == 0.0 {
            continue;
        }
        for (j, &r) in row.iter().enumerate() {
            out[i + j] += p * r;
        }
    }
    out
}

/// Sum of `table[from..]`: the mass at or above a candidate threshold.
pub(crate) fn tail_sum(table: &[f64], from: usize) -> f64 {
    if from >= table.len() {
        0.0
    } else {
        table[from..].iter().sum()
    }
}
