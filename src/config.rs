//! Tuning parameters for the audit methods.
//!
//! Several constants in the published methods are explicitly provisional
//! (scaling ratios pending sharper analysis, Kaplan-Markov inflation factors
//! chosen by convention). They are kept here as configurable values rather
//! than hard-coded literals so operators can tighten them without touching
//! the method code.

use serde::Serialize;

use crate::error::AuditError;

/// Tuning parameters shared by the ballot-polling methods (Athena, Aurror).
#[derive(Debug, Clone, Serialize)]
pub struct PollingConfig {
    /// Scaling applied to the Wald-style asymptotic sample number.
    ///
    /// Both Athena and Aurror currently estimate their expected sample size
    /// as a fixed fraction of the BRAVO ASN. Provisional, pending a sharper
    /// method-specific estimate. Default: 0.5.
    pub asn_ratio: f64,

    /// Stopping probability reported alongside the ASN estimate.
    ///
    /// Provisional placeholder until the per-method stopping probability at
    /// the ASN is computed exactly. Default: 0.52.
    pub asn_stop_prob: f64,

    /// Target one-round confirmation probabilities for round sizing.
    ///
    /// Default: 0.7, 0.8, 0.9.
    pub quants: Vec<f64>,

    /// ASN multiples Aurror evaluates as candidate round sizes.
    ///
    /// Default: 1.2, 1.6, 2.1.
    pub asn_multiples: Vec<f64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            asn_ratio: 0.5,
            asn_stop_prob: 0.52,
            quants: vec![0.7, 0.8, 0.9],
            asn_multiples: vec![1.2, 1.6, 2.1],
        }
    }
}

/// Tuning parameters for the SuperSimple ballot-comparison method.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComparisonConfig {
    /// Error-inflation factor (gamma). Must exceed 1 so the per-ballot taint
    /// stays below 1 even for a two-vote overstatement. Default: 1.1.
    pub gamma: f64,

    /// Weight of one-vote overstatements in the sizing bound (lambda).
    /// Fixed by the method design, not operator-tunable in normal use.
    /// Default: 0.5.
    pub lambda: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            gamma: 1.1,
            lambda: 0.5,
        }
    }
}

impl ComparisonConfig {
    /// Check that the parameters keep the Kaplan-Markov bound valid.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.gamma > 1.0 && (0.0..=1.0).contains(&self.lambda) {
            Ok(())
        } else {
            Err(AuditError::InvalidComparisonConfig {
                gamma: self.gamma,
                lambda: self.lambda,
            })
        }
    }
}
