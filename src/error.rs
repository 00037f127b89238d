//! Error types for audit computations.

use thiserror::Error;

/// Error returned when an audit computation cannot produce a valid risk
/// measurement or sample-size recommendation.
///
/// Every variant is a caller-visible failure: each one indicates a broken
/// risk guarantee, so the engine surfaces it rather than silently recovering.
/// The engine never reports a finished audit on invalid or incomplete data.
/// Single-candidate and tied races are *not* errors; they produce sentinel
/// sizing outcomes instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    /// Risk limit outside the open interval (0, 1).
    #[error("risk limit must be in (0, 1), got {0}")]
    InvalidRiskLimit(f64),

    /// Margin outside the range a boundary solver can handle, or NaN.
    #[error("margin {0} is outside the valid range for a stopping boundary")]
    InvalidMargin(f64),

    /// Round schedule is empty where one is required, or not strictly
    /// increasing.
    #[error("round schedule must be strictly increasing and start above zero")]
    InvalidRoundSchedule,

    /// Target one-round stopping probability outside (0, 1).
    #[error("completion probability must be in (0, 1), got {0}")]
    InvalidCompletionProbability(f64),

    /// Comparison-audit tuning parameters that break the Kaplan-Markov bound
    /// (gamma must exceed 1, lambda must lie in [0, 1]).
    #[error("invalid comparison parameters: gamma {gamma}, lambda {lambda}")]
    InvalidComparisonConfig {
        /// Error-inflation factor supplied by the caller.
        gamma: f64,
        /// One-vote overstatement weight supplied by the caller.
        lambda: f64,
    },

    /// The pairwise oracle needs at least two candidates with tallies.
    #[error("a pairwise boundary requires at least two candidates with tallies")]
    NotEnoughCandidates,

    /// Diluted margin of zero (an exact tie across all audited contests)
    /// makes sample-size computation divide by zero.
    #[error("diluted margin is zero; sample size is undefined for an exact tie")]
    DegenerateMargin,

    /// A contest present in the reported results has no derived margin entry.
    #[error("no margins for contest {0:?}")]
    MissingMargins(String),

    /// A contest claimed as sampled has no entry in the sample results.
    #[error("no sample results for contest {0:?}")]
    MissingSampleResults(String),

    /// A sampled ballot has no entry in the CVR universe.
    #[error("ballot {0:?} is missing from the CVR universe")]
    MissingBallot(String),

    /// The observations supplied do not match the audit method (e.g. CVRs
    /// handed to a ballot-polling method).
    #[error("sample observations do not match the audit method; expected {expected}")]
    SampleKindMismatch {
        /// The observation kind the selected method consumes.
        expected: &'static str,
    },
}

/// Validate a risk limit, returning it unchanged if usable.
pub(crate) fn check_risk_limit(risk_limit: f64) -> Result<f64, AuditError> {
    if risk_limit > 0.0 && risk_limit < 1.0 {
        Ok(risk_limit)
    } else {
        Err(AuditError::InvalidRiskLimit(risk_limit))
    }
}
