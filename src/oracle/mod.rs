//! Boundary to the combinatorial audit engine used for Athena round sizing.
//!
//! The Athena method delegates two questions to an external engine: how much
//! risk a set of observed winner counts has actually spent, and how large
//! the next round must be to reach a target one-round stopping probability.
//! [`AuditOracle`] is the narrow adapter for those two questions;
//! [`CombinatorialOracle`] is the bundled implementation. The [`shim`]
//! module translates the ballot-polling calling convention (vote shares and
//! cumulative counts) into the oracle's election-wide one.

pub mod engine;
pub mod shim;

pub use engine::CombinatorialOracle;
pub use shim::athena_round_size;

use serde::Serialize;

use crate::error::AuditError;

/// Stopping rule family the oracle applies when solving boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditModel {
    /// Likelihood-ratio check plus cumulative tail check.
    Athena,
    /// Cumulative tail check only.
    Minerva,
    /// Cumulative tail check with memory of earlier rounds' mass.
    Metis,
    /// Likelihood-ratio check only, on the planned round schedule.
    Arlo,
    /// Likelihood-ratio check applied ballot-by-ballot.
    Bravo,
}

/// A two-or-more-candidate election as the oracle sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ElectionSpec {
    /// Risk limit.
    pub alpha: f64,
    /// Worst-case likelihood-ratio bound for the models that check it.
    pub delta: f64,
    /// Candidate names, parallel to `tallies`.
    pub candidates: Vec<String>,
    /// Reported tallies, parallel to `candidates`.
    pub tallies: Vec<u64>,
    /// Total ballots cast, including ballots for no listed candidate.
    pub total_ballots: u64,
    /// Number of reported winners.
    pub winners: u32,
    /// Stopping rule to apply.
    pub model: AuditModel,
}

/// Achieved-risk report for a completed set of rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    /// Smallest positive risk ratio over the audited rounds.
    pub risk: f64,
    /// Observed likelihood ratio at the last round.
    pub delta: f64,
    /// Whether any round's observation met its stopping threshold.
    pub passed: bool,
    /// Cumulative winner counts the audit observed, per round.
    pub observed: Vec<u64>,
    /// Winner counts the boundary required, per round.
    pub required: Vec<u64>,
}

/// Next-round sizes for a list of target stopping probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSizeReport {
    /// Recommended cumulative next-round size per target, in election-wide
    /// ballots (worst pair governs).
    pub future_round_sizes: Vec<u64>,
    /// Achieved cumulative stopping probability per target.
    pub prob_stop: Vec<f64>,
}

/// The two questions Athena asks of the combinatorial engine.
pub trait AuditOracle {
    /// Measure the risk spent by `observations` (cumulative winner counts,
    /// one per completed round of `round_schedule`).
    fn find_risk(
        &self,
        spec: &ElectionSpec,
        round_schedule: &[u64],
        observations: &[u64],
    ) -> Result<RiskReport, AuditError>;

    /// Find the next cumulative round size reaching each target one-round
    /// stopping probability, assuming the reported outcome is correct.
    fn find_next_round_sizes(
        &self,
        spec: &ElectionSpec,
        round_schedule: &[u64],
        pstop_goals: &[f64],
    ) -> Result<RoundSizeReport, AuditError>;
}
