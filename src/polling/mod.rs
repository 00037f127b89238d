//! Ballot-polling audit methods.
//!
//! Both methods in this family (Athena and Aurror) accumulate the same
//! BRAVO-style sequential likelihood ratio over sampled votes; they differ
//! only in how they size the next round. Athena consults the external
//! combinatorial oracle through the shim in [`crate::oracle`], while Aurror
//! evaluates candidate round sizes against its own dynamic-programming
//! stopping boundary.

pub mod athena;
pub mod aurror;
pub mod boundary;
pub mod statistic;

pub use athena::Athena;
pub use aurror::Aurror;
pub use boundary::{stopping_boundary, BoundaryPlan};
pub use statistic::{expected_sample_size, pairwise_risk, test_statistics, PairwiseStat};

use serde::Serialize;

/// A sample-size outcome for one contest.
///
/// `NoAudit` covers contests that pass by definition (no losers) or admit
/// no finite estimate (unanimous landslides); `FullCount` covers exact ties
/// that can only be resolved by counting every ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeEstimate {
    /// No audit needed; the reported outcome cannot be wrong.
    NoAudit,
    /// A full hand count of the given number of ballots.
    FullCount(u64),
    /// Draw this many ballots.
    Size(u64),
}

/// Expected-sample-size ("ASN") entry in a sizing recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AsnEstimate {
    /// The expected sample size under the reported outcome.
    pub size: SizeEstimate,
    /// Estimated probability the audit stops at the ASN, when known.
    pub prob: Option<f64>,
}

/// Per-contest sizing recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestSizing {
    /// Expected-sample-size entry.
    pub asn: AsnEstimate,
    /// Alternative sizes keyed by target one-round stopping probability.
    /// Empty for multi-winner contests, which only get an ASN estimate.
    pub quantiles: Vec<(f64, SizeEstimate)>,
}
