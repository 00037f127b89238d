//! Core data types shared across audit methods.
//!
//! All inputs are fully materialized maps supplied by the sampling layer.
//! `IndexMap` preserves the caller's insertion order, which doubles as the
//! reporting order: the ballot-comparison p-value trajectory depends on the
//! order sampled ballots are processed, so the sampled CVR map must be built
//! in draw order.

use indexmap::IndexMap;
use serde::Serialize;

/// Opaque ballot identifier assigned by the sampling layer.
pub type BallotId = String;

/// Cumulative votes observed (or reported) per candidate.
pub type CandidateCounts = IndexMap<String, u64>;

/// Cumulative ballot-polling sample, per contest.
pub type SampleResults = IndexMap<String, CandidateCounts>;

/// One ballot's recorded or audited marks: contest -> candidate -> 0/1.
pub type BallotMarks = IndexMap<String, IndexMap<String, u64>>;

/// A set of cast-vote records keyed by ballot id. Used both for the full CVR
/// universe and for the audited subset.
pub type CvrSet = IndexMap<BallotId, BallotMarks>;

/// Reported results for a single contest. Immutable once an audit begins.
#[derive(Debug, Clone, Serialize)]
pub struct Contest {
    /// Reported vote tally per candidate.
    pub votes: CandidateCounts,
    /// Total ballots cast in the contest.
    pub ballots: u64,
    /// Number of winners the contest elects.
    pub num_winners: u32,
}

impl Contest {
    /// Build a contest from reported tallies.
    pub fn new(votes: CandidateCounts, ballots: u64, num_winners: u32) -> Self {
        Self {
            votes,
            ballots,
            num_winners,
        }
    }
}

/// The set of audited contests, keyed by contest name.
pub type Contests = IndexMap<String, Contest>;
