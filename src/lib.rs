//! # ballot-audit
//!
//! Statistical engine for risk-limiting post-election audits.
//!
//! Given reported tallies and a cumulative random sample of ballots, this
//! crate answers two questions:
//! - Does the sample furnish statistically sufficient evidence that the
//!   reported outcome is correct, at a configured risk limit?
//! - If not, how many more ballots should the next round draw?
//!
//! Three methods are provided behind one dispatch surface:
//! - **Athena** - ballot polling; rounds sized by a combinatorial engine
//!   that solves exact pairwise stopping boundaries.
//! - **Aurror** - ballot polling; rounds sized against a dynamic-programming
//!   stopping boundary over a planned round schedule.
//! - **SuperSimple** - ballot comparison; sampled ballots are checked
//!   against their cast-vote records under a Kaplan-Markov bound.
//!
//! The engine is pure and synchronous: no I/O, no persistent state. Ballot
//! selection, result storage, and audit workflow live with the caller.
//!
//! ## Quick Start
//!
//! ```
//! use ballot_audit::{
//!     compute_margins, AuditStrategy, Contest, Contests, RiskMeasurement,
//!     SampleObservations, SampleResults,
//! };
//!
//! let mut contests = Contests::new();
//! contests.insert(
//!     "mayor".to_string(),
//!     Contest::new(
//!         [("alice".to_string(), 600u64), ("bob".to_string(), 400)]
//!             .into_iter()
//!             .collect(),
//!         1_000,
//!         1,
//!     ),
//! );
//! let margins = compute_margins(&contests);
//!
//! let audit = AuditStrategy::aurror(0.1)?;
//! let mut sample_results = SampleResults::new();
//! sample_results.insert(
//!     "mayor".to_string(),
//!     [("alice".to_string(), 70u64), ("bob".to_string(), 30)]
//!         .into_iter()
//!         .collect(),
//! );
//! let (measurement, finished) = audit.compute_risk(
//!     &contests,
//!     &margins,
//!     SampleObservations::VoteCounts(&sample_results),
//! )?;
//! assert!(finished);
//! assert!(matches!(measurement, RiskMeasurement::Pairwise(_)));
//! # Ok::<(), ballot_audit::AuditError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod stats;

// Functional modules
pub mod comparison;
pub mod config;
pub mod error;
pub mod margin;
pub mod oracle;
pub mod polling;
pub mod strategy;
pub mod types;

// Re-exports for public API
pub use comparison::SuperSimple;
pub use config::{ComparisonConfig, PollingConfig};
pub use error::AuditError;
pub use margin::{compute_margins, ContestMargins, LoserShare, Margins, WinnerShare};
pub use oracle::{AuditModel, AuditOracle, CombinatorialOracle, ElectionSpec};
pub use polling::{
    Athena, Aurror, AsnEstimate, BoundaryPlan, ContestSizing, PairwiseStat, SizeEstimate,
};
pub use strategy::{AuditStrategy, RiskMeasurement, SampleObservations, SizingRecommendation};
pub use types::{
    BallotId, BallotMarks, CandidateCounts, Contest, Contests, CvrSet, SampleResults,
};
