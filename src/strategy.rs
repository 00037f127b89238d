//! Method selection and election-wide dispatch.
//!
//! An audit picks one method up front and keeps it for its whole lifetime;
//! the strategy wraps that choice behind a uniform surface over all audited
//! contests, so callers never branch on the method themselves.

use indexmap::IndexMap;
use serde::Serialize;

use crate::comparison::SuperSimple;
use crate::error::AuditError;
use crate::margin::Margins;
use crate::polling::{Athena, Aurror, ContestSizing, PairwiseStat};
use crate::types::{Contests, CvrSet, SampleResults};

/// The audit method driving an audit.
#[derive(Debug, Clone)]
pub enum AuditStrategy {
    /// Ballot polling with oracle-backed round sizing.
    Athena(Athena),
    /// Ballot polling with boundary-solver round sizing.
    Aurror(Aurror),
    /// Ballot comparison against cast-vote records.
    SuperSimple(SuperSimple),
}

/// Sample observations, matching the method's evidence kind.
#[derive(Debug, Clone, Copy)]
pub enum SampleObservations<'a> {
    /// Cumulative per-contest, per-candidate vote counts (ballot polling).
    VoteCounts(&'a SampleResults),
    /// Audited interpretations of sampled ballots plus the reported CVR
    /// universe they are checked against (ballot comparison).
    Cvrs {
        /// The full reported CVR universe.
        cvrs: &'a CvrSet,
        /// The audited sample, in draw order.
        sample: &'a CvrSet,
    },
}

/// Risk measurement shape, per method family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RiskMeasurement {
    /// Per-contest (winner, loser) p-values from ballot polling.
    Pairwise(IndexMap<String, PairwiseStat>),
    /// The single election-wide Kaplan-Markov p-value from comparison.
    Scalar(f64),
}

/// Sizing recommendation shape, per method family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SizingRecommendation {
    /// Ballot polling sizes each contest separately.
    PerContest(IndexMap<String, ContestSizing>),
    /// Comparison draws one sample covering every audited contest.
    Uniform(u64),
}

impl AuditStrategy {
    /// An Athena audit at the given risk limit.
    pub fn athena(risk_limit: f64) -> Result<Self, AuditError> {
        Ok(Self::Athena(Athena::new(risk_limit)?))
    }

    /// An Aurror audit at the given risk limit.
    pub fn aurror(risk_limit: f64) -> Result<Self, AuditError> {
        Ok(Self::Aurror(Aurror::new(risk_limit)?))
    }

    /// A SuperSimple comparison audit at the given risk limit.
    pub fn super_simple(risk_limit: f64) -> Result<Self, AuditError> {
        Ok(Self::SuperSimple(SuperSimple::new(risk_limit)?))
    }

    /// The method's risk limit.
    pub fn risk_limit(&self) -> f64 {
        match self {
            Self::Athena(method) => method.risk_limit(),
            Self::Aurror(method) => method.risk_limit(),
            Self::SuperSimple(method) => method.risk_limit(),
        }
    }

    /// Recommend sample sizes for the next round.
    ///
    /// `sample_results` carries any cumulative polling counts already drawn
    /// (ignored by the comparison method, which sizes from the reported
    /// tallies alone).
    pub fn get_sample_sizes(
        &self,
        contests: &Contests,
        margins: &Margins,
        sample_results: &SampleResults,
        total_ballots: u64,
    ) -> Result<SizingRecommendation, AuditError> {
        match self {
            Self::Athena(method) => Ok(SizingRecommendation::PerContest(
                method.get_sample_sizes(contests, margins, sample_results)?,
            )),
            Self::Aurror(method) => Ok(SizingRecommendation::PerContest(
                method.get_sample_sizes(contests, margins, sample_results)?,
            )),
            Self::SuperSimple(method) => Ok(SizingRecommendation::Uniform(
                method.get_sample_sizes(contests, margins, total_ballots)?,
            )),
        }
    }

    /// Measure the risk of the observations and decide whether the audit
    /// may stop.
    ///
    /// The observation kind must match the method; polling methods require
    /// a sample entry for every audited contest and stop only when every
    /// contest individually stops.
    pub fn compute_risk(
        &self,
        contests: &Contests,
        margins: &Margins,
        observations: SampleObservations<'_>,
    ) -> Result<(RiskMeasurement, bool), AuditError> {
        match (self, observations) {
            (Self::Athena(_) | Self::Aurror(_), SampleObservations::VoteCounts(sample_results)) => {
                let mut measurements = IndexMap::new();
                let mut finished = true;
                for name in contests.keys() {
                    let contest_margins = margins
                        .get(name)
                        .ok_or_else(|| AuditError::MissingMargins(name.clone()))?;
                    let sample = sample_results
                        .get(name)
                        .ok_or_else(|| AuditError::MissingSampleResults(name.clone()))?;
                    let (contest_measurements, contest_finished) = match self {
                        Self::Athena(method) => method.compute_risk(contest_margins, sample),
                        Self::Aurror(method) => method.compute_risk(contest_margins, sample),
                        Self::SuperSimple(_) => unreachable!(),
                    };
                    finished &= contest_finished;
                    measurements.insert(name.clone(), contest_measurements);
                }
                Ok((RiskMeasurement::Pairwise(measurements), finished))
            }
            (Self::SuperSimple(method), SampleObservations::Cvrs { cvrs, sample }) => {
                let (p, finished) = method.compute_risk(contests, margins, cvrs, sample)?;
                Ok((RiskMeasurement::Scalar(p), finished))
            }
            (Self::Athena(_) | Self::Aurror(_), SampleObservations::Cvrs { .. }) => {
                Err(AuditError::SampleKindMismatch {
                    expected: "per-candidate vote counts",
                })
            }
            (Self::SuperSimple(_), SampleObservations::VoteCounts(_)) => {
                Err(AuditError::SampleKindMismatch {
                    expected: "sampled ballot CVRs",
                })
            }
        }
    }
}
