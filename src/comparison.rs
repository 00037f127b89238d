//! SuperSimple ballot-comparison audit.
//!
//! Comparison audits check sampled paper ballots against their cast-vote
//! records (CVRs) instead of polling them blind. Each sampled ballot
//! contributes a Kaplan-Markov factor to a running p-value: an exact match
//! shrinks it by `1 - 1/U`, while an overstatement (the CVR credited the
//! winner more than the paper shows) divides it by `1 - taint`. The audit
//! may stop once the p-value falls below the risk limit.
//!
//! One sample size covers all audited contests; the overall diluted margin
//! (smallest winner-loser vote margin over total ballots cast) governs it.

use tracing::trace;

use crate::config::ComparisonConfig;
use crate::error::{check_risk_limit, AuditError};
use crate::margin::Margins;
use crate::types::{Contests, CvrSet};

/// The SuperSimple audit method.
#[derive(Debug, Clone)]
pub struct SuperSimple {
    risk_limit: f64,
    config: ComparisonConfig,
}

impl SuperSimple {
    /// Create a SuperSimple audit at the given risk limit with default
    /// tuning (gamma 1.1, lambda 0.5).
    pub fn new(risk_limit: f64) -> Result<Self, AuditError> {
        Self::with_config(risk_limit, ComparisonConfig::default())
    }

    /// Create a SuperSimple audit with explicit tuning parameters.
    pub fn with_config(risk_limit: f64, config: ComparisonConfig) -> Result<Self, AuditError> {
        config.validate()?;
        Ok(Self {
            risk_limit: check_risk_limit(risk_limit)?,
            config,
        })
    }

    /// The configured risk limit.
    pub fn risk_limit(&self) -> f64 {
        self.risk_limit
    }

    /// Smallest winner-loser margin across all audited contests, divided by
    /// total ballots cast in the election.
    pub fn compute_diluted_margin(
        &self,
        contests: &Contests,
        margins: &Margins,
        total_ballots: u64,
    ) -> Result<f64, AuditError> {
        let mut closest_margin = total_ballots;
        for (name, contest) in contests {
            let contest_margins = margins
                .get(name)
                .ok_or_else(|| AuditError::MissingMargins(name.clone()))?;
            for winner in contest_margins.winners.keys() {
                for loser in contest_margins.losers.keys() {
                    let winner_votes = contest.votes.get(winner).copied().unwrap_or(0);
                    let loser_votes = contest.votes.get(loser).copied().unwrap_or(0);
                    // Winners outrank losers by construction.
                    let margin = winner_votes.saturating_sub(loser_votes);
                    closest_margin = closest_margin.min(margin);
                }
            }
        }
        Ok(closest_margin as f64 / total_ballots as f64)
    }

    /// Sample size expected to confirm all contests in one round, assuming
    /// no discrepancies.
    pub fn get_sample_sizes(
        &self,
        contests: &Contests,
        margins: &Margins,
        total_ballots: u64,
    ) -> Result<u64, AuditError> {
        let gamma = self.config.gamma;
        let rho = -self.risk_limit.ln()
            / (1.0 / (2.0 * gamma) + self.config.lambda * (1.0 - 1.0 / (2.0 * gamma)).ln());

        let diluted_margin = self.compute_diluted_margin(contests, margins, total_ballots)?;
        // Also rejects the NaN from a zero-ballot election.
        if !(diluted_margin > 0.0) {
            return Err(AuditError::DegenerateMargin);
        }
        Ok((rho / diluted_margin).ceil() as u64)
    }

    /// Kaplan-Markov p-value of the sampled ballots against their CVRs.
    ///
    /// `cvrs` is the full CVR universe; `sample_cvr` holds the audited
    /// interpretation of each sampled ballot, processed in iteration order.
    /// The reported measurement is the running minimum of the p-value, and
    /// `finished` latches once it drops below the risk limit. A sampled
    /// ballot with no record in `cvrs` is an error; a ballot missing an
    /// entry for some contest skips that contest only.
    pub fn compute_risk(
        &self,
        contests: &Contests,
        margins: &Margins,
        cvrs: &CvrSet,
        sample_cvr: &CvrSet,
    ) -> Result<(f64, bool), AuditError> {
        let gamma = self.config.gamma;
        let diluted_margin = self.compute_diluted_margin(contests, margins, cvrs.len() as u64)?;
        // An empty CVR universe gives 0/0 = NaN; reject that too.
        if !(diluted_margin > 0.0) {
            return Err(AuditError::DegenerateMargin);
        }
        let margin_votes = diluted_margin * cvrs.len() as f64;
        let u = 2.0 * gamma / diluted_margin;

        let mut p = 1.0f64;
        let mut lowest_p = 1.0f64;
        let mut finished = false;

        for (ballot_id, audited) in sample_cvr {
            let reported = cvrs
                .get(ballot_id)
                .ok_or_else(|| AuditError::MissingBallot(ballot_id.clone()))?;

            // Worst overstatement on this ballot over all pairs, as a
            // fraction of the pair's vote margin.
            let mut e_r = 0.0f64;
            for (name, contest) in contests {
                let (Some(audited_marks), Some(reported_marks)) =
                    (audited.get(name), reported.get(name))
                else {
                    continue;
                };
                let contest_margins = margins
                    .get(name)
                    .ok_or_else(|| AuditError::MissingMargins(name.clone()))?;
                for winner in contest_margins.winners.keys() {
                    for loser in contest_margins.losers.keys() {
                        let mark = |marks: &indexmap::IndexMap<String, u64>, candidate: &str| {
                            marks.get(candidate).copied().unwrap_or(0) as i64
                        };
                        let v_w = mark(reported_marks, winner);
                        let a_w = mark(audited_marks, winner);
                        let v_l = mark(reported_marks, loser);
                        let a_l = mark(audited_marks, loser);

                        let winner_votes = contest.votes.get(winner).copied().unwrap_or(0);
                        let loser_votes = contest.votes.get(loser).copied().unwrap_or(0);
                        let pair_margin = winner_votes.saturating_sub(loser_votes) as f64;

                        let e = ((v_w - a_w) - (v_l - a_l)) as f64 / pair_margin;
                        if e > e_r {
                            e_r = e;
                        }
                    }
                }
            }

            // Per-ballot Kaplan-Markov factor. gamma > 1 keeps the taint
            // below 1 even for a two-vote overstatement on the closest pair.
            let taint = e_r * margin_votes / (2.0 * gamma);
            p *= (1.0 - 1.0 / u) / (1.0 - taint);
            trace!(ballot = %ballot_id, e_r, taint, p, "comparison update");

            if p < lowest_p {
                lowest_p = p;
            }
            if p < self.risk_limit {
                finished = true;
            }
        }

        Ok((lowest_p, finished))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::compute_margins;
    use crate::types::{BallotMarks, CandidateCounts, Contest};
    use indexmap::IndexMap;

    fn two_contests() -> (Contests, Margins) {
        let mut contests = Contests::new();
        let close: CandidateCounts = [("w".to_string(), 5_100u64), ("l".to_string(), 4_900)]
            .into_iter()
            .collect();
        contests.insert("close".to_string(), Contest::new(close, 10_000, 1));
        let wide: CandidateCounts = [("w".to_string(), 8_000u64), ("l".to_string(), 2_000)]
            .into_iter()
            .collect();
        contests.insert("wide".to_string(), Contest::new(wide, 10_000, 1));
        let margins = compute_margins(&contests);
        (contests, margins)
    }

    fn matching_ballot(contests: &[&str]) -> BallotMarks {
        contests
            .iter()
            .map(|name| {
                let marks: IndexMap<String, u64> =
                    [("w".to_string(), 1u64), ("l".to_string(), 0)]
                        .into_iter()
                        .collect();
                (name.to_string(), marks)
            })
            .collect()
    }

    #[test]
    fn diluted_margin_uses_closest_pair() {
        let (contests, margins) = two_contests();
        let audit = SuperSimple::new(0.1).unwrap();
        let dm = audit
            .compute_diluted_margin(&contests, &margins, 10_000)
            .unwrap();
        assert!((dm - 0.02).abs() < 1e-12);
    }

    #[test]
    fn sample_size_follows_kaplan_markov_bound() {
        let (contests, margins) = two_contests();
        let audit = SuperSimple::new(0.1).unwrap();
        // rho = 15.2008 at alpha 0.1, gamma 1.1, lambda 0.5; over a 2%
        // margin that is 761 ballots.
        assert_eq!(
            audit.get_sample_sizes(&contests, &margins, 10_000).unwrap(),
            761
        );
    }

    #[test]
    fn tied_contest_cannot_be_sized() {
        let mut contests = Contests::new();
        let votes: CandidateCounts = [("a".to_string(), 500u64), ("b".to_string(), 500)]
            .into_iter()
            .collect();
        contests.insert("tied".to_string(), Contest::new(votes, 1_000, 1));
        let margins = compute_margins(&contests);
        let audit = SuperSimple::new(0.1).unwrap();
        assert!(matches!(
            audit.get_sample_sizes(&contests, &margins, 1_000),
            Err(AuditError::DegenerateMargin)
        ));
    }

    #[test]
    fn empty_cvr_universe_is_degenerate() {
        let (contests, margins) = two_contests();
        let audit = SuperSimple::new(0.1).unwrap();
        assert!(matches!(
            audit.compute_risk(&contests, &margins, &CvrSet::new(), &CvrSet::new()),
            Err(AuditError::DegenerateMargin)
        ));
        assert!(matches!(
            audit.get_sample_sizes(&contests, &margins, 0),
            Err(AuditError::DegenerateMargin)
        ));
    }

    #[test]
    fn missing_sampled_ballot_is_an_error() {
        let (contests, margins) = two_contests();
        let audit = SuperSimple::new(0.1).unwrap();

        let mut cvrs = CvrSet::new();
        cvrs.insert("b1".to_string(), matching_ballot(&["close", "wide"]));
        let mut sample = CvrSet::new();
        sample.insert("ghost".to_string(), matching_ballot(&["close", "wide"]));

        assert!(matches!(
            audit.compute_risk(&contests, &margins, &cvrs, &sample),
            Err(AuditError::MissingBallot(_))
        ));
    }

    #[test]
    fn clean_sample_shrinks_p_value() {
        let (contests, margins) = two_contests();
        let audit = SuperSimple::new(0.25).unwrap();

        let mut cvrs = CvrSet::new();
        let mut sample = CvrSet::new();
        for i in 0..100 {
            let id = format!("b{i}");
            cvrs.insert(id.clone(), matching_ballot(&["close", "wide"]));
            sample.insert(id, matching_ballot(&["close", "wide"]));
        }
        // The diluted margin is clamped by the 100-ballot CVR universe, so
        // it comes out at 1.0 and U = 2 * gamma. Each clean ballot then
        // contributes a factor of (1 - 1/U).
        let (p, _) = audit
            .compute_risk(&contests, &margins, &cvrs, &sample)
            .unwrap();
        let u: f64 = 2.0 * 1.1;
        let expected = (1.0 - 1.0 / u).powi(100);
        assert!((p - expected).abs() < 1e-9);
    }
}
