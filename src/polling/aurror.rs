//! Aurror ballot-polling audit.
//!
//! Risk measurement is the shared pairwise likelihood ratio; round sizing
//! evaluates a few multiples of the expected sample size against the
//! dynamic-programming stopping boundary and reports each candidate round's
//! one-round confirmation probability.

use indexmap::IndexMap;

use crate::config::PollingConfig;
use crate::error::{check_risk_limit, AuditError};
use crate::margin::{ContestMargins, Margins};
use crate::polling::athena::{tied_sizing, uncontested_sizing};
use crate::polling::boundary::stopping_boundary;
use crate::polling::statistic::{
    expected_sample_size, pairwise_risk, test_statistics, weakest_pair, PairwiseStat,
};
use crate::polling::{AsnEstimate, ContestSizing, SizeEstimate};
use crate::types::{CandidateCounts, Contests, SampleResults};

/// The Aurror audit method.
#[derive(Debug, Clone)]
pub struct Aurror {
    risk_limit: f64,
    config: PollingConfig,
}

impl Aurror {
    /// Create an Aurror audit at the given risk limit with default tuning.
    pub fn new(risk_limit: f64) -> Result<Self, AuditError> {
        Self::with_config(risk_limit, PollingConfig::default())
    }

    /// Create an Aurror audit with explicit tuning parameters.
    pub fn with_config(risk_limit: f64, config: PollingConfig) -> Result<Self, AuditError> {
        Ok(Self {
            risk_limit: check_risk_limit(risk_limit)?,
            config,
        })
    }

    /// The configured risk limit.
    pub fn risk_limit(&self) -> f64 {
        self.risk_limit
    }

    /// Pairwise test statistics for one contest's cumulative sample.
    pub fn get_test_statistics(
        &self,
        margins: &ContestMargins,
        sample_results: &CandidateCounts,
    ) -> PairwiseStat {
        test_statistics(margins, sample_results)
    }

    /// Pairwise risk measurements and the stop decision for one contest.
    pub fn compute_risk(
        &self,
        margins: &ContestMargins,
        sample_results: &CandidateCounts,
    ) -> (PairwiseStat, bool) {
        pairwise_risk(margins, sample_results, self.risk_limit)
    }

    /// Sizing recommendations for every contest.
    ///
    /// Candidate rounds are the configured multiples of the ASN; each is
    /// keyed by its one-round confirmation probability from the stopping
    /// boundary, solved at the weakest reported pair's margin.
    pub fn get_sample_sizes(
        &self,
        contests: &Contests,
        margins: &Margins,
        sample_results: &SampleResults,
    ) -> Result<IndexMap<String, ContestSizing>, AuditError> {
        let empty = CandidateCounts::new();
        let mut sizes = IndexMap::new();

        for (name, contest) in contests {
            let contest_margins = margins
                .get(name)
                .ok_or_else(|| AuditError::MissingMargins(name.clone()))?;
            let sample = sample_results.get(name).unwrap_or(&empty);
            let asn_size = expected_sample_size(
                contest,
                contest_margins,
                sample,
                self.risk_limit,
                self.config.asn_ratio,
            );

            if contest.num_winners != 1 {
                sizes.insert(
                    name.clone(),
                    ContestSizing {
                        asn: AsnEstimate {
                            size: asn_size,
                            prob: None,
                        },
                        quantiles: Vec::new(),
                    },
                );
                continue;
            }

            let Some(pair) = weakest_pair(contest_margins) else {
                sizes.insert(name.clone(), uncontested_sizing(&self.config));
                continue;
            };
            if pair.p_w == pair.p_l {
                sizes.insert(name.clone(), tied_sizing(&self.config, contest.ballots));
                continue;
            }
            if pair.p_w == 1.0 {
                sizes.insert(name.clone(), uncontested_sizing(&self.config));
                continue;
            }

            let margin = pair.p_w - pair.p_l;
            let mut quantiles = Vec::new();
            if let SizeEstimate::Size(asn) = asn_size {
                // An ASN of zero means the current sample is already
                // conclusive; there is no round to plan.
                if asn > 0 {
                    for &multiple in &self.config.asn_multiples {
                        let round_size = (multiple * asn as f64).ceil() as u64;
                        let plan = stopping_boundary(margin, self.risk_limit, &[round_size])?;
                        let prob = (plan.prob_sum[0] * 100.0).round() / 100.0;
                        quantiles.push((prob, SizeEstimate::Size(round_size)));
                    }
                }
            }

            sizes.insert(
                name.clone(),
                ContestSizing {
                    asn: AsnEstimate {
                        size: asn_size,
                        prob: Some(self.config.asn_stop_prob),
                    },
                    quantiles,
                },
            );
        }

        Ok(sizes)
    }
}
