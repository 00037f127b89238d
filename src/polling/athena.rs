//! Athena ballot-polling audit.
//!
//! Risk measurement is the shared pairwise likelihood ratio; round sizing
//! delegates to the combinatorial oracle through the pairwise shim, one
//! query per target confirmation probability.

use indexmap::IndexMap;

use crate::config::PollingConfig;
use crate::error::{check_risk_limit, AuditError};
use crate::margin::{ContestMargins, Margins};
use crate::oracle::{athena_round_size, CombinatorialOracle};
use crate::polling::statistic::{
    expected_sample_size, pairwise_risk, test_statistics, weakest_pair, PairwiseStat,
};
use crate::polling::{AsnEstimate, ContestSizing, SizeEstimate};
use crate::types::{CandidateCounts, Contests, SampleResults};

/// The Athena audit method.
#[derive(Debug, Clone)]
pub struct Athena {
    risk_limit: f64,
    config: PollingConfig,
    oracle: CombinatorialOracle,
}

impl Athena {
    /// Create an Athena audit at the given risk limit with default tuning.
    pub fn new(risk_limit: f64) -> Result<Self, AuditError> {
        Self::with_config(risk_limit, PollingConfig::default())
    }

    /// Create an Athena audit with explicit tuning parameters.
    pub fn with_config(risk_limit: f64, config: PollingConfig) -> Result<Self, AuditError> {
        Ok(Self {
            risk_limit: check_risk_limit(risk_limit)?,
            config,
            oracle: CombinatorialOracle,
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
    /// Contests absent from `sample_results` are sized as fresh audits.
    /// Multi-winner contests get only an ASN estimate; single-winner
    /// contests additionally get an oracle-sized round per target
    /// confirmation probability.
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

            let sample_w = sample.get(pair.winner).copied().unwrap_or(0);
            let sample_l = sample.get(pair.loser).copied().unwrap_or(0);
            let mut quantiles = Vec::with_capacity(self.config.quants.len());
            for &quant in &self.config.quants {
                let size = athena_round_size(
                    &self.oracle,
                    self.risk_limit,
                    pair.p_w,
                    pair.p_l,
                    sample_w,
                    sample_l,
                    quant,
                )?;
                quantiles.push((quant, SizeEstimate::Size(size)));
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

pub(crate) fn uncontested_sizing(config: &PollingConfig) -> ContestSizing {
    ContestSizing {
        asn: AsnEstimate {
            size: SizeEstimate::NoAudit,
            prob: None,
        },
        quantiles: config
            .quants
            .iter()
            .map(|&q| (q, SizeEstimate::NoAudit))
            .collect(),
    }
}

pub(crate) fn tied_sizing(config: &PollingConfig, ballots: u64) -> ContestSizing {
    ContestSizing {
        asn: AsnEstimate {
            size: SizeEstimate::FullCount(ballots),
            prob: Some(1.0),
        },
        quantiles: config
            .quants
            .iter()
            .map(|&q| (q, SizeEstimate::FullCount(ballots)))
            .collect(),
    }
}
