//! Combinatorial audit engine: pairwise stopping boundaries, achieved-risk
//! estimation, and next-round-size search.
//!
//! The engine works one candidate pair at a time. The election-wide round
//! schedule is rescaled to the pair's two-way ballot pool, the pair's margin
//! boundary is solved by the same restricted-convolution scheme as the
//! Aurror solver (with the stopping check varying by [`AuditModel`]), and
//! results are rescaled back to election-wide ballot counts.

use tracing::{debug, warn};

use crate::error::AuditError;
use crate::oracle::{AuditModel, AuditOracle, ElectionSpec, RiskReport, RoundSizeReport};
use crate::stats::{binomial_row, convolve, tail_sum};

/// Default [`AuditOracle`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinatorialOracle;

struct ModelChecks {
    delta: bool,
    sum: bool,
    memory: bool,
}

impl AuditModel {
    fn checks(self) -> ModelChecks {
        match self {
            AuditModel::Bravo | AuditModel::Arlo => ModelChecks {
                delta: true,
                sum: false,
                memory: false,
            },
            AuditModel::Athena => ModelChecks {
                delta: true,
                sum: true,
                memory: false,
            },
            AuditModel::Minerva => ModelChecks {
                delta: false,
                sum: true,
                memory: false,
            },
            AuditModel::Metis => ModelChecks {
                delta: false,
                sum: true,
                memory: true,
            },
        }
    }

    /// Bravo, Arlo and Minerva fix the likelihood-ratio bound at the risk
    /// limit; Athena and Metis take it from the election spec.
    fn effective_delta(self, alpha: f64, delta: f64) -> f64 {
        match self {
            AuditModel::Athena | AuditModel::Metis => delta,
            AuditModel::Bravo | AuditModel::Arlo | AuditModel::Minerva => alpha,
        }
    }
}

/// Per-round boundary tables for one candidate pair.
struct BoundaryTables {
    kmins: Vec<u64>,
    prob_sum: Vec<f64>,
}

/// Per-round risk accounting against actual observations.
struct RiskEstimate {
    audit_ratio: Vec<f64>,
    deltas: Vec<f64>,
}

impl CombinatorialOracle {
    /// Solve the stopping boundary for one pair under the given model.
    ///
    /// Unlike the public Aurror solver this accepts schedules with repeated
    /// or zero entries, which arise from rescaling an election-wide schedule
    /// to a pair's smaller ballot pool; a round with no fresh draws simply
    /// cannot stop.
    fn boundary(
        &self,
        model: AuditModel,
        margin: f64,
        alpha: f64,
        delta: f64,
        round_schedule: &[u64],
    ) -> Result<BoundaryTables, AuditError> {
        let checks = model.checks();
        let delta = model.effective_delta(alpha, delta);
        let memory = if checks.memory { 1.0 } else { 0.0 };
        let p_reported = (1.0 + margin) / 2.0;

        // Bravo draws one ballot at a time regardless of the planned rounds.
        let expanded;
        let schedule: &[u64] = if model == AuditModel::Bravo {
            let last = round_schedule.last().copied().unwrap_or(0);
            expanded = (1..=last).collect::<Vec<u64>>();
            &expanded
        } else {
            round_schedule
        };

        let mut prob_table = vec![1.0];
        let mut tied_table = vec![1.0];
        let mut prev_size = 0u64;
        let mut prob_sum_prev = 0.0;
        let mut tied_sum_prev = 0.0;
        let mut tables = BoundaryTables {
            kmins: Vec::with_capacity(schedule.len()),
            prob_sum: Vec::with_capacity(schedule.len()),
        };

        for &size in schedule {
            let draws = size
                .checked_sub(prev_size)
                .ok_or(AuditError::InvalidRoundSchedule)?;
            prob_table = convolve(&prob_table, &binomial_row(draws, p_reported)?);
            tied_table = convolve(&tied_table, &binomial_row(draws, 0.5)?);

            let mut kmin_candidate = (size / 2) as usize;
            let mut kmin = 0u64;
            while kmin_candidate <= size as usize {
                let delta_ok = !checks.delta
                    || delta * prob_table[kmin_candidate] >= tied_table[kmin_candidate];
                let tail = tail_sum(&prob_table, kmin_candidate);
                let tied_tail = tail_sum(&tied_table, kmin_candidate);
                let sum_ok = !checks.sum
                    || alpha * (tail + memory * prob_sum_prev)
                        >= tied_tail + memory * tied_sum_prev;
                if delta_ok && sum_ok {
                    kmin = kmin_candidate as u64;
                    prob_sum_prev += tail;
                    tied_sum_prev += tied_tail;
                    break;
                }
                kmin_candidate += 1;
            }

            for entry in prob_table.iter_mut().skip(kmin_candidate) {
                *entry = 0.0;
            }
            for entry in tied_table.iter_mut().skip(kmin_candidate) {
                *entry = 0.0;
            }

            tables.kmins.push(kmin);
            tables.prob_sum.push(prob_sum_prev);
            prev_size = size;
        }

        Ok(tables)
    }

    /// Replay the boundary against actual observations and account the risk
    /// spent per round.
    fn estimate_risk(
        &self,
        margin: f64,
        kmins: &[u64],
        round_schedule: &[u64],
        observations: &[u64],
    ) -> Result<RiskEstimate, AuditError> {
        let rounds = kmins
            .len()
            .min(round_schedule.len())
            .min(observations.len());
        let p_reported = (1.0 + margin) / 2.0;

        let mut prob_table = vec![1.0];
        let mut tied_table = vec![1.0];
        let mut prev_size = 0u64;
        let mut estimate = RiskEstimate {
            audit_ratio: Vec::with_capacity(rounds),
            deltas: Vec::new(),
        };

        for round in 0..rounds {
            let size = round_schedule[round];
            let draws = size
                .checked_sub(prev_size)
                .ok_or(AuditError::InvalidRoundSchedule)?;
            prob_table = convolve(&prob_table, &binomial_row(draws, p_reported)?);
            tied_table = convolve(&tied_table, &binomial_row(draws, 0.5)?);

            let observed = observations[round] as usize;
            let pstop = tail_sum(&prob_table, observed);
            let risk = tail_sum(&tied_table, observed);
            estimate
                .audit_ratio
                .push(if pstop > 0.0 { risk / pstop } else { 0.0 });
            if observed < prob_table.len() && prob_table[observed] > 0.0 {
                estimate
                    .deltas
                    .push((tied_table[observed] / prob_table[observed]).abs());
            }

            let kmin = kmins[round] as usize;
            for entry in prob_table.iter_mut().skip(kmin) {
                *entry = 0.0;
            }
            for entry in tied_table.iter_mut().skip(kmin) {
                *entry = 0.0;
            }
            prev_size = size;
        }

        Ok(estimate)
    }

    /// Search the next cumulative round size whose conditional stopping
    /// probability reaches `quant`.
    fn next_round_size(
        &self,
        model: AuditModel,
        margin: f64,
        alpha: f64,
        delta: f64,
        round_schedule: &[u64],
        quant: f64,
        ballots_cast: u64,
    ) -> Result<(u64, f64), AuditError> {
        if !(margin > 0.0) {
            return Err(AuditError::DegenerateMargin);
        }

        // A first round sized for a modest target has a closed-form cap;
        // later rounds fall back to the whole ballot pool.
        let mut round_max = if quant <= 0.9 && round_schedule.is_empty() {
            let cap =
                (18.0 * alpha.ln()) / (margin * ((1.0 - margin).ln() - (1.0 + margin).ln()));
            cap.ceil() as u64
        } else {
            ballots_cast
        };

        let with_round = |candidate: u64| {
            let mut schedule = round_schedule.to_vec();
            schedule.push(candidate);
            schedule
        };

        let tables = self.boundary(model, margin, alpha, delta, &with_round(round_max))?;
        let max_prob = relative_prob(&tables.prob_sum);
        if max_prob < quant {
            warn!(
                target_prob = quant,
                reachable_prob = max_prob,
                round_size = round_max,
                "target stopping probability unreachable; full recount suggested"
            );
            return Ok((round_max, max_prob));
        }

        // Walk down from the cap until the target is no longer met; that
        // gives the lower bracket for the binary search.
        let last = round_schedule.last().copied();
        let mut round_min;
        let mut round_candidate = match last {
            Some(prev) => prev + round_max / 2,
            None => round_max / 2,
        };
        loop {
            let tables = self.boundary(model, margin, alpha, delta, &with_round(round_candidate))?;
            if relative_prob(&tables.prob_sum) >= quant {
                round_max = round_candidate;
                round_candidate = match last {
                    Some(prev) => prev + round_max.saturating_sub(prev) / 2,
                    None => round_max / 2,
                };
            } else {
                round_min = round_candidate;
                break;
            }
        }

        loop {
            let candidate = midpoint_half_even(round_min, round_max);
            let tables = self.boundary(model, margin, alpha, delta, &with_round(candidate))?;
            let prob = relative_prob(&tables.prob_sum);
            if prob <= quant {
                round_min = candidate;
            } else {
                round_max = candidate;
            }
            let overshoot = prob - quant;
            if (overshoot > 0.0 && overshoot < 0.01) || round_max - round_min <= 1 {
                let tables = self.boundary(model, margin, alpha, delta, &with_round(round_max))?;
                let prob_stop = tables.prob_sum.last().copied().unwrap_or(0.0);
                return Ok((round_max, prob_stop));
            }
        }
    }
}

impl AuditOracle for CombinatorialOracle {
    fn find_risk(
        &self,
        spec: &ElectionSpec,
        round_schedule: &[u64],
        observations: &[u64],
    ) -> Result<RiskReport, AuditError> {
        let (first, second) = leading_pair(spec)?;
        let pool = first + second;
        let winner = first.max(second);
        let margin = (2 * winner) as f64 / pool as f64 - 1.0;
        let scaled = scale_schedule(round_schedule, pool, spec.total_ballots);

        let tables = self.boundary(spec.model, margin, spec.alpha, spec.delta, &scaled)?;

        // The boundary is met once any round's observation reaches its
        // reachable threshold.
        let passed = tables
            .kmins
            .iter()
            .zip(observations)
            .any(|(&required, &observed)| required > 0 && required <= observed);

        let estimate = self.estimate_risk(margin, &tables.kmins, round_schedule, observations)?;
        let risk = estimate
            .audit_ratio
            .iter()
            .copied()
            .filter(|&ratio| ratio > 0.0)
            .fold(f64::INFINITY, f64::min);
        let risk = if risk.is_finite() { risk } else { 1.0 };
        let delta = estimate.deltas.last().copied().unwrap_or(0.0);

        debug!(risk, delta, passed, "pairwise risk estimate");

        Ok(RiskReport {
            risk,
            delta,
            passed,
            observed: observations.to_vec(),
            required: tables.kmins,
        })
    }

    fn find_next_round_sizes(
        &self,
        spec: &ElectionSpec,
        round_schedule: &[u64],
        pstop_goals: &[f64],
    ) -> Result<RoundSizeReport, AuditError> {
        if spec.candidates.len() < 2 || spec.tallies.len() != spec.candidates.len() {
            return Err(AuditError::NotEnoughCandidates);
        }

        // Each of the leader's pairings constrains the schedule; the worst
        // pair governs the election-wide recommendation.
        let mut future_round_sizes = vec![0u64; pstop_goals.len()];
        let mut prob_stop = vec![0.0; pstop_goals.len()];
        let leader = spec.tallies[0];
        for &rival in &spec.tallies[1..] {
            let pool = leader + rival;
            let winner = leader.max(rival);
            let margin = (2 * winner) as f64 / pool as f64 - 1.0;
            let scaling = spec.total_ballots as f64 / pool as f64;
            let scaled = scale_schedule(round_schedule, pool, spec.total_ballots);

            for (i, &goal) in pstop_goals.iter().enumerate() {
                let (size, prob) = self.next_round_size(
                    spec.model,
                    margin,
                    spec.alpha,
                    spec.delta,
                    &scaled,
                    goal,
                    pool,
                )?;
                let rescaled = (size as f64 * scaling).ceil() as u64;
                debug!(goal, pair_size = size, rescaled, prob, "next round size");
                future_round_sizes[i] = future_round_sizes[i].max(rescaled);
                prob_stop[i] = prob;
            }
        }

        Ok(RoundSizeReport {
            future_round_sizes,
            prob_stop,
        })
    }
}

fn leading_pair(spec: &ElectionSpec) -> Result<(u64, u64), AuditError> {
    if spec.candidates.len() < 2 || spec.tallies.len() != spec.candidates.len() {
        return Err(AuditError::NotEnoughCandidates);
    }
    Ok((spec.tallies[0], spec.tallies[1]))
}

/// Rescale an election-wide cumulative schedule to a pair's two-way pool.
fn scale_schedule(round_schedule: &[u64], pool: u64, total_ballots: u64) -> Vec<u64> {
    round_schedule
        .iter()
        .map(|&size| (size as f64 * pool as f64 / total_ballots as f64).floor() as u64)
        .collect()
}

/// Conditional probability of stopping in the last round, given the audit
/// got there.
fn relative_prob(prob_sum: &[f64]) -> f64 {
    match prob_sum {
        [] => 0.0,
        [only] => *only,
        [.., prev, last] => {
            let remaining = 1.0 - prev;
            if remaining > 0.0 {
                (last - prev) / remaining
            } else {
                1.0
            }
        }
    }
}

/// Integer midpoint with ties rounded to even (banker's rounding), the
/// convention the published sizing tables assume.
fn midpoint_half_even(low: u64, high: u64) -> u64 {
    let sum = low + high;
    let half = sum / 2;
    if sum % 2 == 0 || half % 2 == 0 {
        half
    } else {
        half + 1
    }
}
