//! Translation layer between the ballot-polling calling convention and the
//! combinatorial oracle.
//!
//! Athena sizes rounds per (winner, runner-up) pair given only their vote
//! shares and cumulative sampled counts. The shim stands up a synthetic
//! two-candidate election over a nominal ballot pool, asks the oracle for a
//! next-round size at the target completion probability, corrects for any
//! shortfall of the current sample against the boundary, and rescales the
//! answer back to the full contest.

use tracing::debug;

use crate::error::AuditError;
use crate::oracle::{AuditModel, AuditOracle, ElectionSpec};

/// Ballot pool of the synthetic pairwise election.
///
/// Large enough that integer truncation of the vote shares costs at most
/// one part in a hundred thousand of margin precision.
pub const NOMINAL_POOL: u64 = 100_000;

/// Next cumulative round size for one (winner, runner-up) pair.
///
/// `p_w` and `p_r` are the pair's fractions of all ballots cast; `sample_w`
/// and `sample_r` their cumulative sampled counts so far; `p_completion`
/// the desired chance of finishing in the next round if the reported
/// outcome is correct. The result is in full-contest ballots (the pair's
/// two-way pool share is divided back out).
pub fn athena_round_size(
    oracle: &impl AuditOracle,
    risk_limit: f64,
    p_w: f64,
    p_r: f64,
    sample_w: u64,
    sample_r: u64,
    p_completion: f64,
) -> Result<u64, AuditError> {
    if !(p_completion > 0.0 && p_completion < 1.0) {
        return Err(AuditError::InvalidCompletionProbability(p_completion));
    }
    let p_wr = p_w + p_r;
    if !(p_wr > 0.0) {
        return Err(AuditError::DegenerateMargin);
    }
    let p_w2 = p_w / p_wr;

    let winner_tally = (NOMINAL_POOL as f64 * p_w2) as u64;
    let spec = ElectionSpec {
        alpha: risk_limit,
        delta: 1.0,
        candidates: vec!["A".to_string(), "B".to_string()],
        tallies: vec![winner_tally, NOMINAL_POOL - winner_tally],
        total_ballots: NOMINAL_POOL,
        winners: 1,
        model: AuditModel::Athena,
    };

    let drawn = sample_w + sample_r;
    let round_schedule: Vec<u64> = if drawn > 0 { vec![drawn] } else { Vec::new() };

    // If the sample fell short of the boundary, inflate the next round by
    // twice the shortfall; an overshoot shrinks it correspondingly.
    let below_kmin: i64 = if round_schedule.is_empty() {
        0
    } else {
        let report = oracle.find_risk(&spec, &round_schedule, &[sample_w])?;
        let required = report.required.iter().copied().max().unwrap_or(0);
        let observed = report.observed.iter().copied().max().unwrap_or(0);
        required as i64 - observed as i64
    };

    let sizes = oracle.find_next_round_sizes(&spec, &round_schedule, &[p_completion])?;
    let base = sizes.future_round_sizes.first().copied().unwrap_or(0);
    let next_round = base as i64 + 2 * below_kmin;
    let size_adj = (next_round.max(0) as f64 / p_wr).ceil() as u64;

    debug!(
        margin = (p_w2 - 0.5) * 2.0,
        p_w,
        p_r,
        sample_w,
        sample_r,
        p_completion,
        below_kmin,
        raw = next_round,
        scaled = size_adj,
        "pairwise round size"
    );

    Ok(size_adj)
}
