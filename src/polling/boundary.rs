//! Dynamic-programming stopping boundary for the Aurror method.
//!
//! For a planned round schedule, the solver finds the smallest per-round
//! threshold `kmin` of winner votes such that the cumulative probability of
//! crossing it under a tied election stays within `alpha` times the
//! cumulative probability of crossing it under the reported margin. The
//! state is the distribution of winner-vote counts among audits still
//! running; mass at or above a round's threshold is absorbed (the audit
//! stopped) and removed before the next round's draws are convolved in.

use tracing::debug;

use crate::error::AuditError;
use crate::stats::{binomial_row, convolve, tail_sum};

/// Stopping thresholds and cumulative probabilities per round.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPlan {
    /// Winner-vote threshold per round. Zero marks a round where no
    /// threshold is reachable (the audit cannot stop in that round).
    pub kmins: Vec<u64>,
    /// Cumulative stopping probability under the reported margin.
    pub prob_sum: Vec<f64>,
    /// Cumulative stopping probability under a tied election (risk spent).
    pub prob_tied_sum: Vec<f64>,
}

/// Solve the stopping boundary for `round_schedule` at risk limit `alpha`.
///
/// `margin` is the reported winner's lead as a fraction of ballots cast, so
/// a vote drawn for either of the pair lands on the winner with probability
/// `(1 + margin) / 2`. The schedule lists cumulative sample sizes and must
/// be strictly increasing from at least 1.
pub fn stopping_boundary(
    margin: f64,
    alpha: f64,
    round_schedule: &[u64],
) -> Result<BoundaryPlan, AuditError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AuditError::InvalidRiskLimit(alpha));
    }
    if !(-1.0..=1.0).contains(&margin) {
        return Err(AuditError::InvalidMargin(margin));
    }
    let increasing = round_schedule
        .windows(2)
        .all(|pair| pair[0] < pair[1]);
    if round_schedule.is_empty() || round_schedule[0] == 0 || !increasing {
        return Err(AuditError::InvalidRoundSchedule);
    }

    let p_reported = (1.0 + margin) / 2.0;

    let mut prob_table = vec![1.0];
    let mut tied_table = vec![1.0];
    let mut prev_size = 0u64;
    let mut prob_sum_prev = 0.0;
    let mut tied_sum_prev = 0.0;

    let mut plan = BoundaryPlan {
        kmins: Vec::with_capacity(round_schedule.len()),
        prob_sum: Vec::with_capacity(round_schedule.len()),
        prob_tied_sum: Vec::with_capacity(round_schedule.len()),
    };

    for &size in round_schedule {
        let draws = size - prev_size;
        prob_table = convolve(&prob_table, &binomial_row(draws, p_reported)?);
        tied_table = convolve(&tied_table, &binomial_row(draws, 0.5)?);

        let mut kmin_candidate = (size / 2) as usize;
        let mut kmin = 0u64;
        while kmin_candidate <= size as usize {
            let tail = tail_sum(&prob_table, kmin_candidate);
            let tied_tail = tail_sum(&tied_table, kmin_candidate);
            if alpha * (tail + prob_sum_prev) >= tied_tail + tied_sum_prev {
                kmin = kmin_candidate as u64;
                prob_sum_prev += tail;
                tied_sum_prev += tied_tail;
                break;
            }
            kmin_candidate += 1;
        }
        // kmin == 0: no reachable threshold this round; the cumulative sums
        // carry forward unchanged.

        for entry in prob_table.iter_mut().skip(kmin_candidate) {
            *entry = 0.0;
        }
        for entry in tied_table.iter_mut().skip(kmin_candidate) {
            *entry = 0.0;
        }

        debug!(
            round_size = size,
            kmin,
            prob_sum = prob_sum_prev,
            prob_tied_sum = tied_sum_prev,
            "stopping boundary round"
        );

        plan.kmins.push(kmin);
        plan.prob_sum.push(prob_sum_prev);
        plan.prob_tied_sum.push(tied_sum_prev);
        prev_size = size;
    }

    Ok(plan)
}
