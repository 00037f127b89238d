//! BRAVO-style sequential test statistic shared by the ballot-polling methods.
//!
//! For each (winner, loser) pair the statistic T is the Wald sequential
//! probability ratio of "the reported outcome is correct" against "the pair
//! is tied". Every sampled vote for the winner multiplies T by
//! `swl / 0.5`; every vote for the loser multiplies it by `(1 - swl) / 0.5`.
//! T is a pure function of the cumulative counts, so the order votes were
//! drawn in does not matter.

use std::collections::BTreeMap;

use crate::margin::ContestMargins;
use crate::polling::SizeEstimate;
use crate::types::{CandidateCounts, Contest};

/// Per-pair test statistics (or risk measurements), keyed (winner, loser).
pub type PairwiseStat = BTreeMap<(String, String), f64>;

/// Compute the test statistic T for every (winner, loser) pair.
///
/// Sampled candidates that appear in neither the winner nor the loser set
/// (write-ins, withdrawn candidates) are ignored.
pub fn test_statistics(margins: &ContestMargins, sample_results: &CandidateCounts) -> PairwiseStat {
    let mut t = PairwiseStat::new();
    for winner in margins.winners.keys() {
        for loser in margins.losers.keys() {
            t.insert((winner.clone(), loser.clone()), 1.0);
        }
    }

    for (candidate, &votes) in sample_results {
        if let Some(winner_share) = margins.winners.get(candidate) {
            for (loser, &swl) in &winner_share.swl {
                if let Some(stat) = t.get_mut(&(candidate.clone(), loser.clone())) {
                    *stat *= (swl / 0.5).powf(votes as f64);
                }
            }
        } else if margins.losers.contains_key(candidate) {
            for (winner, winner_share) in &margins.winners {
                if let Some(&swl) = winner_share.swl.get(candidate) {
                    if let Some(stat) = t.get_mut(&(winner.clone(), candidate.clone())) {
                        *stat *= ((1.0 - swl) / 0.5).powf(votes as f64);
                    }
                }
            }
        }
    }

    t
}

/// Turn the test statistics into per-pair risk measurements `1/T` and decide
/// whether the audit may stop.
///
/// `finished` is true iff every pair's measurement is at or below the risk
/// limit. A contest with no losers has no pairs and is trivially finished.
pub fn pairwise_risk(
    margins: &ContestMargins,
    sample_results: &CandidateCounts,
    risk_limit: f64,
) -> (PairwiseStat, bool) {
    let t = test_statistics(margins, sample_results);
    let mut measurements = PairwiseStat::new();
    let mut finished = true;
    for (pair, stat) in t {
        let measurement = 1.0 / stat;
        if measurement > risk_limit {
            finished = false;
        }
        measurements.insert(pair, measurement);
    }
    (measurements, finished)
}

/// The weakest reported (winner, loser) pair: the winner with the smallest
/// ballot share against the loser with the largest.
pub(crate) struct WeakestPair<'a> {
    pub winner: &'a str,
    pub p_w: f64,
    pub loser: &'a str,
    pub p_l: f64,
}

pub(crate) fn weakest_pair(margins: &ContestMargins) -> Option<WeakestPair<'_>> {
    let mut winner: Option<(&str, f64)> = None;
    for (name, share) in &margins.winners {
        if winner.map_or(true, |(_, best)| share.p_w < best) {
            winner = Some((name, share.p_w));
        }
    }
    let mut loser: Option<(&str, f64)> = None;
    for (name, share) in &margins.losers {
        if loser.map_or(true, |(_, best)| share.p_l > best) {
            loser = Some((name, share.p_l));
        }
    }
    match (winner, loser) {
        (Some((w, p_w)), Some((l, p_l))) => Some(WeakestPair {
            winner: w,
            p_w,
            loser: l,
            p_l,
        }),
        _ => None,
    }
}

/// Wald-style expected sample size (ASN) for one contest, scaled by the
/// method's provisional `ratio` constant.
///
/// Sentinels: a contest with no losers (or no winners) needs no audit; an
/// exact tie can only be confirmed by a full hand count; a unanimous
/// landslide (`p_w == 1`) has no meaningful finite estimate. A sample whose
/// statistic already exceeds the risk limit clamps the estimate at zero.
pub fn expected_sample_size(
    contest: &Contest,
    margins: &ContestMargins,
    sample_results: &CandidateCounts,
    risk_limit: f64,
    ratio: f64,
) -> SizeEstimate {
    let Some(pair) = weakest_pair(margins) else {
        return SizeEstimate::NoAudit;
    };
    if pair.p_w == 1.0 {
        return SizeEstimate::NoAudit;
    }
    if pair.p_w == pair.p_l {
        return SizeEstimate::FullCount(contest.ballots);
    }

    let s_w = pair.p_w / (pair.p_w + pair.p_l);
    let z_w = (2.0 * s_w).ln();
    let z_l = (2.0 - 2.0 * s_w).ln();

    let t_min = test_statistics(margins, sample_results)
        .values()
        .fold(f64::INFINITY, |acc, &t| acc.min(t));
    let weighted_alpha = ((1.0 / risk_limit) / t_min).ln();

    let raw = (ratio * (weighted_alpha + z_w / 2.0) / (pair.p_w * z_w + pair.p_l * z_l)).ceil();
    SizeEstimate::Size(raw.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::compute_margins;
    use crate::types::{Contest, Contests};
    use indexmap::IndexMap;

    fn sixty_forty() -> ContestMargins {
        let mut contests = Contests::new();
        let votes: CandidateCounts = [("winner".to_string(), 600u64), ("loser".to_string(), 400)]
            .into_iter()
            .collect();
        contests.insert("c".to_string(), Contest::new(votes, 1_000, 1));
        compute_margins(&contests).shift_remove("c").unwrap()
    }

    fn counts(pairs: &[(&str, u64)]) -> CandidateCounts {
        pairs.iter().map(|(c, v)| (c.to_string(), *v)).collect()
    }

    #[test]
    fn empty_sample_gives_unit_statistic() {
        let margins = sixty_forty();
        let t = test_statistics(&margins, &CandidateCounts::new());
        assert_eq!(t.len(), 1);
        let stat = t[&("winner".to_string(), "loser".to_string())];
        assert!((stat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn statistic_accumulates_multiplicatively() {
        let margins = sixty_forty();
        let t = test_statistics(&margins, &counts(&[("winner", 10), ("loser", 5)]));
        // (0.6/0.5)^10 * (0.4/0.5)^5
        let expected = 1.2f64.powi(10) * 0.8f64.powi(5);
        let stat = t[&("winner".to_string(), "loser".to_string())];
        assert!((stat - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn statistic_is_order_invariant() {
        let margins = sixty_forty();
        let forward = test_statistics(&margins, &counts(&[("winner", 30), ("loser", 12)]));
        let backward = test_statistics(&margins, &counts(&[("loser", 12), ("winner", 30)]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn unknown_candidates_are_ignored() {
        let margins = sixty_forty();
        let with_writein =
            test_statistics(&margins, &counts(&[("winner", 7), ("loser", 3), ("zz", 40)]));
        let without = test_statistics(&margins, &counts(&[("winner", 7), ("loser", 3)]));
        assert_eq!(with_writein, without);
    }

    #[test]
    fn risk_finishes_only_below_limit() {
        let margins = sixty_forty();
        // 56/56 leaves T below 1 (weak evidence): not finished.
        let (m, finished) = pairwise_risk(&margins, &counts(&[("winner", 56), ("loser", 56)]), 0.1);
        assert!(!finished);
        assert!(m[&("winner".to_string(), "loser".to_string())] > 0.1);

        // A lopsided sample drives 1/T below the limit.
        let (m, finished) = pairwise_risk(&margins, &counts(&[("winner", 60), ("loser", 20)]), 0.1);
        assert!(finished);
        assert!(m[&("winner".to_string(), "loser".to_string())] <= 0.1);
    }

    #[test]
    fn no_losers_is_trivially_finished() {
        let mut contests = Contests::new();
        let votes: CandidateCounts = [("only".to_string(), 100u64)].into_iter().collect();
        contests.insert("c".to_string(), Contest::new(votes, 100, 1));
        let margins = compute_margins(&contests).shift_remove("c").unwrap();

        let (m, finished) = pairwise_risk(&margins, &CandidateCounts::new(), 0.1);
        assert!(finished);
        assert!(m.is_empty());
    }

    #[test]
    fn asn_sixty_forty_fresh_sample() {
        let mut contests = Contests::new();
        let votes: CandidateCounts = [("winner".to_string(), 600u64), ("loser".to_string(), 400)]
            .into_iter()
            .collect();
        let contest = Contest::new(votes, 1_000, 1);
        contests.insert("c".to_string(), contest);
        let margins = compute_margins(&contests).shift_remove("c").unwrap();
        let contest = &contests["c"];

        // ratio * (ln(1/alpha) + z_w/2) / (p_w z_w + p_l z_l)
        // = 0.5 * (2.302585 + 0.0911608) / 0.0201345 -> ceil = 60
        let size = expected_sample_size(contest, &margins, &CandidateCounts::new(), 0.1, 0.5);
        assert_eq!(size, SizeEstimate::Size(60));
    }

    #[test]
    fn asn_sentinels() {
        let mut contests = Contests::new();
        contests.insert(
            "landslide".to_string(),
            Contest::new(
                [("w".to_string(), 1_000u64), ("l".to_string(), 0)]
                    .into_iter()
                    .collect::<IndexMap<_, _>>(),
                1_000,
                1,
            ),
        );
        contests.insert(
            "tie".to_string(),
            Contest::new(
                [("a".to_string(), 500u64), ("b".to_string(), 500)]
                    .into_iter()
                    .collect::<IndexMap<_, _>>(),
                1_000,
                1,
            ),
        );
        contests.insert(
            "uncontested".to_string(),
            Contest::new(
                [("only".to_string(), 800u64)]
                    .into_iter()
                    .collect::<IndexMap<_, _>>(),
                1_000,
                1,
            ),
        );
        let margins = compute_margins(&contests);
        let empty = CandidateCounts::new();

        assert_eq!(
            expected_sample_size(&contests["landslide"], &margins["landslide"], &empty, 0.1, 0.5),
            SizeEstimate::NoAudit
        );
        assert_eq!(
            expected_sample_size(&contests["tie"], &margins["tie"], &empty, 0.1, 0.5),
            SizeEstimate::FullCount(1_000)
        );
        assert_eq!(
            expected_sample_size(&contests["uncontested"], &margins["uncontested"], &empty, 0.1, 0.5),
            SizeEstimate::NoAudit
        );
    }

    #[test]
    fn asn_clamps_when_sample_is_already_conclusive() {
        let mut contests = Contests::new();
        let votes: CandidateCounts = [("winner".to_string(), 600u64), ("loser".to_string(), 400)]
            .into_iter()
            .collect();
        contests.insert("c".to_string(), Contest::new(votes, 1_000, 1));
        let margins = compute_margins(&contests).shift_remove("c").unwrap();
        let contest = &contests["c"];

        let size = expected_sample_size(
            contest,
            &margins,
            &counts(&[("winner", 200), ("loser", 20)]),
            0.1,
            0.5,
        );
        assert_eq!(size, SizeEstimate::Size(0));
    }
}
