//! Margin model: winner/loser vote-share ratios derived from reported tallies.
//!
//! Margins are a pure function of the reported results. They are recomputed
//! from tallies whenever needed and never mutated by sampling, which is what
//! keeps the risk measurement anchored to the outcome under audit rather
//! than to the sample.

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{Contest, Contests};

/// Vote-share ratios for a reported winner.
#[derive(Debug, Clone, Serialize)]
pub struct WinnerShare {
    /// Fraction of all ballots cast that carry a vote for this winner.
    pub p_w: f64,
    /// Fraction of all votes in the contest for this winner.
    pub s_w: f64,
    /// Per-loser two-way share: `s_w / (s_w + s_l)` for each loser `l`.
    pub swl: IndexMap<String, f64>,
}

/// Vote-share ratios for a reported loser.
#[derive(Debug, Clone, Serialize)]
pub struct LoserShare {
    /// Fraction of all ballots cast that carry a vote for this loser.
    pub p_l: f64,
    /// Fraction of all votes in the contest for this loser.
    pub s_l: f64,
}

/// Derived margins for one contest.
#[derive(Debug, Clone, Serialize)]
pub struct ContestMargins {
    /// Reported winners (the top `num_winners` candidates by tally).
    pub winners: IndexMap<String, WinnerShare>,
    /// Everyone else.
    pub losers: IndexMap<String, LoserShare>,
}

/// Derived margins per contest, keyed by contest name.
pub type Margins = IndexMap<String, ContestMargins>;

/// Derive winner/loser vote-share ratios for every contest.
///
/// Winners are the top `num_winners` candidates by reported votes; ties in
/// the tally are broken by candidate name so the split is deterministic.
/// Contests with no reported votes produce all-zero shares rather than NaN.
pub fn compute_margins(contests: &Contests) -> Margins {
    contests
        .iter()
        .map(|(name, contest)| (name.clone(), contest_margins(contest)))
        .collect()
}

fn contest_margins(contest: &Contest) -> ContestMargins {
    let mut ranked: Vec<(&String, u64)> = contest.votes.iter().map(|(c, &v)| (c, v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total_votes: u64 = contest.votes.values().sum();
    let ballots = contest.ballots as f64;
    let share = |votes: u64, denom: f64| if denom > 0.0 { votes as f64 / denom } else { 0.0 };

    let mut winners: IndexMap<String, WinnerShare> = IndexMap::new();
    let mut losers: IndexMap<String, LoserShare> = IndexMap::new();
    for (rank, (candidate, votes)) in ranked.into_iter().enumerate() {
        if rank < contest.num_winners as usize {
            winners.insert(
                candidate.clone(),
                WinnerShare {
                    p_w: share(votes, ballots),
                    s_w: share(votes, total_votes as f64),
                    swl: IndexMap::new(),
                },
            );
        } else {
            losers.insert(
                candidate.clone(),
                LoserShare {
                    p_l: share(votes, ballots),
                    s_l: share(votes, total_votes as f64),
                },
            );
        }
    }

    for winner in winners.values_mut() {
        for (loser, loser_share) in &losers {
            let denom = winner.s_w + loser_share.s_l;
            let swl = if denom > 0.0 { winner.s_w / denom } else { 0.0 };
            winner.swl.insert(loser.clone(), swl);
        }
    }

    ContestMargins { winners, losers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateCounts;

    fn contest(pairs: &[(&str, u64)], ballots: u64, num_winners: u32) -> Contest {
        let votes: CandidateCounts = pairs
            .iter()
            .map(|(c, v)| (c.to_string(), *v))
            .collect();
        Contest::new(votes, ballots, num_winners)
    }

    #[test]
    fn two_way_contest_shares() {
        let c = contest(&[("winner", 60_000), ("loser", 40_000)], 100_000, 1);
        let margins = contest_margins(&c);

        let w = &margins.winners["winner"];
        assert!((w.p_w - 0.6).abs() < 1e-12);
        assert!((w.s_w - 0.6).abs() < 1e-12);
        assert!((w.swl["loser"] - 0.6).abs() < 1e-12);

        let l = &margins.losers["loser"];
        assert!((l.p_l - 0.4).abs() < 1e-12);
        assert!((l.s_l - 0.4).abs() < 1e-12);
    }

    #[test]
    fn undervotes_separate_ballot_and_vote_shares() {
        // 10k ballots but only 8k votes: p differs from s.
        let c = contest(&[("a", 5_000), ("b", 3_000)], 10_000, 1);
        let margins = contest_margins(&c);

        let w = &margins.winners["a"];
        assert!((w.p_w - 0.5).abs() < 1e-12);
        assert!((w.s_w - 0.625).abs() < 1e-12);
        let l = &margins.losers["b"];
        assert!((l.p_l - 0.3).abs() < 1e-12);
        assert!((l.s_l - 0.375).abs() < 1e-12);
        assert!((w.swl["b"] - 0.625).abs() < 1e-12);
    }

    #[test]
    fn multi_winner_split() {
        let c = contest(&[("a", 400), ("b", 300), ("c", 200), ("d", 100)], 1_000, 2);
        let margins = contest_margins(&c);
        assert_eq!(margins.winners.len(), 2);
        assert!(margins.winners.contains_key("a"));
        assert!(margins.winners.contains_key("b"));
        assert_eq!(margins.losers.len(), 2);
        assert_eq!(margins.winners["a"].swl.len(), 2);
    }

    #[test]
    fn tie_broken_by_name() {
        let c = contest(&[("beta", 500), ("alfa", 500)], 1_000, 1);
        let margins = contest_margins(&c);
        assert!(margins.winners.contains_key("alfa"));
        assert!(margins.losers.contains_key("beta"));
        // A tied race still reports equal shares; downstream sizing treats
        // p_w == p_l as a full hand count.
        assert!((margins.winners["alfa"].p_w - margins.losers["beta"].p_l).abs() < 1e-12);
    }

    #[test]
    fn single_candidate_contest_has_no_losers() {
        let c = contest(&[("only", 10_000)], 10_000, 1);
        let margins = contest_margins(&c);
        assert_eq!(margins.losers.len(), 0);
        assert!((margins.winners["only"].p_w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vote_contest_yields_zero_shares() {
        let c = contest(&[("a", 0), ("b", 0)], 1_000, 1);
        let margins = contest_margins(&c);
        let w = margins.winners.values().next().unwrap();
        assert_eq!(w.p_w, 0.0);
        assert_eq!(w.s_w, 0.0);
        assert!(w.swl.values().all(|&x| x == 0.0));
    }
}
