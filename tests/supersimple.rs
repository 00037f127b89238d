//! Comparison-audit reference scenario: five contests over a 100,000-ballot
//! CVR universe, with the sizing and risk values from Stark's published
//! examples.

use ballot_audit::{
    compute_margins, AuditStrategy, BallotMarks, CandidateCounts, Contest, Contests, CvrSet,
    Margins, SampleObservations, SampleResults, SizingRecommendation, SuperSimple,
};
use indexmap::IndexMap;

const TOTAL_BALLOTS: u64 = 100_000;

fn contest(winner: u64, loser: u64, ballots: u64) -> Contest {
    let votes: CandidateCounts = [("winner".to_string(), winner), ("loser".to_string(), loser)]
        .into_iter()
        .collect();
    Contest::new(votes, ballots, 1)
}

fn contests() -> Contests {
    let mut contests = Contests::new();
    contests.insert("Contest A".to_string(), contest(60_000, 40_000, 100_000));
    contests.insert("Contest B".to_string(), contest(30_000, 24_000, 60_000));
    contests.insert("Contest C".to_string(), contest(18_000, 12_600, 36_000));
    contests.insert("Contest D".to_string(), contest(8_000, 6_000, 15_000));
    contests.insert("Contest E".to_string(), contest(10_000, 0, 10_000));
    contests
}

fn marks(winner: u64, loser: u64) -> IndexMap<String, u64> {
    [("winner".to_string(), winner), ("loser".to_string(), loser)]
        .into_iter()
        .collect()
}

/// Reported CVRs laid out so each contest's winner tally lands on the
/// low-numbered ballots. Ballots outside a contest's range carry no entry
/// for it.
fn cvr_universe() -> CvrSet {
    let mut cvrs = CvrSet::new();
    for i in 0..TOTAL_BALLOTS {
        let mut ballot = BallotMarks::new();
        ballot.insert(
            "Contest A".to_string(),
            if i < 60_000 { marks(1, 0) } else { marks(0, 1) },
        );
        if i < 30_000 {
            ballot.insert("Contest B".to_string(), marks(1, 0));
        } else if i > 30_000 && i < 60_000 {
            ballot.insert("Contest B".to_string(), marks(0, 1));
        }
        if i < 18_000 {
            ballot.insert("Contest C".to_string(), marks(1, 0));
        } else if i > 18_000 && i < 30_600 {
            ballot.insert("Contest C".to_string(), marks(0, 1));
        }
        if i < 8_000 {
            ballot.insert("Contest D".to_string(), marks(1, 0));
        } else if i > 8_000 && i < 14_000 {
            ballot.insert("Contest D".to_string(), marks(0, 1));
        }
        if i < 10_000 {
            ballot.insert("Contest E".to_string(), marks(1, 0));
        }
        cvrs.insert(i.to_string(), ballot);
    }
    cvrs
}

fn fixture() -> (Contests, Margins) {
    let contests = contests();
    let margins = compute_margins(&contests);
    (contests, margins)
}

/// Audited ballot that matches a winner-voting CVR in every contest.
fn clean_audit() -> BallotMarks {
    ["Contest A", "Contest B", "Contest C", "Contest D", "Contest E"]
        .iter()
        .map(|name| (name.to_string(), marks(1, 0)))
        .collect()
}

fn uniform_audit(winner: u64, loser: u64) -> BallotMarks {
    ["Contest A", "Contest B", "Contest C", "Contest D", "Contest E"]
        .iter()
        .map(|name| (name.to_string(), marks(winner, loser)))
        .collect()
}

#[test]
fn diluted_margin_is_two_percent() {
    let (contests, margins) = fixture();
    let audit = SuperSimple::new(0.1).unwrap();
    let dm = audit
        .compute_diluted_margin(&contests, &margins, TOTAL_BALLOTS)
        .unwrap();
    // Contest D's 2,000-vote margin governs.
    assert!((dm - 0.02).abs() < 1e-12);
}

#[test]
fn sample_size_is_761() {
    let (contests, margins) = fixture();
    let audit = SuperSimple::new(0.1).unwrap();
    // Stark's example, plus one ballot for his paper's rounding.
    assert_eq!(
        audit
            .get_sample_sizes(&contests, &margins, TOTAL_BALLOTS)
            .unwrap(),
        761
    );

    let strategy = AuditStrategy::super_simple(0.1).unwrap();
    let sizing = strategy
        .get_sample_sizes(&contests, &margins, &SampleResults::new(), TOTAL_BALLOTS)
        .unwrap();
    assert_eq!(sizing, SizingRecommendation::Uniform(761));
}

#[test]
fn risk_tracks_overstatements() {
    let (contests, margins) = fixture();
    let cvrs = cvr_universe();
    let audit = SuperSimple::new(0.1).unwrap();

    let mut sample = CvrSet::new();
    for i in 0..500u64 {
        sample.insert(i.to_string(), clean_audit());
    }

    // 500 matching ballots: risk about 0.0104, audit can stop.
    let (risk, finished) = audit
        .compute_risk(&contests, &margins, &cvrs, &sample)
        .unwrap();
    assert!((risk - 0.01).abs() <= 0.0005, "risk {risk}");
    assert!(finished);

    // One ballot where the audit found no marks at all: a one-vote
    // overstatement against every winner. Still below the limit.
    sample.insert("0".to_string(), uniform_audit(0, 0));
    let (risk, finished) = audit
        .compute_risk(&contests, &margins, &cvrs, &sample)
        .unwrap();
    assert!((risk - 0.019).abs() <= 0.0005, "risk {risk}");
    assert!(finished);

    // The same ballot audited as a loser vote: a two-vote overstatement.
    sample.insert("0".to_string(), uniform_audit(0, 1));
    let (risk, finished) = audit
        .compute_risk(&contests, &margins, &cvrs, &sample)
        .unwrap();
    assert!((risk - 0.114).abs() <= 0.0005, "risk {risk}");
    assert!(!finished);

    // Three two-vote overstatements leave no usable evidence.
    sample.insert("1".to_string(), uniform_audit(0, 1));
    sample.insert("2".to_string(), uniform_audit(0, 1));
    let (risk, finished) = audit
        .compute_risk(&contests, &margins, &cvrs, &sample)
        .unwrap();
    assert_eq!(risk, 1.0);
    assert!(!finished);
}

#[test]
fn risk_is_invariant_to_cvr_universe_order() {
    let (contests, margins) = fixture();
    let cvrs = cvr_universe();
    let mut reversed = CvrSet::new();
    for (id, ballot) in cvrs.iter().rev() {
        reversed.insert(id.clone(), ballot.clone());
    }

    let mut sample = CvrSet::new();
    for i in 0..50u64 {
        sample.insert(i.to_string(), clean_audit());
    }

    let audit = SuperSimple::new(0.1).unwrap();
    let (forward, _) = audit
        .compute_risk(&contests, &margins, &cvrs, &sample)
        .unwrap();
    let (backward, _) = audit
        .compute_risk(&contests, &margins, &reversed, &sample)
        .unwrap();
    assert!((forward - backward).abs() < 1e-12);
}

#[test]
fn strategy_dispatch_reports_scalar_risk() {
    let (contests, margins) = fixture();
    let cvrs = cvr_universe();
    let mut sample = CvrSet::new();
    for i in 0..500u64 {
        sample.insert(i.to_string(), clean_audit());
    }

    let strategy = AuditStrategy::super_simple(0.1).unwrap();
    let (measurement, finished) = strategy
        .compute_risk(
            &contests,
            &margins,
            SampleObservations::Cvrs {
                cvrs: &cvrs,
                sample: &sample,
            },
        )
        .unwrap();
    assert!(finished);
    let ballot_audit::RiskMeasurement::Scalar(risk) = measurement else {
        panic!("expected a scalar measurement");
    };
    assert!(risk < 0.1);
}
