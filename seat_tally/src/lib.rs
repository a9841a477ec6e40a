/*!
Multi-seat tabulation of ranked ballots, one election and one elimination per round.

Each round counts, for every ballot, the first choice that is still active (neither
elected nor eliminated). The candidate with the most votes is elected and the one
with the fewest votes is eliminated. Ties on either side go to the candidate that
comes first in the order the candidates were registered. Counting stops when all
the seats are filled or when every candidate has been elected or eliminated.

There is no quota and no transfer of surplus: every counted ballot weighs one vote
in every round.

```
use seat_tally::{run_tabulation, Ballot};

let candidates: Vec<String> = ["X", "Y", "Z"].iter().map(|s| s.to_string()).collect();
let ballot = |xs: &[&str]| Ballot::new(&xs.iter().map(|s| s.to_string()).collect::<Vec<_>>());
let ballots = vec![
    ballot(&["X", "Y", "Z"]),
    ballot(&["X", "Y", "Z"]),
    ballot(&["Y", "Z", "X"]),
];

let result = run_tabulation(&candidates, &ballots, 1);
assert_eq!(result.winners, vec!["X".to_string()]);
assert_eq!(result.eliminated, vec!["Z".to_string()]);
```
*/

pub mod builder;
mod config;
pub mod manual;
mod validator;

use log::{debug, info, warn};

use std::{
    collections::{HashMap, HashSet},
    ops::AddAssign,
};

pub use crate::config::*;
pub use crate::validator::validate_ballot;

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
    const ONE: VoteCount = VoteCount(1);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// The ballot choices, restricted to registered candidates and in rank order.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotInternal {
    ranks: Vec<CandidateId>,
}

// The elected and eliminated candidates so far.
// The vectors keep the order of the decisions, the sets answer membership.
#[derive(Debug, Default)]
struct Standing {
    elected: Vec<CandidateId>,
    elected_set: HashSet<CandidateId>,
    eliminated: Vec<CandidateId>,
    eliminated_set: HashSet<CandidateId>,
}

impl Standing {
    fn is_active(&self, cid: &CandidateId) -> bool {
        !self.elected_set.contains(cid) && !self.eliminated_set.contains(cid)
    }

    fn elect(&mut self, cid: CandidateId) {
        self.elected.push(cid);
        self.elected_set.insert(cid);
    }

    fn eliminate(&mut self, cid: CandidateId) {
        self.eliminated.push(cid);
        self.eliminated_set.insert(cid);
    }
}

// The tally of a round, in canonical candidate order. Tie breaks depend on this order.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RoundTally {
    counts: Vec<(CandidateId, VoteCount)>,
    exhausted: VoteCount,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct RoundResult {
    tally: RoundTally,
    top: CandidateId,
    bottom: CandidateId,
}

/// Runs the tabulation for the given candidates and ballots.
///
/// Arguments:
/// * `candidates` the registered candidates. Their order is the canonical order used to
/// break ties. A name listed twice only counts once.
/// * `ballots` the ballots to count. They are expected to be validated already; entries
/// that do not name a registered candidate are skipped.
/// * `seats` the number of seats to fill.
///
/// The tabulation never fails. When there are fewer candidates than seats, fewer winners
/// are returned.
///
/// The top and the bottom of a round are picked independently. When a single candidate is
/// left active, or when all the active candidates are tied, the same candidate is both
/// elected and eliminated in that round.
pub fn run_tabulation(candidates: &[String], ballots: &[Ballot], seats: u32) -> ElectionResult {
    info!(
        "Processing {:?} ballots, {:?} candidates, {:?} seats",
        ballots.len(),
        candidates.len(),
        seats
    );

    let cr = checks(ballots, candidates);
    for (name, cid) in cr.candidates.iter() {
        info!("Candidate: {}: {}", cid.0, name);
    }
    let candidates_by_id: HashMap<CandidateId, String> = cr
        .candidates
        .iter()
        .map(|(name, cid)| (*cid, name.clone()))
        .collect();
    let num_candidates = cr.candidates.len();
    let seats = seats as usize;

    let mut standing = Standing::default();
    let mut round_stats: Vec<RoundStats> = Vec::new();

    while standing.elected.len() < seats
        && standing.elected.len() + standing.eliminated.len() < num_candidates
    {
        let round_id = (round_stats.len() + 1) as RoundId;
        let round_res = match run_one_round(&cr.votes, &cr.candidates, &standing) {
            Some(r) => r,
            None => {
                debug!("Round {}: no active candidate left, stopping", round_id);
                break;
            }
        };

        let stats = round_result_to_stat(&round_res, round_id, &candidates_by_id);
        info!(
            "Round {}: elected {} eliminated {} ({} exhausted)",
            round_id, stats.elected, stats.eliminated, stats.exhausted
        );
        debug!("Round {}: tally {:?}", round_id, stats.tally);
        round_stats.push(stats);

        standing.elect(round_res.top);
        standing.eliminate(round_res.bottom);
    }

    let names = |cids: &[CandidateId]| -> Vec<String> {
        cids.iter()
            .filter_map(|cid| candidates_by_id.get(cid).cloned())
            .collect()
    };
    let mut winners = names(&standing.elected);
    winners.truncate(seats);

    ElectionResult {
        seats: seats as u32,
        winners,
        eliminated: names(&standing.eliminated),
        round_stats,
    }
}

fn round_result_to_stat(
    round_res: &RoundResult,
    round_id: RoundId,
    candidates_by_id: &HashMap<CandidateId, String>,
) -> RoundStats {
    let name = |cid: &CandidateId| candidates_by_id.get(cid).cloned().unwrap_or_default();
    RoundStats {
        round: round_id,
        tally: round_res
            .tally
            .counts
            .iter()
            .map(|(cid, vc)| (name(cid), vc.0))
            .collect(),
        elected: name(&round_res.top),
        eliminated: name(&round_res.bottom),
        exhausted: round_res.tally.exhausted.0,
    }
}

fn compute_tally(
    votes: &[BallotInternal],
    candidate_names: &[(String, CandidateId)],
    standing: &Standing,
) -> RoundTally {
    // Start every active candidate at zero, in candidate order, so that candidates
    // without any vote are still counted.
    let mut counts: Vec<(CandidateId, VoteCount)> = candidate_names
        .iter()
        .filter(|(_, cid)| standing.is_active(cid))
        .map(|(_, cid)| (*cid, VoteCount::EMPTY))
        .collect();
    let positions: HashMap<CandidateId, usize> = counts
        .iter()
        .enumerate()
        .map(|(idx, (cid, _))| (*cid, idx))
        .collect();

    let mut exhausted = VoteCount::EMPTY;
    for v in votes.iter() {
        match v.ranks.iter().find_map(|cid| positions.get(cid)) {
            Some(&idx) => counts[idx].1 += VoteCount::ONE,
            None => exhausted += VoteCount::ONE,
        }
    }
    RoundTally { counts, exhausted }
}

/// Returns the candidate to elect and the candidate to eliminate, or None if no
/// candidate is active anymore.
fn run_one_round(
    votes: &[BallotInternal],
    candidate_names: &[(String, CandidateId)],
    standing: &Standing,
) -> Option<RoundResult> {
    let tally = compute_tally(votes, candidate_names, standing);
    debug!("run_one_round: tally: {:?}", tally);

    let (top, _) = first_extreme(&tally.counts, |vc, best| vc > best)?;
    let (bottom, _) = first_extreme(&tally.counts, |vc, best| vc < best)?;
    if top == bottom {
        debug!(
            "run_one_round: {:?} is both top and bottom, elected and eliminated",
            top
        );
    }
    Some(RoundResult { tally, top, bottom })
}

// Scans the tally in order and only replaces the current pick on a strict improvement,
// so the earliest candidate wins every tie.
fn first_extreme(
    counts: &[(CandidateId, VoteCount)],
    improves: impl Fn(VoteCount, VoteCount) -> bool,
) -> Option<(CandidateId, VoteCount)> {
    let mut iter = counts.iter().cloned();
    let first = iter.next()?;
    Some(iter.fold(first, |best, cur| {
        if improves(cur.1, best.1) {
            cur
        } else {
            best
        }
    }))
}

struct CheckResult {
    votes: Vec<BallotInternal>,
    candidates: Vec<(String, CandidateId)>,
}

// Candidates are returned in the same order.
fn checks(coll: &[Ballot], reg_candidates: &[String]) -> CheckResult {
    debug!("checks: coll size: {:?}", coll.len());
    let mut candidates: Vec<(String, CandidateId)> = Vec::new();
    let mut ids: HashMap<&str, CandidateId> = HashMap::new();
    for name in reg_candidates.iter() {
        if ids.contains_key(name.as_str()) {
            warn!("checks: candidate {:?} is registered twice, ignoring", name);
            continue;
        }
        let cid = CandidateId((candidates.len() + 1) as u32);
        ids.insert(name.as_str(), cid);
        candidates.push((name.clone(), cid));
    }

    let votes: Vec<BallotInternal> = coll
        .iter()
        .map(|b| {
            let ranks: Vec<CandidateId> = b
                .choices
                .iter()
                .filter_map(|name| {
                    let cid = ids.get(name.as_str()).cloned();
                    if cid.is_none() {
                        debug!("checks: skipping unregistered choice {:?}", name);
                    }
                    cid
                })
                .collect();
            BallotInternal { ranks }
        })
        .collect();

    CheckResult { votes, candidates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn ballots(bs: &[&[&str]]) -> Vec<Ballot> {
        bs.iter().map(|b| Ballot::new(&names(b))).collect()
    }

    fn tally(xs: &[(&str, u64)]) -> Vec<(String, u64)> {
        xs.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn first_round_elects_leader_and_drops_trailer() {
        init();
        let res = run_tabulation(
            &names(&["X", "Y", "Z"]),
            &ballots(&[&["X", "Y", "Z"], &["X", "Y", "Z"], &["Y", "Z", "X"]]),
            1,
        );
        assert_eq!(res.round_stats.len(), 1);
        let r1 = &res.round_stats[0];
        assert_eq!(r1.round, 1);
        assert_eq!(r1.tally, tally(&[("X", 2), ("Y", 1), ("Z", 0)]));
        assert_eq!(r1.elected, "X");
        assert_eq!(r1.eliminated, "Z");
        assert_eq!(res.winners, names(&["X"]));
        assert_eq!(res.eliminated, names(&["Z"]));
    }

    #[test]
    fn top_tie_goes_to_candidate_order() {
        init();
        // B and A are tied, A comes first in the registration order.
        let res = run_tabulation(
            &names(&["A", "B", "C"]),
            &ballots(&[&["B", "A", "C"], &["A", "B", "C"], &["B", "C", "A"], &["A", "C", "B"]]),
            1,
        );
        assert_eq!(res.round_stats[0].tally, tally(&[("A", 2), ("B", 2), ("C", 0)]));
        assert_eq!(res.winners, names(&["A"]));
    }

    #[test]
    fn bottom_tie_goes_to_candidate_order() {
        init();
        let res = run_tabulation(
            &names(&["A", "B", "C", "D"]),
            &ballots(&[&["A", "B", "C", "D"], &["A", "D", "C", "B"]]),
            1,
        );
        // B, C and D all have zero votes: B is the first of them.
        assert_eq!(res.round_stats[0].eliminated, "B");
    }

    #[test]
    fn later_rounds_skip_decided_candidates() {
        init();
        let res = run_tabulation(
            &names(&["A", "B", "C", "D", "E"]),
            &ballots(&[
                &["A", "B", "C", "D", "E"],
                &["A", "C", "B", "D", "E"],
                &["A", "B", "D", "C", "E"],
                &["E", "C", "A", "B", "D"],
            ]),
            2,
        );
        // Round 1: A 3, B 0, C 0, D 0, E 1 -> A elected, B eliminated.
        // Round 2: C 2, D 1, E 1 -> C elected, D eliminated.
        assert_eq!(res.round_stats.len(), 2);
        assert_eq!(
            res.round_stats[1].tally,
            tally(&[("C", 2), ("D", 1), ("E", 1)])
        );
        assert_eq!(res.winners, names(&["A", "C"]));
        assert_eq!(res.eliminated, names(&["B", "D"]));
    }

    #[test]
    fn exhausted_ballots_count_for_nobody() {
        init();
        let res = run_tabulation(
            &names(&["A", "B", "C", "D"]),
            &ballots(&[&["A", "D"], &["A", "D"], &["B", "C"], &["D", "A"]]),
            2,
        );
        // Round 1: A 2, B 1, C 0, D 1 -> A elected, C eliminated.
        // Round 2: B 1, D 3.
        let r2 = &res.round_stats[1];
        assert_eq!(r2.tally, tally(&[("B", 1), ("D", 3)]));
        assert_eq!(r2.exhausted, 0);
        assert_eq!(res.winners, names(&["A", "D"]));

        // Short ballots run out of choices once their candidates are decided.
        let res = run_tabulation(
            &names(&["A", "B", "C", "D", "E"]),
            &ballots(&[&["A"], &["A"], &["B"], &["C", "D"], &["E"]]),
            3,
        );
        // Round 1: A 2, B 1, C 1, D 0, E 1 -> A elected, D eliminated.
        // Round 2: the two A ballots are exhausted.
        let r2 = &res.round_stats[1];
        assert_eq!(r2.exhausted, 2);
        assert_eq!(r2.tally, tally(&[("B", 1), ("C", 1), ("E", 1)]));
    }

    #[test]
    fn exhausted_ballots_do_not_change_tallies() {
        init();
        let cands = names(&["A", "B", "C", "D", "E"]);
        let base = ballots(&[&["A", "B"], &["A", "C"], &["C", "B"], &["E", "A"]]);
        let mut with_exhausted = base.clone();
        // A is elected in round 1 and B is eliminated, this ballot is exhausted afterwards.
        with_exhausted.push(Ballot::new(&names(&["A", "B"])));
        let a = run_tabulation(&cands, &base, 3);
        let b = run_tabulation(&cands, &with_exhausted, 3);
        assert_eq!(a.round_stats[0].elected, "A");
        assert_eq!(b.round_stats[0].elected, "A");
        for (ra, rb) in a.round_stats.iter().zip(b.round_stats.iter()).skip(1) {
            assert_eq!(ra.tally, rb.tally);
            assert_eq!(rb.exhausted, ra.exhausted + 1);
        }
    }

    #[test]
    fn single_remaining_candidate_is_elected_and_eliminated() {
        init();
        let res = run_tabulation(
            &names(&["X", "Y", "Z"]),
            &ballots(&[&["X", "Y", "Z"], &["X", "Z", "Y"], &["Y", "X", "Z"]]),
            2,
        );
        assert_eq!(res.round_stats.len(), 2);
        let last = &res.round_stats[1];
        assert_eq!(last.tally, tally(&[("Y", 3)]));
        assert_eq!(last.elected, "Y");
        assert_eq!(last.eliminated, "Y");
        assert_eq!(res.winners, names(&["X", "Y"]));
        assert_eq!(res.eliminated, names(&["Z", "Y"]));
    }

    #[test]
    fn more_seats_than_candidates_ends_early() {
        init();
        let res = run_tabulation(
            &names(&["A", "B", "C", "D"]),
            &ballots(&[&["A", "B", "C", "D"], &["B", "A", "D", "C"], &["A", "C", "B", "D"]]),
            10,
        );
        // Every round decides two candidates: two rounds and two winners.
        assert_eq!(res.round_stats.len(), 2);
        assert_eq!(res.winners, names(&["A", "B"]));
        assert!(res.winners.len() < 10);
    }

    #[test]
    fn no_seats_no_rounds() {
        init();
        let res = run_tabulation(&names(&["A", "B"]), &ballots(&[&["A", "B"]]), 0);
        assert!(res.round_stats.is_empty());
        assert!(res.winners.is_empty());
    }

    #[test]
    fn no_candidates_no_rounds() {
        init();
        let res = run_tabulation(&[], &ballots(&[&["A"]]), 3);
        assert!(res.round_stats.is_empty());
        assert!(res.winners.is_empty());
    }

    #[test]
    fn no_ballots_follows_candidate_order() {
        init();
        let res = run_tabulation(&names(&["A", "B", "C", "D"]), &[], 2);
        // All tallies are zero: the first candidate is both top and bottom while it is
        // not alone, so it is elected and eliminated in the same round.
        assert_eq!(res.round_stats[0].elected, "A");
        assert_eq!(res.round_stats[0].eliminated, "A");
        assert_eq!(res.round_stats[1].elected, "B");
        assert_eq!(res.winners, names(&["A", "B"]));
    }

    #[test]
    fn duplicate_registration_counts_once() {
        init();
        let res = run_tabulation(
            &names(&["A", "B", "A"]),
            &ballots(&[&["B", "A"], &["B", "A"], &["A", "B"]]),
            1,
        );
        assert_eq!(res.round_stats[0].tally, tally(&[("A", 1), ("B", 2)]));
        assert_eq!(res.winners, names(&["B"]));
    }

    #[test]
    fn tabulation_is_deterministic() {
        init();
        let cands = names(&["P", "Q", "R", "S", "T", "U"]);
        let bs = ballots(&[
            &["P", "Q", "R", "S", "T", "U"],
            &["U", "T", "S", "R", "Q", "P"],
            &["R", "P", "U", "Q", "S", "T"],
            &["Q", "R", "P", "T", "U", "S"],
            &["U", "P", "Q", "S", "R", "T"],
        ]);
        let first = run_tabulation(&cands, &bs, 3);
        for _ in 0..5 {
            assert_eq!(run_tabulation(&cands, &bs, 3), first);
        }
    }

    #[test]
    fn tallies_cover_exactly_the_active_candidates() {
        init();
        let cands = names(&["A", "B", "C", "D", "E", "F", "G"]);
        let bs = ballots(&[
            &["G", "F", "E", "D", "C", "B", "A"],
            &["A", "C", "E", "G", "B", "D", "F"],
            &["D", "A", "B", "C", "G", "E", "F"],
            &["B", "D", "F", "A", "C", "E", "G"],
        ]);
        let res = run_tabulation(&cands, &bs, 7);
        assert!(res.round_stats.len() <= cands.len());
        assert!(res.winners.len() <= 7 && res.winners.len() <= cands.len());

        let mut decided: HashSet<String> = HashSet::new();
        for rs in res.round_stats.iter() {
            let active: Vec<String> = cands
                .iter()
                .filter(|c| !decided.contains(*c))
                .cloned()
                .collect();
            let tallied: Vec<String> = rs.tally.iter().map(|(n, _)| n.clone()).collect();
            assert_eq!(tallied, active);
            decided.insert(rs.elected.clone());
            decided.insert(rs.eliminated.clone());
        }
    }
}
