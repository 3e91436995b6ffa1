//! Least-loaded reviewer selection.
//!
//! Pure computation over a candidate pool and the current review load of
//! each candidate. Candidates are ranked by ascending load; candidates with
//! equal load are ordered uniformly at random so that concurrent requests do
//! not all pile onto the lowest user id.
//!
//! The database side (who is an active team member, how many assignments
//! each person holds) lives in [`crate::db::roster`]; callers read both inside
//! their transaction and hand the results here.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Maximum number of reviewers attached to a pull request.
pub const MAX_REVIEWERS: usize = 2;

/// A potential reviewer and their current global review load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: i64,
    pub load: i64,
}

/// Pair each member with their load; members absent from `loads` have none.
pub fn build_candidates(members: &[i64], loads: &HashMap<i64, i64>) -> Vec<Candidate> {
    members
        .iter()
        .map(|&user_id| Candidate {
            user_id,
            load: loads.get(&user_id).copied().unwrap_or(0),
        })
        .collect()
}

/// Order candidates by ascending load with a uniformly random tie-break.
///
/// Shuffling first and then sorting stably keeps equal-load candidates in
/// their shuffled relative order.
pub fn rank_candidates<R: Rng + ?Sized>(mut candidates: Vec<Candidate>, rng: &mut R) -> Vec<Candidate> {
    candidates.shuffle(rng);
    candidates.sort_by_key(|c| c.load);
    candidates
}

/// Pick up to `limit` initial reviewers for a new pull request.
///
/// The author is dropped from the pool even if the caller forgot to
/// exclude them. An empty pool yields an empty selection.
pub fn select_initial_reviewers_with<R: Rng + ?Sized>(
    candidates: Vec<Candidate>,
    author_id: i64,
    limit: usize,
    rng: &mut R,
) -> Vec<i64> {
    let eligible = candidates
        .into_iter()
        .filter(|c| c.user_id != author_id)
        .collect();

    let mut selected: Vec<i64> = Vec::with_capacity(limit);
    for candidate in rank_candidates(eligible, rng) {
        if selected.len() == limit {
            break;
        }
        if !selected.contains(&candidate.user_id) {
            selected.push(candidate.user_id);
        }
    }
    selected
}

/// [`select_initial_reviewers_with`] using the thread-local RNG.
pub fn select_initial_reviewers(candidates: Vec<Candidate>, author_id: i64, limit: usize) -> Vec<i64> {
    select_initial_reviewers_with(candidates, author_id, limit, &mut rand::thread_rng())
}

/// Pick the replacement for a reviewer being reassigned away.
///
/// Every id in `excluded` (the outgoing reviewer, the PR's current
/// reviewers and its author) is removed from the pool. Returns `None` when
/// nobody is left.
pub fn select_replacement_with<R: Rng + ?Sized>(
    candidates: Vec<Candidate>,
    excluded: &[i64],
    rng: &mut R,
) -> Option<i64> {
    let eligible = candidates
        .into_iter()
        .filter(|c| !excluded.contains(&c.user_id))
        .collect();

    rank_candidates(eligible, rng).first().map(|c| c.user_id)
}

/// [`select_replacement_with`] using the thread-local RNG.
pub fn select_replacement(candidates: Vec<Candidate>, excluded: &[i64]) -> Option<i64> {
    select_replacement_with(candidates, excluded, &mut rand::thread_rng())
}
