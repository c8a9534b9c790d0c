//! Quorum voting over the shared roster.
//!
//! Both the dare vote (majority) and the rematch vote (unanimous) are the
//! same shape: a set of required voters, one yes/no ballot per voter, and
//! a pure resolution over the ballots. The caller rebuilds the round from
//! the latest room snapshot on every change, so the required set always
//! reflects the currently connected players: a voter who drops out stops
//! blocking resolution as soon as presence marks them disconnected.

use crate::signature::content_signature;
use crate::types::PlayerId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePolicy {
    /// Passes when yes-votes reach ceil(total / 2). An exact 50/50 split
    /// on an even voter count therefore passes.
    Majority,
    /// Passes only when every required voter says yes; any no fails the
    /// round immediately, without waiting for the rest.
    Unanimous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Not every required voter has balloted yet
    Pending,
    Completed,
    Failed,
}

/// One round of voting: who must vote, and who voted what
#[derive(Debug, Clone)]
pub struct VoteRound {
    policy: VotePolicy,
    required: BTreeSet<PlayerId>,
    ballots: BTreeMap<PlayerId, bool>,
}

impl VoteRound {
    pub fn new(policy: VotePolicy, required: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            policy,
            required: required.into_iter().collect(),
            ballots: BTreeMap::new(),
        }
    }

    /// Record a ballot. Re-voting overwrites the previous ballot; ballots
    /// from voters outside the required set are kept but never counted.
    pub fn record(&mut self, voter: PlayerId, yes: bool) {
        self.ballots.insert(voter, yes);
    }

    /// Replace the required voter set (e.g. after a presence change)
    pub fn set_required(&mut self, required: impl IntoIterator<Item = PlayerId>) {
        self.required = required.into_iter().collect();
    }

    pub fn required_count(&self) -> usize {
        self.required.len()
    }

    pub fn yes_count(&self) -> usize {
        self.counted_ballots().filter(|(_, yes)| **yes).count()
    }

    pub fn no_count(&self) -> usize {
        self.counted_ballots().filter(|(_, yes)| !**yes).count()
    }

    /// Whether every required voter has balloted
    pub fn is_complete(&self) -> bool {
        self.required.iter().all(|v| self.ballots.contains_key(v))
    }

    /// Resolve the round. Pure over the current ballots and required set;
    /// calling it repeatedly on the same state yields the same outcome.
    pub fn outcome(&self) -> VoteOutcome {
        match self.policy {
            VotePolicy::Unanimous => {
                // A single no fails the round without waiting for the rest
                if self.counted_ballots().any(|(_, yes)| !yes) {
                    return VoteOutcome::Failed;
                }
                if self.is_complete() && self.required_count() > 0 {
                    VoteOutcome::Completed
                } else {
                    VoteOutcome::Pending
                }
            }
            VotePolicy::Majority => {
                if !self.is_complete() || self.required_count() == 0 {
                    return VoteOutcome::Pending;
                }
                let total = self.required_count();
                let needed = total.div_ceil(2);
                if self.yes_count() >= needed {
                    VoteOutcome::Completed
                } else {
                    VoteOutcome::Failed
                }
            }
        }
    }

    fn counted_ballots(&self) -> impl Iterator<Item = (&PlayerId, &bool)> {
        self.ballots
            .iter()
            .filter(|(voter, _)| self.required.contains(*voter))
    }
}

/// Idempotency token for applying a vote outcome exactly once.
///
/// The token identifies the voted-on subject instance (e.g. which dare,
/// by performer and assignment timestamp), not the ballots: applying the
/// outcome records the token, and any later evaluation of the same round
/// compares against it before acting again.
pub fn resolution_token(subject: &str, timestamp: &str) -> String {
    content_signature(&[subject, timestamp])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(policy: VotePolicy, voters: &[&str]) -> VoteRound {
        VoteRound::new(policy, voters.iter().map(|v| v.to_string()))
    }

    #[test]
    fn test_majority_two_voters_split_completes() {
        // ceil(2/2) = 1, so one yes out of two carries the vote
        let mut vote = round(VotePolicy::Majority, &["a", "b"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), false);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_majority_three_voters_needs_two_yes() {
        // ceil(3/2) = 2
        let mut vote = round(VotePolicy::Majority, &["a", "b", "c"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), false);
        vote.record("c".to_string(), false);
        assert_eq!(vote.outcome(), VoteOutcome::Failed);

        vote.record("b".to_string(), true);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_majority_four_voters_tie_completes() {
        // ceil(4/2) = 2, so 2 yes / 2 no passes
        let mut vote = round(VotePolicy::Majority, &["a", "b", "c", "d"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), true);
        vote.record("c".to_string(), false);
        vote.record("d".to_string(), false);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_majority_pending_until_all_ballots_in() {
        let mut vote = round(VotePolicy::Majority, &["a", "b", "c"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), true);
        // Already a majority of yes, but c has not voted yet
        assert_eq!(vote.outcome(), VoteOutcome::Pending);

        vote.record("c".to_string(), false);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_revote_overwrites_previous_ballot() {
        let mut vote = round(VotePolicy::Majority, &["a", "b"]);
        vote.record("a".to_string(), false);
        vote.record("b".to_string(), false);
        assert_eq!(vote.outcome(), VoteOutcome::Failed);

        vote.record("a".to_string(), true);
        assert_eq!(vote.yes_count(), 1);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_shrinking_required_set_unblocks_resolution() {
        let mut vote = round(VotePolicy::Majority, &["a", "b", "c"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), true);
        assert_eq!(vote.outcome(), VoteOutcome::Pending);

        // c disconnects; the round re-resolves over who is still here
        vote.set_required(["a".to_string(), "b".to_string()]);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_ballots_outside_required_set_are_not_counted() {
        let mut vote = round(VotePolicy::Majority, &["a", "b"]);
        vote.record("a".to_string(), false);
        vote.record("b".to_string(), false);
        vote.record("ghost".to_string(), true);
        assert_eq!(vote.yes_count(), 0);
        assert_eq!(vote.outcome(), VoteOutcome::Failed);
    }

    #[test]
    fn test_unanimous_fails_fast_on_first_no() {
        let mut vote = round(VotePolicy::Unanimous, &["a", "b", "c"]);
        vote.record("a".to_string(), false);
        // Two voters outstanding, but the round is already lost
        assert_eq!(vote.outcome(), VoteOutcome::Failed);
    }

    #[test]
    fn test_unanimous_requires_every_yes() {
        let mut vote = round(VotePolicy::Unanimous, &["a", "b", "c"]);
        vote.record("a".to_string(), true);
        vote.record("b".to_string(), true);
        assert_eq!(vote.outcome(), VoteOutcome::Pending);

        vote.record("c".to_string(), true);
        assert_eq!(vote.outcome(), VoteOutcome::Completed);
    }

    #[test]
    fn test_empty_required_set_stays_pending() {
        let vote = round(VotePolicy::Majority, &[]);
        assert_eq!(vote.outcome(), VoteOutcome::Pending);
        let vote = round(VotePolicy::Unanimous, &[]);
        assert_eq!(vote.outcome(), VoteOutcome::Pending);
    }

    #[test]
    fn test_resolution_token_is_stable_per_subject() {
        let a = resolution_token("p-1", "2026-01-01T10:00:00Z");
        let b = resolution_token("p-1", "2026-01-01T10:00:00Z");
        assert_eq!(a, b);

        // A new dare for the same player gets a fresh token
        let c = resolution_token("p-1", "2026-01-01T10:05:00Z");
        assert_ne!(a, c);
        assert_ne!(a, resolution_token("p-2", "2026-01-01T10:00:00Z"));
    }
}
