use std::collections::HashMap;

use ballot_types::PollId;

use crate::tables::Tables;

/// Result of a consistency check over loaded tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub users: usize,
    pub polls: usize,
    pub votes: usize,
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    /// Returns `true` if all checks passed.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub poll: PollId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// An option counter differs from the number of votes for that option.
    TallyMismatch,
    /// A vote names an option the poll does not have.
    UnknownOption,
    /// Votes are recorded for a poll that does not exist.
    OrphanVotes,
}

/// Check every poll/vote invariant without modifying anything.
pub fn check(tables: &Tables) -> ConsistencyReport {
    let mut violations = Vec::new();

    for (poll_id, votes) in tables.votes.iter() {
        if !tables.polls.contains_key(poll_id) {
            violations.push(Violation {
                poll: poll_id.clone(),
                kind: ViolationKind::OrphanVotes,
                description: format!("{} vote(s) for a poll that does not exist", votes.len()),
            });
        }
    }

    for (poll_id, poll) in tables.polls.iter() {
        let mut counted: HashMap<&str, u64> = HashMap::new();
        if let Some(votes) = tables.votes.get(poll_id) {
            for (voter, vote) in votes.iter() {
                if poll.has_option(&vote.option) {
                    *counted.entry(vote.option.as_str()).or_default() += 1;
                } else {
                    violations.push(Violation {
                        poll: poll_id.clone(),
                        kind: ViolationKind::UnknownOption,
                        description: format!("{voter} voted for unknown option {:?}", vote.option),
                    });
                }
            }
        }

        for (label, &stored) in poll.options.iter() {
            let actual = counted.get(label.as_str()).copied().unwrap_or(0);
            if stored != actual {
                violations.push(Violation {
                    poll: poll_id.clone(),
                    kind: ViolationKind::TallyMismatch,
                    description: format!(
                        "option {label:?} counts {stored} but {actual} vote(s) are recorded"
                    ),
                });
            }
        }
    }

    ConsistencyReport {
        users: tables.users.len(),
        polls: tables.polls.len(),
        votes: tables.vote_count(),
        violations,
    }
}

/// What [`reconcile`] changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Polls whose orphaned vote sets were dropped.
    pub orphaned_polls: Vec<PollId>,
    /// Votes dropped because they named an unknown option.
    pub dropped_votes: usize,
    /// Polls whose counters were recomputed from vote records.
    pub recounted_polls: Vec<PollId>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.orphaned_polls.is_empty() && self.dropped_votes == 0 && self.recounted_polls.is_empty()
    }
}

/// Restore the invariants after an interrupted write.
///
/// Vote records are authoritative for counters and poll presence is
/// authoritative for vote sets: orphaned vote sets and votes for unknown
/// options are dropped, then every counter is recomputed from the remaining
/// votes.
pub(crate) fn reconcile(tables: &mut Tables) -> RepairReport {
    let mut report = RepairReport::default();

    let polls = &tables.polls;
    let mut orphaned = Vec::new();
    tables.votes.retain(|poll_id, _| {
        let keep = polls.contains_key(poll_id);
        if !keep {
            orphaned.push(poll_id.clone());
        }
        keep
    });
    report.orphaned_polls = orphaned;

    for (poll_id, poll) in tables.polls.iter_mut() {
        let mut counted: HashMap<String, u64> = HashMap::new();
        if let Some(votes) = tables.votes.get_mut(poll_id) {
            report.dropped_votes += votes.retain(|_, vote| poll.has_option(&vote.option));
            for vote in votes.values() {
                *counted.entry(vote.option.clone()).or_default() += 1;
            }
        }

        let mut changed = false;
        for (label, count) in poll.options.iter_mut() {
            let actual = counted.get(label).copied().unwrap_or(0);
            if *count != actual {
                *count = actual;
                changed = true;
            }
        }
        if changed {
            report.recounted_polls.push(poll_id.clone());
        }
    }

    report
}
