use ballot_types::{Poll, PollId, PollVotes, Profile, Tally, Timestamp, VoteRecord, VoterDetail};
use serde::Serialize;
use tracing::info;

use crate::error::{BallotError, Result};
use crate::service::Ballot;

/// A poll together with every vote cast in it, read at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PollResults {
    pub id: PollId,
    pub poll: Poll,
    pub voters: Vec<VoterDetail>,
}

/// One vote per voter per poll, counted into the poll's tally.
#[derive(Clone, Copy, Debug)]
pub struct VoteLedger<'a> {
    ballot: &'a Ballot,
}

impl<'a> VoteLedger<'a> {
    pub(crate) fn new(ballot: &'a Ballot) -> Self {
        Self { ballot }
    }

    pub fn has_voted(&self, poll_id: &PollId, voter: &str) -> Result<bool> {
        self.ballot.read(|tables| {
            tables
                .votes
                .get(poll_id)
                .is_some_and(|votes| votes.contains_key(voter))
        })
    }

    /// Record `voter`'s choice and return the updated tally.
    ///
    /// Checks run in order: the poll exists, the voter has not voted yet,
    /// the option belongs to the poll. Nothing changes unless all pass.
    /// `profile` is stored with the vote as it is now; later profile
    /// changes do not affect it.
    pub fn cast_vote(
        &self,
        poll_id: &PollId,
        voter: &str,
        option: &str,
        profile: Profile,
    ) -> Result<Tally> {
        let tally = self.ballot.with_poll(poll_id, |draft| {
            let already_voted = draft
                .votes()
                .get(poll_id)
                .is_some_and(|votes| votes.contains_key(voter));
            if already_voted {
                return Err(BallotError::AlreadyVoted {
                    poll: poll_id.clone(),
                    voter: voter.to_string(),
                });
            }

            let poll = draft
                .polls_mut()
                .get_mut(poll_id)
                .ok_or_else(|| BallotError::PollNotFound(poll_id.clone()))?;
            if !poll.record_vote(option) {
                return Err(BallotError::InvalidOption {
                    poll: poll_id.clone(),
                    option: option.to_string(),
                });
            }
            let tally = poll.options.clone();

            let record = VoteRecord {
                option: option.to_string(),
                voted_at: Timestamp::now(),
                user_info: profile,
            };
            let votes = draft.votes_mut();
            match votes.get_mut(poll_id) {
                Some(poll_votes) => {
                    poll_votes.insert(voter.to_string(), record);
                }
                None => {
                    let mut poll_votes = PollVotes::new();
                    poll_votes.insert(voter.to_string(), record);
                    votes.insert(poll_id.clone(), poll_votes);
                }
            }
            Ok(tally)
        })?;

        info!(poll = %poll_id, voter, option, "vote cast");
        Ok(tally)
    }

    pub fn tally(&self, poll_id: &PollId) -> Result<Tally> {
        self.ballot
            .read(|tables| tables.polls.get(poll_id).map(|poll| poll.options.clone()))?
            .ok_or_else(|| BallotError::PollNotFound(poll_id.clone()))
    }

    /// Every vote cast in a poll, in cast order.
    ///
    /// A poll without votes, or one that does not exist, yields an empty
    /// list.
    pub fn voter_details(&self, poll_id: &PollId) -> Result<Vec<VoterDetail>> {
        self.ballot.read(|tables| {
            tables
                .votes
                .get(poll_id)
                .map(details)
                .unwrap_or_default()
        })
    }

    /// The poll and its voters under one read lock.
    pub fn results(&self, poll_id: &PollId) -> Result<PollResults> {
        self.ballot
            .read(|tables| {
                let poll = tables.polls.get(poll_id)?.clone();
                let voters = tables.votes.get(poll_id).map(details).unwrap_or_default();
                Some(PollResults {
                    id: poll_id.clone(),
                    poll,
                    voters,
                })
            })?
            .ok_or_else(|| BallotError::PollNotFound(poll_id.clone()))
    }
}

fn details(votes: &PollVotes) -> Vec<VoterDetail> {
    votes
        .iter()
        .map(|(voter, record)| VoterDetail::from_record(voter, record))
        .collect()
}
