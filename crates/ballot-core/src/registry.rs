use ballot_types::{Poll, PollId, Timestamp};
use tracing::{debug, info};

use crate::error::{BallotError, Result};
use crate::options::{parse_options, validate_options};
use crate::service::Ballot;

/// Id of the poll seeded into an empty polls table.
pub const SAMPLE_POLL_ID: &str = "1";

const SAMPLE_QUESTION: &str = "Which option do you prefer?";
const SAMPLE_OPTIONS: [&str; 3] = ["Option A", "Option B", "Option C"];

/// Poll creation, lookup and deletion.
#[derive(Clone, Copy, Debug)]
pub struct PollRegistry<'a> {
    ballot: &'a Ballot,
}

impl<'a> PollRegistry<'a> {
    pub(crate) fn new(ballot: &'a Ballot) -> Self {
        Self { ballot }
    }

    /// Create a poll from a question and comma-separated option text.
    pub fn create_poll(
        &self,
        question: &str,
        raw_options: &str,
        owner: &str,
    ) -> Result<(PollId, Poll)> {
        let question = question.trim();
        if question.is_empty() {
            return Err(BallotError::Validation("question is required".into()));
        }
        let labels = parse_options(raw_options);
        validate_options(&labels)?;

        let poll = Poll::new(question, labels, Some(owner.to_string()), Timestamp::now())
            .map_err(|e| BallotError::Validation(e.to_string()))?;

        let id = self.ballot.write(|draft| {
            let id = draft
                .ids()
                .next_id()
                .ok_or_else(|| BallotError::IdGeneration("poll id space exhausted".into()))?;
            if draft.polls().contains_key(&id) {
                return Err(BallotError::IdGeneration(format!("poll id {id} already exists")));
            }
            draft.polls_mut().insert(id.clone(), poll.clone());
            Ok(id)
        })?;

        info!(poll = %id, owner, options = poll.options.len(), "poll created");
        Ok((id, poll))
    }

    pub fn get_poll(&self, poll_id: &PollId) -> Result<Poll> {
        self.ballot
            .read(|tables| tables.polls.get(poll_id).cloned())?
            .ok_or_else(|| BallotError::PollNotFound(poll_id.clone()))
    }

    /// Every poll, in creation order.
    pub fn list_polls(&self) -> Result<Vec<(PollId, Poll)>> {
        self.ballot.read(|tables| {
            tables
                .polls
                .iter()
                .map(|(id, poll)| (id.clone(), poll.clone()))
                .collect()
        })
    }

    /// Delete a poll and every vote cast in it.
    ///
    /// Only the owner may delete. A poll without an owner cannot be deleted.
    pub fn delete_poll(&self, poll_id: &PollId, requester: &str) -> Result<()> {
        let removed_votes = self.ballot.with_poll(poll_id, |draft| {
            let owned = draft
                .polls()
                .get(poll_id)
                .is_some_and(|poll| poll.is_owned_by(requester));
            if !owned {
                return Err(BallotError::Unauthorized {
                    poll: poll_id.clone(),
                    requester: requester.to_string(),
                });
            }

            draft.save_polls_first();
            draft.polls_mut().remove(poll_id);
            let removed = if draft.votes().contains_key(poll_id) {
                draft.votes_mut().remove(poll_id).map_or(0, |votes| votes.len())
            } else {
                0
            };
            Ok(removed)
        })?;

        info!(poll = %poll_id, requester, removed_votes, "poll deleted");
        Ok(())
    }

    /// Insert an ownerless sample poll if no poll exists yet.
    ///
    /// Returns the id of the seeded poll, or `None` if polls already exist.
    pub fn seed_sample(&self) -> Result<Option<PollId>> {
        let seeded = self.ballot.write(|draft| {
            if !draft.polls().is_empty() {
                return Ok(None);
            }
            let id = PollId::from(SAMPLE_POLL_ID);
            let poll = Poll::new(
                SAMPLE_QUESTION,
                SAMPLE_OPTIONS.iter().map(|label| label.to_string()),
                None,
                Timestamp::now(),
            )
            .map_err(|e| BallotError::Validation(e.to_string()))?;
            draft.ids().observe(&id);
            draft.polls_mut().insert(id.clone(), poll);
            Ok(Some(id))
        })?;

        match &seeded {
            Some(id) => info!(poll = %id, "sample poll seeded"),
            None => debug!("polls exist; sample poll not seeded"),
        }
        Ok(seeded)
    }
}
