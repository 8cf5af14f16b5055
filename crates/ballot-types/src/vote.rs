use serde::{Deserialize, Serialize};

use crate::ordered::OrderedMap;
use crate::temporal::Timestamp;
use crate::user::Profile;

/// A single voter's choice on a poll. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// The chosen option label.
    pub option: String,
    pub voted_at: Timestamp,
    /// Voter profile as it was at cast time.
    pub user_info: Profile,
}

/// All votes on one poll, keyed by voter email, in cast order.
pub type PollVotes = OrderedMap<String, VoteRecord>;

/// One row of the voter-detail report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDetail {
    pub voter_email: String,
    pub selected_option: String,
    pub voted_at: Timestamp,
    pub profile: Profile,
}

impl VoterDetail {
    pub fn from_record(voter_email: &str, record: &VoteRecord) -> Self {
        Self {
            voter_email: voter_email.to_string(),
            selected_option: record.option.clone(),
            voted_at: record.voted_at,
            profile: record.user_info.clone(),
        }
    }
}
