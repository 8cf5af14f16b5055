use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ordered::OrderedMap;
use crate::temporal::Timestamp;

/// Option label to vote count, in the order the options were written.
///
/// Counters are `u64`, so they can never go negative.
pub type Tally = OrderedMap<String, u64>;

/// Identifier of a poll.
///
/// Generated ids are decimal millisecond timestamps; ids loaded from disk
/// may be any string (the sample poll uses `"1"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(String);

impl PollId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value of the id, if it is a decimal number.
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PollId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for PollId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PollId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A question with a fixed, ordered set of options and their counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Tally,
    pub created_at: Timestamp,
    /// Owner email. Absent for seeded polls, which nobody can delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Poll {
    /// Build a poll with every counter at zero.
    ///
    /// Fails with [`TypeError::DuplicateKey`] if a label repeats.
    pub fn new<I>(
        question: impl Into<String>,
        labels: I,
        created_by: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Tally::new();
        for label in labels {
            options.try_insert(label, 0)?;
        }
        Ok(Self {
            question: question.into(),
            options,
            created_at,
            created_by,
        })
    }

    pub fn has_option(&self, label: &str) -> bool {
        self.options.contains_key(label)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.values().sum()
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.created_by.as_deref() == Some(email)
    }

    /// Increment one option counter by exactly one.
    /// Returns `false` if the label is not an option of this poll.
    pub fn record_vote(&mut self, label: &str) -> bool {
        match self.options.get_mut(label) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }
}
