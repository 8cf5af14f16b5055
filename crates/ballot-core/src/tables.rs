//! Typed views of the three persisted tables.

use ballot_store::{Document, StoreError, Table, TableStore};
use ballot_types::{OrderedMap, Poll, PollId, PollVotes, UserRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// `email -> user`.
pub type UsersTable = OrderedMap<String, UserRecord>;
/// `poll id -> poll`, in creation order.
pub type PollsTable = OrderedMap<PollId, Poll>;
/// `poll id -> (voter email -> vote)`.
pub type VotesTable = OrderedMap<PollId, PollVotes>;

/// A decoded snapshot of every table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tables {
    pub users: UsersTable,
    pub polls: PollsTable,
    pub votes: VotesTable,
}

impl Tables {
    /// Load and decode every table from `store`.
    ///
    /// A table whose rows do not match the expected shape is reported as
    /// [`StoreError::Corrupt`].
    pub fn load(store: &dyn TableStore) -> Result<Self, StoreError> {
        Ok(Self {
            users: decode(Table::Users, store.load(Table::Users)?)?,
            polls: decode(Table::Polls, store.load(Table::Polls)?)?,
            votes: decode(Table::Votes, store.load(Table::Votes)?)?,
        })
    }

    /// Encode one table as a store document.
    pub fn encode(&self, table: Table) -> Result<Document, StoreError> {
        match table {
            Table::Users => encode(table, &self.users),
            Table::Polls => encode(table, &self.polls),
            Table::Votes => encode(table, &self.votes),
        }
    }

    /// Number of vote records across all polls.
    pub fn vote_count(&self) -> usize {
        self.votes.values().map(|votes| votes.len()).sum()
    }
}

pub(crate) fn decode<T: DeserializeOwned>(table: Table, document: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document)).map_err(|e| StoreError::Corrupt {
        table,
        reason: e.to_string(),
    })
}

pub(crate) fn encode<T: Serialize>(table: Table, rows: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(rows).map_err(|e| StoreError::Serialization(e.to_string()))? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::Serialization(format!(
            "{table} table did not encode to a JSON object"
        ))),
    }
}
