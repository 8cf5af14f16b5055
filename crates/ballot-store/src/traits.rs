use std::fmt;

use crate::error::StoreResult;

/// A whole table: a JSON object mapping row keys to row values.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The logical tables Ballot persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Users,
    Polls,
    Votes,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Users, Table::Polls, Table::Votes];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Polls => "polls",
            Table::Votes => "votes",
        }
    }

    /// File name used by the JSON file backend.
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Users => "users.json",
            Table::Polls => "polls.json",
            Table::Votes => "votes.json",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole-table document store.
///
/// All implementations must satisfy these invariants:
/// - `load` of a table that does not exist returns an empty document.
/// - `save` overwrites the table completely with the given document.
/// - `save` returning `Ok` means the document is durable.
/// - A failed `save` leaves the previously stored document in place.
pub trait TableStore: Send + Sync {
    /// Load a whole table.
    fn load(&self, table: Table) -> StoreResult<Document>;

    /// Replace a whole table.
    fn save(&self, table: Table, document: &Document) -> StoreResult<()>;
}
