use crate::traits::Table;

/// Errors from table store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored table exists but is not a JSON object.
    #[error("corrupt {table} table: {reason}")]
    Corrupt { table: Table, reason: String },

    /// A save failure requested through fault injection.
    #[error("injected save failure on {table} table")]
    Injected { table: Table },

    /// A save was attempted through a handle opened for reading only.
    #[error("store opened read-only; refusing to save {table} table")]
    ReadOnly { table: Table },

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
