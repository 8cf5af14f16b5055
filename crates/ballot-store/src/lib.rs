//! Durable table storage for Ballot.
//!
//! Ballot keeps three logical tables (users, polls, votes). Each table is a
//! single JSON object document that is always loaded and saved whole.
//!
//! # Storage Backends
//!
//! All backends implement the [`TableStore`] trait:
//!
//! - [`JsonFileStore`] -- one pretty-printed JSON file per table
//! - [`InMemoryTableStore`] -- `HashMap`-based store with fault injection,
//!   for tests and embedding
//!
//! # Design Rules
//!
//! 1. `load` of a table that was never saved returns an empty document.
//! 2. `save` replaces the whole table; there is no partial merge.
//! 3. When `save` returns `Ok`, the data survives a crash. The file backend
//!    writes a temp file, fsyncs it, renames it over the target and fsyncs
//!    the directory, so a crash leaves either the old or the new table.
//! 4. All I/O errors are propagated, never silently ignored.
//! 5. The store never interprets table contents.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryTableStore;
pub use traits::{Document, Table, TableStore};
