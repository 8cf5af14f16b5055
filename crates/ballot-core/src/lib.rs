//! Poll and vote logic for Ballot.
//!
//! A [`Ballot`] instance owns a [`TableStore`](ballot_store::TableStore), a
//! write-through cache of the users, polls and votes tables, a
//! [`PasswordHasher`] and the poll id generator. Its three views split the
//! operations by concern:
//!
//! - [`UserDirectory`] -- registration and login
//! - [`PollRegistry`] -- poll creation, lookup, deletion and seeding
//! - [`VoteLedger`] -- one vote per voter per poll, tallies and reports
//!
//! # Invariants
//!
//! 1. Every option counter equals the number of votes recorded for it.
//! 2. A voter has at most one vote per poll, and it never changes.
//! 3. Every vote names an option of its poll.
//! 4. Votes exist only for polls that exist.
//!
//! Mutations hold an exclusive lock from validation to the swap into the
//! cache, and the cache is only updated after every affected table has been
//! saved. [`check`] verifies the invariants over any set of loaded tables.

pub mod directory;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod options;
pub mod password;
pub mod registry;
pub mod service;
pub mod tables;
pub mod validation;
mod werkzeug;

pub use directory::UserDirectory;
pub use error::{BallotError, Result};
pub use ids::PollIdGenerator;
pub use ledger::{PollResults, VoteLedger};
pub use options::{parse_options, validate_options, MIN_OPTIONS};
pub use password::{Argon2Hasher, PasswordHasher};
pub use registry::{PollRegistry, SAMPLE_POLL_ID};
pub use service::Ballot;
pub use tables::Tables;
pub use validation::{check, ConsistencyReport, RepairReport, Violation, ViolationKind};
