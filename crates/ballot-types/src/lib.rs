//! Foundation types for Ballot.
//!
//! This crate provides the data model shared by every other Ballot crate:
//! registered users, polls with their option counters, and the per-voter
//! vote records. It performs no I/O.
//!
//! # Key Types
//!
//! - [`UserRecord`] -- a registered account, keyed by email
//! - [`Profile`] -- the non-secret profile fields copied into every vote
//! - [`Principal`] -- an authenticated caller
//! - [`Poll`] / [`PollId`] -- a question with an ordered option set
//! - [`Tally`] -- option label to vote count, in display order
//! - [`VoteRecord`] / [`VoterDetail`] -- one voter's immutable choice
//! - [`Timestamp`] -- second-resolution local wall-clock time
//! - [`OrderedMap`] -- insertion-ordered map serialized as a JSON object

pub mod error;
pub mod ordered;
pub mod poll;
pub mod temporal;
pub mod user;
pub mod vote;

pub use error::TypeError;
pub use ordered::OrderedMap;
pub use poll::{Poll, PollId, Tally};
pub use temporal::{Timestamp, TIMESTAMP_FORMAT};
pub use user::{Principal, Profile, UserRecord};
pub use vote::{PollVotes, VoteRecord, VoterDetail};
