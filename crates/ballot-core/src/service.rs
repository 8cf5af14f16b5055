use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ballot_store::{Document, StoreError, Table, TableStore};
use ballot_types::PollId;
use tracing::{error, info, warn};

use crate::directory::UserDirectory;
use crate::error::{BallotError, Result};
use crate::ids::PollIdGenerator;
use crate::ledger::VoteLedger;
use crate::password::PasswordHasher;
use crate::registry::PollRegistry;
use crate::tables::{self, PollsTable, Tables, UsersTable, VotesTable};
use crate::validation::{self, ConsistencyReport, RepairReport};

/// Verified against when an unknown email tries to log in, so both failure
/// branches cost one hash verification.
const DUMMY_SECRET: &str = "ballot-dummy-secret";

/// The poll and vote service.
///
/// Owns the store handle, the write-through cache of all three tables, the
/// password hasher and the poll id generator. Share it between threads with
/// an `Arc`.
///
/// Reads take a shared lock on the cache. Every mutation holds the exclusive
/// lock while it validates, stages its changes on copies of the affected
/// tables, saves them and finally swaps the copies into the cache. A failed
/// save leaves the cache exactly as it was.
pub struct Ballot {
    store: Arc<dyn TableStore>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: String,
    mode: Mode,
    state: RwLock<State>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    ReadWrite,
    ReadOnly,
}

struct State {
    tables: Tables,
    ids: PollIdGenerator,
}

impl Ballot {
    /// Load every table from `store`, repair any inconsistency left by an
    /// interrupted write, and persist the repairs.
    pub fn open(store: Arc<dyn TableStore>, hasher: Arc<dyn PasswordHasher>) -> Result<Self> {
        Self::load(store, hasher, Mode::ReadWrite)
    }

    /// Like [`Ballot::open`], but never writes to `store`.
    ///
    /// Repairs are applied to the in-memory view only, and every mutation
    /// fails with [`StoreError::ReadOnly`]. Use this for inspecting a data
    /// directory that a running server may own.
    pub fn open_read_only(
        store: Arc<dyn TableStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self> {
        Self::load(store, hasher, Mode::ReadOnly)
    }

    fn load(store: Arc<dyn TableStore>, hasher: Arc<dyn PasswordHasher>, mode: Mode) -> Result<Self> {
        let mut tables = Tables::load(store.as_ref())?;

        let repairs = validation::reconcile(&mut tables);
        if !repairs.is_empty() {
            warn!(
                orphaned_polls = repairs.orphaned_polls.len(),
                dropped_votes = repairs.dropped_votes,
                recounted_polls = repairs.recounted_polls.len(),
                persisted = mode == Mode::ReadWrite,
                "repaired inconsistent tables on open"
            );
            if mode == Mode::ReadWrite {
                persist_repairs(store.as_ref(), &tables, &repairs)?;
            }
        }

        let unverifiable = tables
            .users
            .values()
            .filter(|user| !hasher.recognizes(&user.password_hash))
            .count();
        if unverifiable > 0 {
            warn!(
                users = unverifiable,
                "stored password hashes in an unsupported format; these accounts cannot log in"
            );
        }

        let mut ids = PollIdGenerator::new();
        for id in tables.polls.keys() {
            ids.observe(id);
        }

        let dummy_hash = hasher.hash(DUMMY_SECRET)?;

        info!(
            users = tables.users.len(),
            polls = tables.polls.len(),
            votes = tables.vote_count(),
            read_only = mode == Mode::ReadOnly,
            "ballot opened"
        );

        Ok(Self {
            store,
            hasher,
            dummy_hash,
            mode,
            state: RwLock::new(State { tables, ids }),
        })
    }

    /// Registration and login.
    pub fn users(&self) -> UserDirectory<'_> {
        UserDirectory::new(self)
    }

    /// Poll creation, lookup and deletion.
    pub fn polls(&self) -> PollRegistry<'_> {
        PollRegistry::new(self)
    }

    /// Vote casting and reporting.
    pub fn votes(&self) -> VoteLedger<'_> {
        VoteLedger::new(self)
    }

    /// Check the cached tables against every poll/vote invariant.
    pub fn check(&self) -> Result<ConsistencyReport> {
        self.read(validation::check)
    }

    pub(crate) fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    /// Run `f` against the cached tables under the shared lock.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T> {
        let state = self.read_state()?;
        Ok(f(&state.tables))
    }

    /// Run a mutation under the exclusive lock.
    ///
    /// `f` validates and stages its changes on the [`Draft`]. If it returns
    /// `Ok`, every staged table is saved and then swapped into the cache.
    /// If `f` or any save fails, the cache is left untouched.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut Draft<'_>) -> Result<T>) -> Result<T> {
        let mut state = self.write_state()?;
        let State { tables, ids } = &mut *state;

        let mut draft = Draft::new(tables, ids);
        let value = f(&mut draft)?;
        let staged = draft.into_staged();

        self.commit(tables, staged)?;
        Ok(value)
    }

    /// Run a mutation on one existing poll.
    ///
    /// Fails with [`BallotError::PollNotFound`] before `f` runs if the poll
    /// does not exist.
    pub(crate) fn with_poll<T>(
        &self,
        poll_id: &PollId,
        f: impl FnOnce(&mut Draft<'_>) -> Result<T>,
    ) -> Result<T> {
        self.write(|draft| {
            if !draft.polls().contains_key(poll_id) {
                return Err(BallotError::PollNotFound(poll_id.clone()));
            }
            f(draft)
        })
    }

    fn commit(&self, tables: &mut Tables, staged: Staged) -> Result<()> {
        let order = if staged.polls_first {
            [Table::Users, Table::Polls, Table::Votes]
        } else {
            [Table::Users, Table::Votes, Table::Polls]
        };

        // Encode everything before the first save so a serialization fault
        // cannot leave a half-written change behind.
        let mut documents: Vec<(Table, Document)> = Vec::new();
        for table in order {
            if let Some(document) = staged.encode(table)? {
                documents.push((table, document));
            }
        }

        if let (Mode::ReadOnly, Some((table, _))) = (self.mode, documents.first()) {
            return Err(StoreError::ReadOnly { table: *table }.into());
        }

        let mut written: Vec<Table> = Vec::new();
        for (table, document) in &documents {
            if let Err(err) = self.store.save(*table, document) {
                self.roll_back(tables, &written);
                return Err(err.into());
            }
            written.push(*table);
        }

        staged.apply(tables);
        Ok(())
    }

    /// Restore tables already written by a failed commit from the cache.
    fn roll_back(&self, tables: &Tables, written: &[Table]) {
        for &table in written.iter().rev() {
            let restored = tables
                .encode(table)
                .and_then(|document| self.store.save(table, &document));
            if let Err(err) = restored {
                error!(%table, error = %err, "rollback failed; store diverges until next open");
            }
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| BallotError::Storage(StoreError::LockPoisoned))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| BallotError::Storage(StoreError::LockPoisoned))
    }
}

impl std::fmt::Debug for Ballot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ballot").finish_non_exhaustive()
    }
}

fn persist_repairs(
    store: &dyn TableStore,
    tables: &Tables,
    repairs: &RepairReport,
) -> Result<()> {
    if !repairs.orphaned_polls.is_empty() || repairs.dropped_votes > 0 {
        store.save(Table::Votes, &tables.encode(Table::Votes)?)?;
    }
    if !repairs.recounted_polls.is_empty() {
        store.save(Table::Polls, &tables.encode(Table::Polls)?)?;
    }
    Ok(())
}

/// Copy-on-write view of the tables inside a mutation.
///
/// Reads see staged changes. The first mutable access to a table clones it
/// from the cache; only cloned tables are saved on commit.
pub(crate) struct Draft<'a> {
    current: &'a Tables,
    ids: &'a mut PollIdGenerator,
    users: Option<UsersTable>,
    polls: Option<PollsTable>,
    votes: Option<VotesTable>,
    polls_first: bool,
}

impl<'a> Draft<'a> {
    fn new(current: &'a Tables, ids: &'a mut PollIdGenerator) -> Self {
        Self {
            current,
            ids,
            users: None,
            polls: None,
            votes: None,
            polls_first: false,
        }
    }

    pub(crate) fn users(&self) -> &UsersTable {
        self.users.as_ref().unwrap_or(&self.current.users)
    }

    pub(crate) fn polls(&self) -> &PollsTable {
        self.polls.as_ref().unwrap_or(&self.current.polls)
    }

    pub(crate) fn votes(&self) -> &VotesTable {
        self.votes.as_ref().unwrap_or(&self.current.votes)
    }

    pub(crate) fn users_mut(&mut self) -> &mut UsersTable {
        let current = self.current;
        self.users.get_or_insert_with(|| current.users.clone())
    }

    pub(crate) fn polls_mut(&mut self) -> &mut PollsTable {
        let current = self.current;
        self.polls.get_or_insert_with(|| current.polls.clone())
    }

    pub(crate) fn votes_mut(&mut self) -> &mut VotesTable {
        let current = self.current;
        self.votes.get_or_insert_with(|| current.votes.clone())
    }

    pub(crate) fn ids(&mut self) -> &mut PollIdGenerator {
        &mut *self.ids
    }

    /// Save the polls table before the votes table.
    ///
    /// Removals write polls first and additions write votes first, so a
    /// crash between the two saves leaves votes that the next open either
    /// drops as orphans or counts.
    pub(crate) fn save_polls_first(&mut self) {
        self.polls_first = true;
    }

    fn into_staged(self) -> Staged {
        Staged {
            users: self.users,
            polls: self.polls,
            votes: self.votes,
            polls_first: self.polls_first,
        }
    }
}

struct Staged {
    users: Option<UsersTable>,
    polls: Option<PollsTable>,
    votes: Option<VotesTable>,
    polls_first: bool,
}

impl Staged {
    fn encode(&self, table: Table) -> std::result::Result<Option<Document>, StoreError> {
        match table {
            Table::Users => self.users.as_ref().map(|t| tables::encode(table, t)).transpose(),
            Table::Polls => self.polls.as_ref().map(|t| tables::encode(table, t)).transpose(),
            Table::Votes => self.votes.as_ref().map(|t| tables::encode(table, t)).transpose(),
        }
    }

    fn apply(self, tables: &mut Tables) {
        if let Some(users) = self.users {
            tables.users = users;
        }
        if let Some(polls) = self.polls {
            tables.polls = polls;
        }
        if let Some(votes) = self.votes {
            tables.votes = votes;
        }
    }
}
