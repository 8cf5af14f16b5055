use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{Document, Table, TableStore};

/// In-memory, HashMap-based table store.
///
/// Intended for tests and embedding. Documents are cloned on load and save.
/// Save failures can be injected per table or after a number of successful
/// saves, which is how callers prove that a failed save leaves their own
/// state untouched.
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<Table, Document>>,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    failing_tables: HashSet<Table>,
    /// Saves still allowed before every save fails.
    remaining_saves: Option<u64>,
    save_count: u64,
}

impl InMemoryTableStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Put a raw document in place without going through `save`.
    pub fn insert_raw(&self, table: Table, document: Document) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        tables.insert(table, document);
        Ok(())
    }

    /// Make every subsequent save to `table` fail.
    pub fn fail_saves_to(&self, table: Table) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failing_tables.insert(table);
        }
    }

    /// Allow `n` more successful saves, then fail every save.
    pub fn fail_after_saves(&self, n: u64) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.remaining_saves = Some(n);
        }
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failing_tables.clear();
            faults.remaining_saves = None;
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> u64 {
        self.faults.lock().map(|f| f.save_count).unwrap_or(0)
    }

    fn check_fault(&self, table: Table) -> StoreResult<()> {
        let mut faults = self.faults.lock().map_err(|_| StoreError::LockPoisoned)?;
        if faults.failing_tables.contains(&table) {
            return Err(StoreError::Injected { table });
        }
        match faults.remaining_saves {
            Some(0) => return Err(StoreError::Injected { table }),
            Some(n) => faults.remaining_saves = Some(n - 1),
            None => {}
        }
        faults.save_count += 1;
        Ok(())
    }
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for InMemoryTableStore {
    fn load(&self, table: Table) -> StoreResult<Document> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }

    fn save(&self, table: Table, document: &Document) -> StoreResult<()> {
        self.check_fault(table)?;
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        tables.insert(table, document.clone());
        debug!(%table, rows = document.len(), "table saved in memory");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows: Vec<(Table, usize)> = self
            .tables
            .read()
            .map(|t| t.iter().map(|(k, v)| (*k, v.len())).collect())
            .unwrap_or_default();
        f.debug_struct("InMemoryTableStore")
            .field("rows", &rows)
            .finish()
    }
}
