use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{Document, Table, TableStore};

/// JSON file backend: `<dir>/users.json`, `<dir>/polls.json`,
/// `<dir>/votes.json`.
///
/// Files are written pretty-printed with a four-space indent. Every save is
/// an atomic replace: the new document goes to a temp file in the same
/// directory, is fsynced, renamed over the target, and the directory entry
/// is fsynced.
///
/// The process must be the only writer of the directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (or create) a data directory.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened JSON table store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `table`.
    pub fn path_for(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    fn encode(document: &Document) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }
}

impl TableStore for JsonFileStore {
    fn load(&self, table: Table) -> StoreResult<Document> {
        let path = self.path_for(table);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(%table, "table file absent; starting empty");
                return Ok(Document::new());
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            table,
            reason: e.to_string(),
        })?;

        match value {
            Value::Object(document) => {
                debug!(%table, rows = document.len(), "table loaded");
                Ok(document)
            }
            other => Err(StoreError::Corrupt {
                table,
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    fn save(&self, table: Table, document: &Document) -> StoreResult<()> {
        let bytes = Self::encode(document)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(table))
            .map_err(|e| StoreError::Io(e.error))?;
        sync_dir(&self.dir)?;

        debug!(%table, rows = document.len(), bytes = bytes.len(), "table saved");
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

// Directory handles cannot be fsynced on this platform; the rename itself is
// the durability point.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
