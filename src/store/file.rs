use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::StoreError;
use crate::export::{write_json_atomic, DATA_FILE};
use crate::model::StudentRecord;
use crate::store::{new_identity, BackendKind, RecordBackend};

/// Accepted on-disk shapes. Writes always produce the bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum DataFile {
    List(Vec<StudentRecord>),
    Wrapped { students: Vec<StudentRecord> },
}

/// JSON array file as the primary store.
///
/// Each read-modify-write holds `lock` and replaces the file by rename. The
/// lock is per process: two daemons pointed at the same file can still lose
/// updates.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let store = Self {
            path: data_dir.join(DATA_FILE),
            lock: Mutex::new(()),
        };
        store.backfill_identities()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()))
    }

    fn read(&self) -> Result<Vec<StudentRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(match serde_json::from_str::<DataFile>(&text)? {
            DataFile::List(v) => v,
            DataFile::Wrapped { students } => students,
        })
    }

    fn write(&self, records: &[StudentRecord]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, records)?;
        Ok(())
    }

    /// Rosters written before identities existed get them once, on open, so
    /// ids stay stable across reads.
    fn backfill_identities(&self) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut records = self.read()?;
        let mut seen = HashSet::new();
        let mut assigned = 0usize;
        for rec in records.iter_mut() {
            let keep = matches!(rec.id(), Some(id) if !id.trim().is_empty() && seen.insert(id.to_string()));
            if !keep {
                let id = new_identity();
                seen.insert(id.clone());
                rec.id = Some(id);
                assigned += 1;
            }
        }
        if assigned > 0 {
            self.write(&records)?;
            info!(assigned, path = %self.path.to_string_lossy(), "assigned identities to stored students");
        }
        Ok(())
    }

    fn position(records: &[StudentRecord], id: &str) -> Result<usize, StoreError> {
        records
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

impl RecordBackend for FileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn describe(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn list(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let _guard = self.guard()?;
        self.read()
    }

    fn insert(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut records = self.read()?;
        records.push(record.clone());
        self.write(&records)
    }

    fn replace(&self, id: &str, record: &StudentRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut records = self.read()?;
        let idx = Self::position(&records, id)?;
        records[idx] = record.clone();
        self.write(&records)
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut records = self.read()?;
        let idx = Self::position(&records, id)?;
        records.remove(idx);
        self.write(&records)
    }

    fn replace_all(&self, records: &[StudentRecord]) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        self.write(records)
    }
}
