//! Record store adapter.
//!
//! [`StudentStore`] owns validation, normalization, identity assignment and
//! the mirror export; the [`RecordBackend`] implementations only persist.
//! One backend is chosen at open time from [`Config`].

pub mod file;

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::SqliteStore;
use crate::error::StoreError;
use crate::export::FileMirror;
use crate::legacy;
use crate::model::StudentRecord;
use crate::normalize::{canonicalize, validate_required};

pub use file::FileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Database,
}

/// Persistence capability. Records handed to a backend are already
/// canonical and carry an identity.
pub trait RecordBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn describe(&self) -> String;

    /// Backend-native order.
    fn list(&self) -> Result<Vec<StudentRecord>, StoreError>;

    fn insert(&self, record: &StudentRecord) -> Result<(), StoreError>;

    /// `NotFound` when no record has `id`.
    fn replace(&self, id: &str, record: &StudentRecord) -> Result<(), StoreError>;

    /// `NotFound` when no record has `id`.
    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Discard the current set and install `records` as one unit.
    fn replace_all(&self, records: &[StudentRecord]) -> Result<(), StoreError>;

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

pub fn new_identity() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub struct StudentStore {
    backend: Box<dyn RecordBackend>,
    mirror: Option<FileMirror>,
}

impl StudentStore {
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => {
                let backend = SqliteStore::open(url, config.db_timeout)?;
                let mirror = config
                    .mirror_files
                    .then(|| FileMirror::secondary_store(&config.data_dir));
                Ok(Self::with_backend(Box::new(backend), mirror))
            }
            None => {
                let backend = FileStore::open(&config.data_dir)?;
                let mirror = Some(FileMirror::spreadsheet(&config.data_dir));
                Ok(Self::with_backend(Box::new(backend), mirror))
            }
        }
    }

    pub fn with_backend(backend: Box<dyn RecordBackend>, mirror: Option<FileMirror>) -> Self {
        info!(
            kind = ?backend.kind(),
            location = %backend.describe(),
            mirror = mirror.is_some(),
            "student store opened"
        );
        Self { backend, mirror }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    pub fn list(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.backend.list()
    }

    pub fn add(&self, record: StudentRecord) -> Result<StudentRecord, StoreError> {
        validate_required(&record)?;
        let mut rec = canonicalize(record);
        rec.id = Some(new_identity());
        self.backend.insert(&rec)?;
        info!(id = rec.id().unwrap_or_default(), "added student");
        self.mirror_after_write();
        Ok(rec)
    }

    /// Full replacement of every field; the identity is kept.
    pub fn update(&self, id: &str, record: StudentRecord) -> Result<StudentRecord, StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::validation("missing id"));
        }
        validate_required(&record)?;
        let mut rec = canonicalize(record);
        rec.id = Some(id.to_string());
        self.backend.replace(id, &rec)?;
        info!(id, "updated student");
        self.mirror_after_write();
        Ok(rec)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::validation("missing id"));
        }
        self.backend.remove(id)?;
        info!(id, "deleted student");
        self.mirror_after_write();
        Ok(())
    }

    /// Install a whole edited set. Records are canonicalized but not
    /// required-field checked; missing or repeated ids get fresh ones.
    pub fn replace_all(&self, records: Vec<StudentRecord>) -> Result<Vec<StudentRecord>, StoreError> {
        let mut seen = HashSet::new();
        let records: Vec<StudentRecord> = records
            .into_iter()
            .map(|r| {
                let mut r = canonicalize(r);
                let reuse = matches!(r.id(), Some(id) if seen.insert(id.to_string()));
                if !reuse {
                    let id = new_identity();
                    seen.insert(id.clone());
                    r.id = Some(id);
                }
                r
            })
            .collect();
        self.backend.replace_all(&records)?;
        info!(count = records.len(), "replaced student set");
        self.mirror_after_write();
        Ok(records)
    }

    /// `replace_all` for an untyped payload: must be an array of objects.
    pub fn replace_all_json(&self, payload: &serde_json::Value) -> Result<Vec<StudentRecord>, StoreError> {
        let Some(items) = payload.as_array() else {
            return Err(StoreError::validation("students must be an array"));
        };
        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if !item.is_object() {
                return Err(StoreError::validation(format!(
                    "students[{i}] is not a record"
                )));
            }
            let rec = serde_json::from_value::<StudentRecord>(item.clone()).map_err(|e| {
                StoreError::validation(format!("students[{i}] is not a record: {e}"))
            })?;
            records.push(rec);
        }
        self.replace_all(records)
    }

    pub fn import_legacy(&self, path: &Path) -> Result<ImportSummary, StoreError> {
        let parsed = legacy::parse_legacy_roster(path)
            .map_err(|e| StoreError::validation(format!("{e:#}")))?;
        let installed = self.replace_all(parsed.students)?;
        Ok(ImportSummary {
            imported: installed.len(),
            skipped: parsed.skipped,
        })
    }

    /// Move the mirror files to `config.data_dir` and refresh them there.
    /// The backend stays open, so a database keeps its records.
    pub fn relocate_mirror(&mut self, config: &Config) {
        self.mirror = match self.backend.kind() {
            BackendKind::File => Some(FileMirror::spreadsheet(&config.data_dir)),
            BackendKind::Database => config
                .mirror_files
                .then(|| FileMirror::secondary_store(&config.data_dir)),
        };
        info!(dir = %config.data_dir.to_string_lossy(), "mirror relocated");
        self.mirror_after_write();
    }

    pub fn close(self) -> Result<(), StoreError> {
        debug!(location = %self.backend.describe(), "closing student store");
        self.backend.close()
    }

    fn mirror_after_write(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let result = mirror.refresh(|| self.backend.list().map_err(anyhow::Error::from));
        if let Err(e) = result {
            warn!(
                dir = %mirror.data_dir().to_string_lossy(),
                "mirror export failed: {e:#}"
            );
        }
    }
}
