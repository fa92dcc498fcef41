use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::aggregate::DashboardView;
use crate::config::Config;
use crate::error::StoreError;
use crate::geo::ProvinceMap;
use crate::i18n::Lang;
use crate::store::{BackendKind, StudentStore};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Daemon context: the open store plus the memoized dashboard view, which is
/// dropped after every mutation and rebuilt on the next read.
pub struct AppState {
    pub config: Config,
    pub store: Option<StudentStore>,
    pub provinces: ProvinceMap,
    pub lang: Lang,
    view: Option<DashboardView>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let lang = config.lang;
        Self {
            config,
            store: None,
            provinces: ProvinceMap::spain(),
            lang,
            view: None,
        }
    }

    /// Open the store described by `config`, closing any previous one.
    pub fn open_store(&mut self) -> Result<(), StoreError> {
        self.close_store()?;
        self.store = Some(StudentStore::open(&self.config)?);
        Ok(())
    }

    /// Point the daemon at another data directory. A database store stays
    /// open and only its mirror files move; a file store is reopened there.
    pub fn select_workspace(&mut self, data_dir: PathBuf) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.config.data_dir, data_dir);
        if let Some(store) = self.store.as_mut() {
            if store.kind() == BackendKind::Database {
                store.relocate_mirror(&self.config);
                return Ok(());
            }
        }
        let Err(e) = self.open_store() else {
            return Ok(());
        };
        self.config.data_dir = previous;
        if let Err(restore) = self.open_store() {
            warn!(
                dir = %self.config.data_dir.to_string_lossy(),
                error = %restore,
                "failed to reopen previous workspace"
            );
        }
        Err(e)
    }

    pub fn close_store(&mut self) -> Result<(), StoreError> {
        self.view = None;
        match self.store.take() {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }

    pub fn invalidate_view(&mut self) {
        self.view = None;
    }

    pub fn set_lang(&mut self, lang: Lang) {
        if self.lang != lang {
            self.lang = lang;
            self.view = None;
        }
    }

    pub fn view(&mut self) -> Result<&DashboardView, StoreError> {
        let view = match self.view.take() {
            Some(v) => v,
            None => {
                let store = self
                    .store
                    .as_ref()
                    .ok_or_else(|| StoreError::Unavailable("student store is not open".into()))?;
                DashboardView::build(store.list()?, &self.provinces, self.lang)
            }
        };
        Ok(self.view.insert(view))
    }
}
