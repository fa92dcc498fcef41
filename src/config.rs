use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::info;

use crate::i18n::Lang;

pub const DATABASE_URL_VAR: &str = "ERASMUS_DATABASE_URL";
pub const DATA_DIR_VAR: &str = "ERASMUS_DATA_DIR";
pub const DB_TIMEOUT_VAR: &str = "ERASMUS_DB_TIMEOUT_MS";
pub const MIRROR_FILES_VAR: &str = "ERASMUS_MIRROR_FILES";
pub const LANG_VAR: &str = "ERASMUS_LANG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Presence selects database mode; absence selects the file store.
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub db_timeout: Duration,
    /// Database mode only: keep `data.json` as a secondary file store.
    pub mirror_files: bool,
    pub lang: Lang,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let data_dir = PathBuf::from(try_load::<String, _>(&lookup, DATA_DIR_VAR, ".")?);
        let timeout_ms: u64 = try_load(&lookup, DB_TIMEOUT_VAR, "5000")?;
        let mirror_files = parse_flag(&try_load::<String, _>(&lookup, MIRROR_FILES_VAR, "true")?)
            .with_context(|| format!("invalid {MIRROR_FILES_VAR}"))?;
        let lang_raw: String = try_load(&lookup, LANG_VAR, "es")?;
        let lang = Lang::parse(&lang_raw)
            .ok_or_else(|| anyhow!("invalid {LANG_VAR} value: {lang_raw} (expected es or ca)"))?;

        Ok(Self {
            database_url,
            data_dir,
            db_timeout: Duration::from_millis(timeout_ms),
            mirror_files,
            lang,
        })
    }

    pub fn is_database_mode(&self) -> bool {
        self.database_url.is_some()
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_select_file_mode() {
        let cfg = Config::from_lookup(lookup_from(&[])).expect("defaults");
        assert!(!cfg.is_database_mode());
        assert_eq!(cfg.data_dir, PathBuf::from("."));
        assert_eq!(cfg.db_timeout, Duration::from_millis(5000));
        assert!(cfg.mirror_files);
        assert_eq!(cfg.lang, Lang::Es);
    }

    #[test]
    fn connection_string_selects_database_mode() {
        let cfg = Config::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "sqlite:///tmp/erasmus.sqlite3"),
            (DB_TIMEOUT_VAR, "250"),
            (MIRROR_FILES_VAR, "off"),
            (LANG_VAR, "ca"),
        ]))
        .expect("config");
        assert!(cfg.is_database_mode());
        assert_eq!(cfg.db_timeout, Duration::from_millis(250));
        assert!(!cfg.mirror_files);
        assert_eq!(cfg.lang, Lang::Ca);
    }

    #[test]
    fn blank_connection_string_means_file_mode() {
        let cfg = Config::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "  ")])).expect("config");
        assert!(!cfg.is_database_mode());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[(DB_TIMEOUT_VAR, "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(MIRROR_FILES_VAR, "maybe")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(LANG_VAR, "fr")])).is_err());
    }
}
