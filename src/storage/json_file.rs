use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::errors::{LedgerError, Result};

use super::{KeyValueStore, WriteBatch, WriteOp};

const STORE_FILE: &str = "store.json";
const STORE_DIR: &str = "ledger";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "store";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Filesystem locations used by [`JsonFileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub store_file: PathBuf,
    pub backup_root: PathBuf,
}

impl StorePaths {
    /// Standard layout below an application home directory.
    pub fn under(home: &Path) -> Self {
        Self {
            store_file: home.join(STORE_DIR).join(STORE_FILE),
            backup_root: home.join(BACKUP_DIR),
        }
    }
}

/// Key-value store persisted as a single JSON object on disk.
///
/// Every batch is written to a temporary file and renamed over the store file, so a
/// failed write leaves both the file and the in-memory view untouched.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    paths: StorePaths,
    retention: usize,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(paths: StorePaths) -> Result<Self> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StorePaths, retention: usize) -> Result<Self> {
        if let Some(parent) = paths.store_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&paths.backup_root)?;
        let values = read_values(&paths.store_file)?;
        debug!(path = %paths.store_file.display(), keys = values.len(), "opened json store");
        Ok(Self {
            paths,
            retention: retention.max(1),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.paths.store_file
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Copies the current store contents into a timestamped backup file.
    pub fn backup(&self, note: Option<&str>) -> Result<String> {
        fs::create_dir_all(&self.paths.backup_root)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", BACKUP_PREFIX, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let name = format!("{}.{}", stem, BACKUP_EXTENSION);
        let path = self.paths.backup_root.join(&name);
        write_atomic(&path, &serde_json::to_string_pretty(&self.values)?)?;
        self.prune_backups()?;
        info!(backup = %name, "store backup written");
        Ok(name)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        if !self.paths.backup_root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.paths.backup_root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    /// Replaces the store contents with the named backup.
    pub fn restore_backup(&mut self, backup_name: &str) -> Result<()> {
        let path = self.paths.backup_root.join(backup_name);
        if !path.exists() {
            return Err(LedgerError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let values = read_values(&path)?;
        self.persist(&values)?;
        self.values = values;
        info!(backup = %backup_name, "store restored from backup");
        Ok(())
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for name in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.paths.backup_root.join(name));
        }
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(values)?;
        let tmp = tmp_path(&self.paths.store_file);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.paths.store_file)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut staged = self.values.clone();
        for op in batch {
            match op {
                WriteOp::Set { key, value } => {
                    staged.insert(key, value);
                }
                WriteOp::Remove { key } => {
                    staged.remove(&key);
                }
            }
        }
        self.persist(&staged)?;
        self.values = staged;
        Ok(())
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&data)
        .map_err(|err| LedgerError::Storage(format!("{} is not a valid store: {}", path.display(), err)))
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    if segments.len() < 3 {
        return None;
    }
    let date_part = segments.get(1)?;
    let time_part = segments.get(2)?;
    if !is_digits(date_part, 8) || !is_digits(time_part, 4) {
        return None;
    }
    let raw = format!("{}{}", date_part, time_part);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in_temp_dir() -> (JsonFileStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store =
            JsonFileStore::with_retention(StorePaths::under(temp.path()), 2).expect("json store");
        (store, temp)
    }

    #[test]
    fn values_survive_reopen() {
        let (mut store, guard) = store_in_temp_dir();
        store
            .apply(WriteBatch::new().set("limit", "1800").set("total", "0"))
            .expect("apply batch");
        let reopened = JsonFileStore::open(StorePaths::under(guard.path())).expect("reopen");
        assert_eq!(reopened.get("limit").unwrap().as_deref(), Some("1800"));
        assert_eq!(reopened.get("total").unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn backup_notes_are_sanitized() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Diet v2 ")),
            Some("before-diet-v2".to_string())
        );
        assert_eq!(sanitize_backup_note(Some("!!!")), None);
    }

    #[test]
    fn backup_names_parse_their_timestamp() {
        assert!(parse_backup_timestamp("store_20250101_0930.json").is_some());
        assert!(parse_backup_timestamp("store_20250101_0930_note.json").is_some());
        assert!(parse_backup_timestamp("notes.json").is_none());
    }

    #[test]
    fn restore_replaces_current_values() {
        let (mut store, _guard) = store_in_temp_dir();
        store.set("limit", "1500").unwrap();
        let name = store.backup(Some("baseline")).expect("backup");
        store.set("limit", "2500").unwrap();
        store.restore_backup(&name).expect("restore");
        assert_eq!(store.get("limit").unwrap().as_deref(), Some("1500"));
    }

    #[test]
    fn restoring_unknown_backup_fails() {
        let (mut store, _guard) = store_in_temp_dir();
        assert!(matches!(
            store.restore_backup("store_20000101_0000.json"),
            Err(LedgerError::Storage(_))
        ));
    }
}
