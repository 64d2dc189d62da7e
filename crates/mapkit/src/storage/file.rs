use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError, DEFAULT_RETENTION_DAYS};

pub const STORAGE_FILE_NAME: &str = "storage.json";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
struct StoredEntry {
    value: String,
    expires_at: i64,
}

/// Key/value entries kept in a single JSON document. Every write rewrites the
/// document through a temp file so a crash never leaves a torn file behind.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    retention_days: i64,
    entries: BTreeMap<String, StoredEntry>,
}

impl FileKeyValueStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_retention(path, DEFAULT_RETENTION_DAYS)
    }

    pub fn open_with_retention(path: impl Into<PathBuf>, retention_days: i64) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        debug!(
            path = %path.display(),
            entry_count = entries.len(),
            "storage_opened"
        );
        Self {
            path,
            retention_days: retention_days.max(1),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_at(&self, key: &str, now_unix: i64) -> Option<String> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now_unix)
            .map(|entry| entry.value.clone())
    }

    fn set_at(&mut self, key: &str, value: &str, now_unix: i64) -> Result<(), StorageError> {
        let expires_at = now_unix.saturating_add(self.retention_days * SECONDS_PER_DAY);
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        self.flush(now_unix)
    }

    fn flush(&mut self, now_unix: i64) -> Result<(), StorageError> {
        self.entries.retain(|_, entry| entry.expires_at > now_unix);
        let text =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StorageError::Encode {
                path: self.path.clone(),
                source,
            })?;
        write_text_atomic(&self.path, &text).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, now_unix())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_at(key, value, now_unix())
    }
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn read_entries(path: &Path) -> BTreeMap<String, StoredEntry> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "storage_read_failed");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str::<BTreeMap<String, StoredEntry>>(&raw) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "storage_unparseable");
            BTreeMap::new()
        }
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text.as_bytes())?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::rename(tmp_path, final_path) {
        Ok(()) => Ok(()),
        // Some platforms refuse to rename over an existing file.
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            debug!(path = %final_path.display(), "storage_replace_fallback");
            fs::remove_file(final_path)
                .and_then(|()| fs::rename(tmp_path, final_path))
                .inspect_err(|_| {
                    let _ = fs::remove_file(tmp_path);
                })
        }
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            Err(error)
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(STORAGE_FILE_NAME);
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
