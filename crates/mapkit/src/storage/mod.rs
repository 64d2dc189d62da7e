use std::path::PathBuf;

use thiserror::Error;

mod file;
mod memory;

pub use file::{FileKeyValueStore, STORAGE_FILE_NAME};
pub use memory::MemoryKeyValueStore;

pub const MARKERS_KEY: &str = "saved_markers";
pub const PANEL_POSITION_KEY: &str = "panel_position";
pub const PANEL_COLLAPSED_KEY: &str = "panel_collapsed";
pub const BASE_LAYER_KEY: &str = "map_layer";

pub const DEFAULT_RETENTION_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to encode storage document for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write storage document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// String key/value persistence, the local-storage stand-in shared by the
/// marker store, the panel and the layer switcher.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}
