use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod controller;
pub mod feedback;
pub mod interaction;
pub mod layers;
pub mod markers;
pub mod panel;
pub mod projection;
pub mod session;
pub mod storage;
pub mod surface;

pub use app::{run_app, run_app_with_paths, AppError, LoopConfig};
pub use controller::{MapController, UserAlert};
pub use layers::{BaseLayer, OverlayGroup};
pub use markers::{MarkerId, MarkerInputError, MarkerPatch, MarkerRecord, MarkerStore};
pub use panel::{PanelDragController, PointerKind};
pub use projection::{MapCamera, ScreenPoint, Viewport, WorldPoint};
pub use session::{EditFormError, EditSession};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use surface::{MapSurface, MarkerLayer, Popup, PopupAction};

pub const ROOT_ENV_VAR: &str = "MAPVIEW_ROOT";
pub const DATA_DIR_ENV_VAR: &str = "MAPVIEW_DATA_DIR";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub tiles_dir: PathBuf,
}

impl AppPaths {
    pub fn storage_file(&self) -> PathBuf {
        self.data_dir.join(storage::STORAGE_FILE_NAME)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "MAPVIEW_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not find the project root above {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
export {env_var}=\"/path/to/mapview\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let data_dir = match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        Ok(_) | Err(env::VarError::NotPresent) => root.join("data"),
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: DATA_DIR_ENV_VAR,
                source,
            })
        }
    };
    let tiles_dir = root.join("assets").join("tiles");

    fs::create_dir_all(&data_dir).map_err(|source| StartupError::CreateDataDir {
        path: data_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        data_dir,
        tiles_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && (path.join("crates").is_dir() || path.join("assets").is_dir())
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
