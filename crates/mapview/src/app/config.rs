use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mapkit::LoopConfig;
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_FILE_NAME: &str = "mapview.json";

/// Optional overrides read from `<root>/mapview.json`. Absent keys keep the
/// `LoopConfig` defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) window_title: Option<String>,
    pub(crate) window_width: Option<u32>,
    pub(crate) window_height: Option<u32>,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) start_zoom: Option<i32>,
    pub(crate) tiles_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path} at `{field_path}`: {source}")]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config file {path}: window size must be non-zero")]
    ZeroWindowSize { path: PathBuf },
}

impl FileConfig {
    /// Relative `tiles_dir` values resolve against `root`.
    pub(crate) fn apply(self, mut config: LoopConfig, root: &Path) -> LoopConfig {
        if let Some(title) = self.window_title {
            config.window_title = title;
        }
        if let Some(width) = self.window_width {
            config.window_width = width;
        }
        if let Some(height) = self.window_height {
            config.window_height = height;
        }
        if let Some(cap) = self.max_render_fps {
            config.max_render_fps = Some(cap);
        }
        if let Some(zoom) = self.start_zoom {
            config.start_zoom = zoom;
        }
        if let Some(tiles_dir) = self.tiles_dir {
            config.tiles_dir = Some(if tiles_dir.is_absolute() {
                tiles_dir
            } else {
                root.join(tiles_dir)
            });
        }
        config
    }
}

/// `Ok(None)` when the file does not exist.
pub(crate) fn load_file_config(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let parsed = parse_file_config(path, &raw)?;
    if parsed.window_width == Some(0) || parsed.window_height == Some(0) {
        return Err(ConfigError::ZeroWindowSize {
            path: path.to_path_buf(),
        });
    }
    Ok(Some(parsed))
}

fn parse_file_config(path: &Path, raw: &str) -> Result<FileConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, FileConfig>(&mut deserializer).map_err(|error| {
        let field_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field_path: if field_path.is_empty() {
                ".".to_string()
            } else {
                field_path
            },
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_file_config(&dir.path().join(CONFIG_FILE_NAME)).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{ "window_title": "Harbor map", "window_width": 1600, "tiles_dir": "tiles" }"#,
        )
        .expect("write config");

        let file_config = load_file_config(&path).expect("load").expect("present");
        let config = file_config.apply(LoopConfig::default(), dir.path());

        assert_eq!(config.window_title, "Harbor map");
        assert_eq!(config.window_width, 1600);
        assert_eq!(config.window_height, LoopConfig::default().window_height);
        assert_eq!(config.tiles_dir, Some(dir.path().join("tiles")));
    }

    #[test]
    fn type_errors_name_the_field_path() {
        let error = parse_file_config(Path::new("mapview.json"), r#"{ "window_width": "wide" }"#)
            .expect_err("bad width");
        match &error {
            ConfigError::Parse { field_path, .. } => assert_eq!(field_path, "window_width"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().contains("`window_width`"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = parse_file_config(Path::new("mapview.json"), r#"{ "fullscreen": true }"#)
            .expect_err("unknown key");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "window_height": 0 }"#).expect("write config");
        assert!(matches!(
            load_file_config(&path),
            Err(ConfigError::ZeroWindowSize { .. })
        ));
    }
}
