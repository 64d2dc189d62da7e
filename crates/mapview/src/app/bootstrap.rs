use mapkit::{resolve_app_paths, AppPaths, LoopConfig, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_file_config, ConfigError, CONFIG_FILE_NAME};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) paths: AppPaths,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Map Markers Startup ===");

    let paths = resolve_app_paths()?;
    let config_path = paths.root.join(CONFIG_FILE_NAME);
    let config = match load_file_config(&config_path)? {
        Some(file_config) => {
            info!(path = %config_path.display(), "config_file_loaded");
            file_config.apply(LoopConfig::default(), &paths.root)
        }
        None => LoopConfig::default(),
    };

    Ok(AppWiring { config, paths })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
