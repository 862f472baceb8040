//! Application configuration stored in config.toml next to the executable.

use camino::{Utf8Path, Utf8PathBuf};
use directories_next::ProjectDirs;
use ltk_activation::ActivationConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

/// Raw GitHub location of the community skin repository.
pub const DEFAULT_SKIN_REPOSITORY: &str =
    "https://raw.githubusercontent.com/Alban1911/LeagueSkins/main/skins";

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// `mod-tools` executable. Defaults to `managers/` next to this executable.
    pub mod_tools_path: Option<Utf8PathBuf>,
    /// Where downloads, the overlay and logs live. Defaults to the user's local data dir.
    pub data_dir: Option<Utf8PathBuf>,
    /// Base URL skin bundles are fetched from.
    pub skin_repository_url: Option<String>,
    /// Where a fresh injector library is fetched from when security software
    /// blocked the current one.
    pub helper_refresh_url: Option<String>,
    pub activation: ActivationConfig,
}

impl AppConfig {
    pub fn skin_repository(&self) -> &str {
        self.skin_repository_url
            .as_deref()
            .unwrap_or(DEFAULT_SKIN_REPOSITORY)
    }

    /// Configured data dir, the platform default, or `./data` as a last resort.
    pub fn resolved_data_dir(&self) -> Utf8PathBuf {
        self.data_dir
            .clone()
            .or_else(default_data_dir)
            .unwrap_or_else(|| Utf8PathBuf::from("data"))
    }

    pub fn log_dir(&self) -> Utf8PathBuf {
        self.resolved_data_dir().join("logs")
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("config.toml"))
}

pub fn default_data_dir() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "LeagueToolkit", "ltk-activate")?;
    Utf8PathBuf::from_path_buf(dirs.data_local_dir().to_path_buf()).ok()
}

/// Loads config from `path`, falling back to defaults if it is missing or unreadable.
pub fn load_config_from(path: &Utf8Path) -> AppConfig {
    let Ok(content) = fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Ignoring malformed {}: {}", path, e);
            AppConfig::default()
        }
    }
}

/// Loads the application configuration from config.toml.
pub fn load_config() -> AppConfig {
    default_config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}

pub fn save_config_to(path: &Utf8Path, cfg: &AppConfig) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, content)
}

/// Saves the application configuration to config.toml.
#[allow(unused)]
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    let path = default_config_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
    })?;
    save_config_to(&path, cfg)
}
