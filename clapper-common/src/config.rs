//! Configuration loading
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CLAPPER_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The bot token and the catalog API key have no default; startup fails
//! with [`Error::Config`] when neither source provides them.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";
pub const DEFAULT_CHAT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Values supplied on the command line; `None` falls through to lower priorities
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub bot_token: Option<String>,
    pub chat_api_base: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_base: Option<String>,
    pub tmdb_image_base: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub bot_token: Option<String>,
    pub chat_api_base: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_base: Option<String>,
    pub tmdb_image_base: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

/// Fully resolved bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub bot_token: String,
    pub chat_api_base: String,
    pub tmdb_api_key: String,
    pub tmdb_api_base: String,
    pub tmdb_image_base: String,
    pub http_timeout: Duration,
}

impl BotConfig {
    /// Merge command-line overrides, `CLAPPER_*` environment variables and
    /// the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let database_path = overrides
            .database_path
            .or_else(|| env_var("CLAPPER_DATABASE_PATH").map(PathBuf::from))
            .or(file.database_path)
            .unwrap_or_else(default_database_path);

        let bind_address = pick(overrides.bind_address, "CLAPPER_BIND_ADDRESS", file.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let bot_token = pick(overrides.bot_token, "CLAPPER_BOT_TOKEN", file.bot_token)
            .ok_or_else(|| missing("bot_token", "CLAPPER_BOT_TOKEN"))?;

        let chat_api_base = pick(overrides.chat_api_base, "CLAPPER_CHAT_API_BASE", file.chat_api_base)
            .unwrap_or_else(|| DEFAULT_CHAT_API_BASE.to_string());

        let tmdb_api_key = pick(overrides.tmdb_api_key, "CLAPPER_TMDB_API_KEY", file.tmdb_api_key)
            .ok_or_else(|| missing("tmdb_api_key", "CLAPPER_TMDB_API_KEY"))?;

        let tmdb_api_base = pick(overrides.tmdb_api_base, "CLAPPER_TMDB_API_BASE", file.tmdb_api_base)
            .unwrap_or_else(|| DEFAULT_TMDB_API_BASE.to_string());

        let tmdb_image_base = pick(
            overrides.tmdb_image_base,
            "CLAPPER_TMDB_IMAGE_BASE",
            file.tmdb_image_base,
        )
        .unwrap_or_else(|| DEFAULT_TMDB_IMAGE_BASE.to_string());

        let http_timeout_secs = match overrides.http_timeout_secs {
            Some(secs) => secs,
            None => match env_var("CLAPPER_HTTP_TIMEOUT_SECS") {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    Error::Config(format!("CLAPPER_HTTP_TIMEOUT_SECS is not a number: {}", raw))
                })?,
                None => file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            },
        };

        if http_timeout_secs == 0 {
            return Err(Error::Config("http_timeout_secs must be positive".to_string()));
        }

        Ok(BotConfig {
            database_path,
            bind_address,
            bot_token,
            chat_api_base: chat_api_base.trim_end_matches('/').to_string(),
            tmdb_api_key,
            tmdb_api_base: tmdb_api_base.trim_end_matches('/').to_string(),
            tmdb_image_base: tmdb_image_base.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// Read the TOML config file
///
/// An explicit path must exist. Without one the platform locations are
/// tried and a missing file yields an empty config.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// `~/.config/clapper/config.toml` first, then `/etc/clapper/config.toml`
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("clapper").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/clapper/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("clapper"))
        .unwrap_or_else(|| PathBuf::from("./clapper_data"))
        .join("clapper.db")
}

fn pick(cli: Option<String>, env_name: &str, file: Option<String>) -> Option<String> {
    cli.or_else(|| env_var(env_name)).or(file)
}

// Empty variables count as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn missing(key: &str, env_name: &str) -> Error {
    Error::Config(format!(
        "{} is required (pass it on the command line, set {}, or add it to config.toml)",
        key, env_name
    ))
}
