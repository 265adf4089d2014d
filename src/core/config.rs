//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars. The only CLI flag, `--loglevel`, is
//! handled in `main` and does not pass through here.
//!
//! Everything RevoltTUI persists lives in one directory: the OS config
//! directory joined with `revolttui`, or `./revolttui` when that cannot be
//! created. If `config.toml` is missing on first run, a commented-out default
//! is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::gateway::DEFAULT_GATEWAY_URL;
use crate::client::revolt::DEFAULT_API_URL;
use crate::core::sync::SyncSettings;

pub const APP_DIR_NAME: &str = "revolttui";

const TOKEN_FILE: &str = "token";
const LOG_FILE: &str = "log.txt";
const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RevoltTuiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub api_url: Option<String>,
    pub gateway_url: Option<String>,
    /// Session name shown in the account's session list.
    pub friendly_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    pub poll_interval_secs: Option<u64>,
    pub initial_fetch_limit: Option<u32>,
    pub refresh_fetch_limit: Option<u32>,
    pub display_limit: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_FRIENDLY_NAME: &str = "RevoltTUI";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub friendly_name: String,
    pub sync: SyncSettings,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// Neither the OS config directory nor the working directory was usable.
    NoDirectory,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::NoDirectory => {
                write!(f, "unable to create a {APP_DIR_NAME} configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Config Directory
// ============================================================================

/// The directory holding the token, log file and config file.
#[derive(Debug, Clone)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// Picks `<os config dir>/revolttui`, falling back to `./revolttui`.
    ///
    /// The first candidate that exists or can be created wins.
    pub fn resolve() -> Result<Self, ConfigError> {
        let candidates = dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .into_iter()
            .chain(std::iter::once(PathBuf::from(".").join(APP_DIR_NAME)));

        for candidate in candidates {
            match Self::at(&candidate) {
                Ok(dir) => return Ok(dir),
                Err(e) => warn!(
                    "Config directory {} unusable: {}",
                    candidate.display(),
                    e
                ),
            }
        }
        Err(ConfigError::NoDirectory)
    }

    /// Uses `root` as the config directory, creating it if needed.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(ConfigError::Io)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn token_path(&self) -> PathBuf {
        self.root.join(TOKEN_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load config from `path`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `RevoltTuiConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(path: &Path) -> Result<RevoltTuiConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(RevoltTuiConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: RevoltTuiConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let defaults = SyncSettings::default();
    let default_content = format!(
        r#"# RevoltTUI Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# api_url = "{api}"            # Or set REVOLT_API_URL
# gateway_url = "{gateway}"      # Or set REVOLT_GATEWAY_URL
# friendly_name = "{friendly}"

# [chat]
# poll_interval_secs = {poll}
# initial_fetch_limit = {initial}
# refresh_fetch_limit = {refresh}
# display_limit = {display}
"#,
        api = DEFAULT_API_URL,
        gateway = DEFAULT_GATEWAY_URL,
        friendly = DEFAULT_FRIENDLY_NAME,
        poll = defaults.poll_interval.as_secs(),
        initial = defaults.initial_fetch_limit,
        refresh = defaults.refresh_fetch_limit,
        display = defaults.display_limit,
    );

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars.
pub fn resolve(config: &RevoltTuiConfig) -> ResolvedConfig {
    resolve_with_env(config, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &RevoltTuiConfig,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // API URL: env → config → default
    let api_url = env("REVOLT_API_URL")
        .or_else(|| config.general.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    // Gateway URL: env → config → default
    let gateway_url = env("REVOLT_GATEWAY_URL")
        .or_else(|| config.general.gateway_url.clone())
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

    let friendly_name = config
        .general
        .friendly_name
        .clone()
        .unwrap_or_else(|| DEFAULT_FRIENDLY_NAME.to_string());

    ResolvedConfig {
        api_url,
        gateway_url,
        friendly_name,
        sync: resolve_sync(&config.chat),
    }
}

/// Zero values would stall the poll loop or hide every message, so they are
/// raised to 1.
fn resolve_sync(chat: &ChatConfig) -> SyncSettings {
    let defaults = SyncSettings::default();
    SyncSettings {
        poll_interval: chat
            .poll_interval_secs
            .map(|s| Duration::from_secs(s.max(1)))
            .unwrap_or(defaults.poll_interval),
        initial_fetch_limit: chat
            .initial_fetch_limit
            .map(|n| n.max(1))
            .unwrap_or(defaults.initial_fetch_limit),
        refresh_fetch_limit: chat
            .refresh_fetch_limit
            .map(|n| n.max(1))
            .unwrap_or(defaults.refresh_fetch_limit),
        display_limit: chat
            .display_limit
            .map(|n| n.max(1))
            .unwrap_or(defaults.display_limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&RevoltTuiConfig::default(), no_env);
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(resolved.friendly_name, DEFAULT_FRIENDLY_NAME);
        assert_eq!(resolved.sync, SyncSettings::default());
        assert_eq!(resolved.sync.poll_interval, Duration::from_secs(15));
        assert_eq!(resolved.sync.initial_fetch_limit, 30);
        assert_eq!(resolved.sync.refresh_fetch_limit, 75);
        assert_eq!(resolved.sync.display_limit, 15);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = RevoltTuiConfig {
            general: GeneralConfig {
                api_url: Some("https://chat.example.com/api".to_string()),
                gateway_url: None,
                friendly_name: Some("laptop".to_string()),
            },
            chat: ChatConfig {
                poll_interval_secs: Some(5),
                display_limit: Some(40),
                ..Default::default()
            },
        };
        let resolved = resolve_with_env(&config, no_env);
        assert_eq!(resolved.api_url, "https://chat.example.com/api");
        assert_eq!(resolved.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(resolved.friendly_name, "laptop");
        assert_eq!(resolved.sync.poll_interval, Duration::from_secs(5));
        assert_eq!(resolved.sync.display_limit, 40);
        assert_eq!(resolved.sync.initial_fetch_limit, 30);
    }

    #[test]
    fn test_resolve_env_wins_over_file() {
        let config = RevoltTuiConfig {
            general: GeneralConfig {
                api_url: Some("https://from-file".to_string()),
                gateway_url: Some("wss://from-file".to_string()),
                friendly_name: None,
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "REVOLT_API_URL" => Some("https://from-env".to_string()),
            _ => None,
        };
        let resolved = resolve_with_env(&config, env);
        assert_eq!(resolved.api_url, "https://from-env");
        assert_eq!(resolved.gateway_url, "wss://from-file");
    }

    #[test]
    fn test_resolve_raises_zero_limits() {
        let config = RevoltTuiConfig {
            chat: ChatConfig {
                poll_interval_secs: Some(0),
                initial_fetch_limit: Some(0),
                refresh_fetch_limit: Some(0),
                display_limit: Some(0),
            },
            ..Default::default()
        };
        let sync = resolve_with_env(&config, no_env).sync;
        assert_eq!(sync.poll_interval, Duration::from_secs(1));
        assert_eq!(sync.initial_fetch_limit, 1);
        assert_eq!(sync.refresh_fetch_limit, 1);
        assert_eq!(sync.display_limit, 1);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[chat]
display_limit = 25
"#;
        let config: RevoltTuiConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.display_limit, Some(25));
        assert!(config.chat.poll_interval_secs.is_none());
        assert!(config.general.api_url.is_none());
    }

    #[test]
    fn test_load_config_generates_commented_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_config(&path).unwrap();
        assert!(config.general.api_url.is_none());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("# [chat]"));
        // Every line is commented, so the generated file parses as empty.
        let reparsed = load_config(&path).unwrap();
        assert!(reparsed.chat.display_limit.is_none());
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[chat\ndisplay_limit = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_dir_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::at(tmp.path().join("nested").join(APP_DIR_NAME)).unwrap();
        assert!(dir.path().is_dir());
        assert!(dir.token_path().ends_with("revolttui/token"));
        assert!(dir.log_path().ends_with("revolttui/log.txt"));
        assert!(dir.config_path().ends_with("revolttui/config.toml"));
    }
}
