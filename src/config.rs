//! Application configuration
//!
//! Loads settings from a TOML file in the platform config directory, with
//! environment-variable overrides for the recognizer and model paths. The
//! assistant API key is read separately from the environment (see
//! `load_env_files`), never from the config file.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{error, info};

/// Default pause window before stale interim text is finalized
pub(crate) const DEFAULT_PAUSE_WINDOW_MS: u64 = 1500;

/// Application configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Path to the streaming recognizer executable
    pub(crate) recognizer_path: PathBuf,
    /// Path to the acoustic model file
    pub(crate) model_path: PathBuf,
    /// Silence window in milliseconds before interim text is promoted
    pub(crate) pause_window_ms: u64,
    /// Whether to register global hotkeys
    pub(crate) hotkeys_enabled: bool,
    /// Custom transcript storage location (None = use default)
    pub(crate) transcript_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recognizer_path: PathBuf::from("whisper-stream"),
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            pause_window_ms: DEFAULT_PAUSE_WINDOW_MS,
            hotkeys_enabled: true,
            transcript_dir: None,
        }
    }
}

/// Get the config file path
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Scrim").join("config.toml"))
}

/// Load environment files used for secrets
///
/// The assistant API key lives in `api_keys.env` next to the binary, or in
/// the process environment. Missing files are not an error.
pub(crate) fn load_env_files() {
    if dotenvy::from_filename("api_keys.env").is_ok() {
        info!("Loaded api_keys.env");
    }
    let _ = dotenvy::dotenv();
}

/// Load configuration from disk
///
/// Returns defaults if the file doesn't exist or can't be parsed, then
/// applies environment overrides (`SCRIM_RECOGNIZER`, `SCRIM_MODEL`,
/// `SCRIM_PAUSE_MS`).
pub(crate) fn load() -> Config {
    let mut config = read_config_file();

    if let Ok(path) = std::env::var("SCRIM_RECOGNIZER") {
        config.recognizer_path = PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("SCRIM_MODEL") {
        config.model_path = PathBuf::from(path);
    }
    if let Ok(ms) = std::env::var("SCRIM_PAUSE_MS") {
        match ms.parse::<u64>() {
            Ok(ms) => config.pause_window_ms = ms,
            Err(_) => error!("Ignoring invalid SCRIM_PAUSE_MS value: {}", ms),
        }
    }

    config
}

fn read_config_file() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };

    if !path.exists() {
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                error!("Failed to parse config file: {}", e);
                Config::default()
            }
        },
        Err(e) => {
            error!("Failed to read config file: {}", e);
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pause_window_ms, DEFAULT_PAUSE_WINDOW_MS);
        assert!(config.hotkeys_enabled);
        assert!(config.transcript_dir.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("Scrim/config.toml"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            recognizer_path = "/opt/whisper/whisper-stream"
            pause_window_ms = 2000
            "#,
        )
        .expect("valid config");

        assert_eq!(
            config.recognizer_path,
            PathBuf::from("/opt/whisper/whisper-stream")
        );
        assert_eq!(config.pause_window_ms, 2000);
        // Unspecified fields fall back to defaults
        assert!(config.hotkeys_enabled);
        assert_eq!(config.model_path, PathBuf::from("models/ggml-base.en.bin"));
    }

    #[test]
    fn test_parse_invalid_config_rejected() {
        let result: Result<Config, _> = toml::from_str("pause_window_ms = \"soon\"");
        assert!(result.is_err());
    }
}
