//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILRENDER_CONFIG` (environment variable)
//! 2. `~/.config/mailrender/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailrender\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parser::rfc2047::CharsetPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// MIME decoding limits and charset support.
    pub decoder: DecoderConfig,
    /// Output directory handling.
    pub output: OutputConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Directory for `mailrender.log`. File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

/// MIME decoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum nesting of multipart containers below the top level.
    pub max_depth: usize,
    /// Charsets accepted inside RFC 2047 encoded-words.
    pub charsets: CharsetPolicy,
}

/// Output directory handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Remove and recreate the output directory before writing.
    pub clean: bool,
    /// Reduce attachment filenames to a single safe path component.
    pub sanitize_filenames: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            charsets: CharsetPolicy::Extended,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clean: true,
            sanitize_filenames: true,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILRENDER_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailrender").join("config.toml"))
}

/// Return the log file path, if file logging is enabled.
pub fn log_file_path(config: &Config) -> Option<PathBuf> {
    config
        .general
        .log_dir
        .as_ref()
        .map(|dir| dir.join("mailrender.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.general.log_dir.is_none());
        assert_eq!(cfg.decoder.max_depth, 64);
        assert_eq!(cfg.decoder.charsets, CharsetPolicy::Extended);
        assert!(cfg.output.clean);
        assert!(cfg.output.sanitize_filenames);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.decoder.max_depth, cfg.decoder.max_depth);
        assert_eq!(parsed.decoder.charsets, cfg.decoder.charsets);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[decoder]
charsets = "basic"

[output]
clean = false
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.decoder.charsets, CharsetPolicy::Basic);
        assert!(!cfg.output.clean);
        // Other fields use defaults
        assert_eq!(cfg.decoder.max_depth, 64);
        assert!(cfg.output.sanitize_filenames);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_log_file_path() {
        let mut cfg = Config::default();
        assert!(log_file_path(&cfg).is_none());

        cfg.general.log_dir = Some(PathBuf::from("/tmp/logs"));
        assert_eq!(
            log_file_path(&cfg),
            Some(PathBuf::from("/tmp/logs/mailrender.log"))
        );
    }
}
