//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a TOML file located by priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`NYXA_SS_CONFIG`)
//! 3. Per-user config directory (`<config_dir>/nyxa/<module>.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing or malformed file never stops startup: the resolver falls back
//! to compiled defaults and hands the problem back so the caller can warn
//! once logging is up.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "NYXA_SS_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while running. Restart to pick up changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds without any action before a session is discarded
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,

    /// Hard cap on request body size, enforced before upload validation
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// OCR engine configuration (optional)
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// OCR engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable (name on PATH or absolute path)
    #[serde(default = "default_ocr_binary")]
    pub binary: String,

    /// Tesseract language selector
    #[serde(default = "default_ocr_language")]
    pub language: String,

    /// Upper bound on a single recognition run
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_session_idle_timeout_secs() -> u64 {
    1800
}

fn default_max_request_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ocr_binary() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_ocr_timeout_secs() -> u64 {
    60
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
            max_request_bytes: default_max_request_bytes(),
            logging: LoggingConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: default_ocr_binary(),
            language: default_ocr_language(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

/// Per-user configuration file path for a module
///
/// `~/.config/nyxa/<module>.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nyxa").join(format!("{}.toml", module_name)))
}

/// Load and parse a TOML configuration file
///
/// Read failures surface as `Error::Io`, bad contents as `Error::Config`.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Outcome of configuration resolution
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Configuration in effect (compiled defaults when `problem` is set)
    pub config: TomlConfig,
    /// File that was consulted, if any
    pub path: Option<PathBuf>,
    /// Why the file could not be used
    pub problem: Option<Error>,
}

/// Locates and loads the bootstrap configuration for one module
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    module_name: String,
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_path: None,
        }
    }

    /// Set the path given on the command line (highest priority)
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Path of the configuration file that would be used, if any
    ///
    /// Explicit paths (CLI, environment) are returned even if they do not
    /// exist so the caller can warn about them; the per-user default is
    /// only returned when present.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path(&self.module_name).filter(|p| p.exists())
    }

    /// Resolve configuration, degrading to compiled defaults on any problem
    ///
    /// Never fails. Nothing is logged here: resolution runs before the
    /// tracing subscriber exists.
    pub fn resolve(&self) -> ResolvedConfig {
        let path = self.config_path();
        let (config, problem) = match &path {
            Some(p) => match load_toml_config(p) {
                Ok(config) => (config, None),
                Err(e) => (TomlConfig::default(), Some(e)),
            },
            None => (TomlConfig::default(), None),
        };

        ResolvedConfig {
            config,
            path,
            problem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: TomlConfig = toml::from_str("port = 8080\n[ocr]\nlanguage = \"deu\"\n").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.binary, "tesseract");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_file_equals_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }
}
