//! Configuration parsing for hosts embedding the parser.
//!
//! Everything is optional; an empty object yields the defaults.
//!
//! # Example config
//!
//! ```json
//! {
//!   "logging": { "level": "info", "log_dir": "/tmp/log", "module_name": "cmsg", "json": true },
//!   "parser":  { "force_copy": false, "verify_snapshot_order": true },
//!   "engine":  { "exchanges": ["binance", "okx"] }
//! }
//! ```

use serde::Deserialize;

use crate::bridge::BridgeMode;

/// Top-level config, deserialized from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub parser: ParserOptions,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Parse a config from JSON text.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Logging block.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level if `RUST_LOG` is not set (e.g. `"info"`).
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily-rotating log files; console only when absent.
    pub log_dir: Option<String>,

    /// Log file prefix.
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Write the log file as JSON lines instead of text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
            module_name: default_module_name(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_module_name() -> String {
    "cmsg".to_string()
}

/// Behavior switches for [`crate::facade::MsgParser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ParserOptions {
    /// Copy every input before handing it to the engine, even when it is
    /// already NUL-terminated.
    #[serde(default)]
    pub force_copy: bool,

    /// Reject snapshot books whose levels are out of price order.
    #[serde(default)]
    pub verify_snapshot_order: bool,
}

impl ParserOptions {
    pub fn bridge_mode(&self) -> BridgeMode {
        if self.force_copy { BridgeMode::AlwaysCopy } else { BridgeMode::ZeroCopy }
    }
}

/// Engine block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Exchanges the engine accepts. Empty means every supported exchange.
    #[serde(default)]
    pub exchanges: Vec<String>,
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_json_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.module_name, "cmsg");
        assert!(cfg.logging.log_dir.is_none());
        assert!(!cfg.logging.json);
        assert_eq!(cfg.parser, ParserOptions::default());
        assert_eq!(cfg.parser.bridge_mode(), BridgeMode::ZeroCopy);
        assert!(cfg.engine.exchanges.is_empty());
    }

    #[test]
    fn full_config() {
        let cfg = AppConfig::from_json_str(
            r#"{
                "logging": { "level": "debug", "log_dir": "/tmp/log", "json": true },
                "parser": { "force_copy": true, "verify_snapshot_order": true },
                "engine": { "exchanges": ["binance", "okx"] }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.log_dir.as_deref(), Some("/tmp/log"));
        assert!(cfg.logging.json);
        assert_eq!(cfg.parser.bridge_mode(), BridgeMode::AlwaysCopy);
        assert!(cfg.parser.verify_snapshot_order);
        assert_eq!(cfg.engine.exchanges, vec!["binance", "okx"]);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(AppConfig::from_json_str(r#"{"parser": {"force_copy": "yes"}}"#).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(std::path::Path::new("/nonexistent/cmsg.json")).is_err());
    }
}
