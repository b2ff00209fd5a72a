//! Configuration management module.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::terminal::{
    CommandKind, ProtocolRevision, ReadStrategy, ResponseRule, RevisionName, TcpTransport, TerminalClient,
};

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Terminal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    pub host: String,
    /// TCP port of the terminal (default: 45000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect/read/write timeout in seconds, 0 to wait forever (default: 120).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How the end of a response is detected (default: until_close).
    #[serde(default)]
    pub read_strategy: ReadStrategy,
}

fn default_port() -> u16 {
    45000
}

fn default_timeout_secs() -> u64 {
    120
}

/// Protocol revision and the firmware literals pinned for this deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub revision: RevisionName,
    /// Command templates keyed by command kind, overriding the built-in ones.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Expected status literal and its offset, keyed by command kind.
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseRule>,
}

impl AppConfig {
    /// Get config file path (same directory as executable).
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => ConfigLoadResult::Loaded(config),
                Err(e) => ConfigLoadResult::Invalid(e),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<AppConfig>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal.host.trim().is_empty() {
            return Err(ConfigError::Validation("Terminal host cannot be empty".to_string()));
        }
        if self.terminal.port == 0 {
            return Err(ConfigError::Validation(
                "Terminal port must be greater than 0".to_string(),
            ));
        }
        self.protocol.build_revision()?;
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a client for the configured terminal.
    pub fn client(&self) -> Result<TerminalClient, ConfigError> {
        Ok(TerminalClient::new(self.terminal.transport(), self.protocol.build_revision()?))
    }
}

impl TerminalConfig {
    /// Timeout to apply to the socket, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Build the socket transport.
    pub fn transport(&self) -> TcpTransport {
        TcpTransport::new(self.host.trim(), self.port)
            .with_timeout(self.timeout())
            .with_read_strategy(self.read_strategy)
    }
}

impl ProtocolConfig {
    /// Combine the built-in revision table with the pinned literals.
    pub fn build_revision(&self) -> Result<ProtocolRevision, ConfigError> {
        let invalid = |e: crate::terminal::TerminalError| ConfigError::Validation(e.to_string());
        let mut revision = ProtocolRevision::builtin(self.revision);

        for (kind, template) in &self.templates {
            let kind: CommandKind = kind.parse().map_err(invalid)?;
            revision = revision.with_template(kind, template.clone()).map_err(invalid)?;
        }
        for (kind, rule) in &self.responses {
            let kind: CommandKind = kind.parse().map_err(invalid)?;
            revision = revision.with_rule(kind, rule.clone()).map_err(invalid)?;
        }

        Ok(revision)
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            host: "192.168.40.167".to_string(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            read_strategy: ReadStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[terminal]
host = "10.0.0.5"
port = 45001
timeout_secs = 0
read_strategy = "length_prefixed"

[protocol]
revision = "v5"

[protocol.templates]
close_period = "S0002#TRANSACTIONID#010"

[protocol.responses.open_period]
offset = 9
expected = "PERIODO ABERTO"

[protocol.responses.purchase]
offset = 10
expected = "OPERACAO EFECTUADA"
"#;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.terminal.host, "10.0.0.5");
        assert_eq!(config.terminal.read_strategy, ReadStrategy::LengthPrefixed);
        assert!(config.terminal.timeout().is_none());

        let revision = config.protocol.build_revision().unwrap();
        assert_eq!(revision.name(), RevisionName::V5);
        assert!(revision.supports(CommandKind::OpenPeriod));
        assert!(revision.supports(CommandKind::Purchase));
        assert!(!revision.supports(CommandKind::ClosePeriod));
        assert_eq!(revision.rule(CommandKind::Purchase).unwrap().offset, 10);
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_toml("[terminal]\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(config.terminal.port, 45000);
        assert_eq!(config.terminal.timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.protocol.revision, RevisionName::V5);
        assert_eq!(config.terminal.transport().addr(), "10.0.0.5:45000");
    }

    #[test]
    fn test_validation_empty_host() {
        let mut config = AppConfig::default();
        config.terminal.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_port() {
        let mut config = AppConfig::default();
        config.terminal.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_unknown_kind() {
        let mut config = AppConfig::default();
        config
            .protocol
            .responses
            .insert("reversal".to_string(), ResponseRule::new(9, "OK"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_status_on_v4() {
        let mut config = AppConfig::default();
        config.protocol.revision = RevisionName::V4;
        config
            .protocol
            .templates
            .insert("status".to_string(), "S0000".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_template() {
        let mut config = AppConfig::default();
        config
            .protocol
            .templates
            .insert("close_period".to_string(), "S0002".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("petrotec-link-config-{}.toml", std::process::id()));
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        config.save(&path).unwrap();

        let reloaded = match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(config) => config,
            other => panic!("unexpected load result: {other:?}"),
        };
        std::fs::remove_file(&path).unwrap();

        assert_eq!(reloaded.terminal.port, 45001);
        assert_eq!(reloaded.protocol.responses, config.protocol.responses);
        assert_eq!(reloaded.protocol.templates, config.protocol.templates);
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("petrotec-link-does-not-exist.toml");
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));
    }
}
