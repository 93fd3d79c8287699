//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("no file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "unsupported file extension: {extension}"
            ))),
        }
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables with the default
    /// prefix "PAYFLOW"
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix("PAYFLOW")
    }

    /// Load configuration from environment variables with a custom prefix.
    ///
    /// Variables take the form PREFIX_SECTION_KEY, for example
    /// `PAYFLOW_POLLER_MAX_ATTEMPTS=30`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(prefix).separator("_"))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Merge two configurations, with overlay taking precedence per section
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        AppConfig {
            network: overlay.network,
            contracts: ContractsMerge::merge(base.contracts, overlay.contracts),
            health: overlay.health,
            poller: overlay.poller,
            recovery: overlay.recovery,
            timeouts: overlay.timeouts,
            estimates: overlay.estimates,
        }
    }

    /// Load configuration from a file with environment variable overrides
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        let file_config = Self::from_file(path)?;

        match Self::from_env_with_prefix(env_prefix) {
            Ok(env_config) => Ok(Self::merge(file_config, env_config)),
            Err(_) => Ok(file_config),
        }
    }

    /// Build configuration using the config crate's builder pattern
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Addresses merge field-wise so an env overlay can set one without
/// clearing the other
struct ContractsMerge;

impl ContractsMerge {
    fn merge(
        base: crate::ContractsConfig,
        overlay: crate::ContractsConfig,
    ) -> crate::ContractsConfig {
        crate::ContractsConfig {
            token_address: if overlay.token_address.is_empty() {
                base.token_address
            } else {
                overlay.token_address
            },
            marketplace_address: if overlay.marketplace_address.is_empty() {
                base.marketplace_address
            } else {
                overlay.marketplace_address
            },
        }
    }
}

/// Builder for complex configuration loading scenarios
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add an environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self
            .builder
            .add_source(Environment::with_prefix(prefix).separator("_"));
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
            [network]
            environment = "local"
            log_level = "debug"

            [contracts]
            token_address = "0xtoken"
            marketplace_address = "0xmarket"

            [poller]
            max_attempts = 30
        "#;

        let config = ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert_eq!(config.poller.max_attempts, 30);
        assert_eq!(config.contracts.token_address, "0xtoken");
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
network:
  environment: testnet
  log_level: debug

contracts:
  token_address: "0xtoken"
  marketplace_address: "0xmarket"

health:
  failure_threshold: 5
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.health.failure_threshold, 5);
        assert_eq!(config.network.log_level, "debug");
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "contracts": {
    "token_address": "0xtoken",
    "marketplace_address": "0xmarket"
  },
  "recovery": {
    "max_auto_retries": 5
  }
}
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.recovery.max_auto_retries, 5);
    }

    #[test]
    fn test_load_from_file() {
        let toml = r#"
[contracts]
token_address = "0xtoken"
marketplace_address = "0xmarket"
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.contracts.marketplace_address, "0xmarket");
    }

    #[test]
    fn test_merge_keeps_base_contracts_when_overlay_empty() {
        let base = ConfigLoader::from_toml(
            r#"
            [contracts]
            token_address = "0xtoken"
            marketplace_address = "0xmarket"
            "#,
        )
        .unwrap();

        let overlay = AppConfig::default();
        let merged = ConfigLoader::merge(base, overlay);

        assert_eq!(merged.contracts.token_address, "0xtoken");
        assert_eq!(merged.contracts.marketplace_address, "0xmarket");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ConfigLoader::from_file(Path::new("config.ini"));
        assert!(result.is_err());
    }
}
