use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, TestParserConfig};

/// Default project configuration file
pub const DEFAULT_CONFIG_FILE: &str = "discovery.yaml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "DISCOVERY_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid test_output_timeout_ms: {0}. Must be greater than 0")]
    InvalidOutputTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Instrumentation argument names cannot be blank")]
    BlankInstrumentationArgument,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. ./discovery.yaml (optional)
    /// 3. Environment variables (DISCOVERY_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        Self::load_from_file(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Self::figment(path.as_ref())
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.discovery.test_output_timeout_ms == 0 {
            return Err(ConfigError::InvalidOutputTimeout(
                config.discovery.test_output_timeout_ms,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if let TestParserConfig::Remote {
            instrumentation_args,
        } = &config.discovery.test_parser
        {
            if instrumentation_args.keys().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::BlankInstrumentationArgument);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::LogFormat;
    use std::collections::BTreeMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.discovery.test_output_timeout_ms, 60_000);
        assert_eq!(config.logging.level, "info");
        assert!(matches!(
            config.discovery.test_parser,
            TestParserConfig::Remote { ref instrumentation_args } if instrumentation_args.is_empty()
        ));
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
discovery:
  test_output_timeout_ms: 1500
  test_parser:
    type: remote
    instrumentation_args:
      listener: com.malinskiy.adam.junit4.android.listener.TestAnnotationProducer
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.discovery.test_output_timeout_ms, 1500);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        match &config.discovery.test_parser {
            TestParserConfig::Remote {
                instrumentation_args,
            } => assert_eq!(
                instrumentation_args.get("listener").map(String::as_str),
                Some("com.malinskiy.adam.junit4.android.listener.TestAnnotationProducer")
            ),
            TestParserConfig::Local => panic!("Expected remote parser config"),
        }

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_local_parser_parsing() {
        let config: Config =
            serde_yaml::from_str("discovery:\n  test_parser:\n    type: local\n").unwrap();
        assert_eq!(config.discovery.test_parser, TestParserConfig::Local);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.discovery.test_output_timeout_ms = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidOutputTimeout(0))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_blank_argument() {
        let mut config = Config::default();
        config.discovery.test_parser = TestParserConfig::Remote {
            instrumentation_args: BTreeMap::from([(" ".to_string(), "x".to_string())]),
        };

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::BlankInstrumentationArgument)
        ));
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "discovery:\n  test_output_timeout_ms: 1500\nlogging:\n  level: warn").unwrap();

        temp_env::with_vars(
            [
                ("DISCOVERY_LOGGING__LEVEL", Some("debug")),
                ("DISCOVERY_DISCOVERY__TEST_OUTPUT_TIMEOUT_MS", None),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.discovery.test_output_timeout_ms, 1500);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_vars([("DISCOVERY_LOGGING__LEVEL", None::<&str>)], || {
            let config = ConfigLoader::load_from_file(dir.path().join("absent.yaml")).unwrap();
            assert_eq!(config.discovery.test_output_timeout_ms, 60_000);
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "discovery:\n  test_output_timeout_ms: 0").unwrap();

        temp_env::with_vars([("DISCOVERY_DISCOVERY__TEST_OUTPUT_TIMEOUT_MS", None::<&str>)], || {
            assert!(ConfigLoader::load_from_file(file.path()).is_err());
        });
    }
}
