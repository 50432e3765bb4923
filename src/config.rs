use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::BatchConfig;
use crate::logging::LogConfig;
use crate::pmc::PmcConfig;
use crate::readiness::ReadinessConfig;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default norm table used by `classify`
    #[serde(default)]
    pub norm_table: Option<PathBuf>,

    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Performance Management Chart settings
    #[serde(default)]
    pub pmc: PmcConfig,

    /// Readiness estimator baselines
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Parallel batch settings
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            norm_table: None,
            metadata: ConfigMetadata::default(),
            pmc: PmcConfig::default(),
            readiness: ReadinessConfig::default(),
            batch: BatchConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: EngineConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trainload")
            .join("config.toml")
    }

    /// Load from the default path, or defaults when no file exists there.
    ///
    /// A file that exists but cannot be parsed or fails validation is an error.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check engine settings for values the calculations cannot use
    pub fn validate(&self) -> Result<()> {
        self.pmc
            .validate()
            .with_context(|| "Invalid PMC configuration")?;
        self.readiness
            .validate()
            .with_context(|| "Invalid readiness configuration")?;

        if self.batch.num_threads == Some(0) {
            anyhow::bail!("Invalid batch configuration: num_threads must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.pmc, deserialized.pmc);
        assert_eq!(config.readiness, deserialized.readiness);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = EngineConfig {
            norm_table: Some(PathBuf::from("norms/2024.toml")),
            ..EngineConfig::default()
        };
        original.pmc.ctl_time_constant = 28;
        original.readiness.assumed_age = 30;

        original.save_to_file(&config_path).unwrap();
        let loaded = EngineConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.pmc.ctl_time_constant, 28);
        assert_eq!(loaded.readiness.assumed_age, 30);
        assert_eq!(loaded.norm_table, Some(PathBuf::from("norms/2024.toml")));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let content = r#"
[metadata]
version = "1.0"
created_at = "2024-01-01T00:00:00Z"
updated_at = "2024-01-01T00:00:00Z"
"#;
        let config: EngineConfig = toml::from_str(content).unwrap();

        assert_eq!(config.pmc, PmcConfig::default());
        assert_eq!(config.batch.num_threads, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_unusable_settings() {
        let mut config = EngineConfig::default();
        config.pmc.atl_time_constant = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pmc.acute_window_days = 30;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pmc.tsb_percent_limit = dec!(0);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.readiness.baseline_resting_hr = dec!(0);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.batch.num_threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "pmc = 7").unwrap();

        assert!(EngineConfig::load_from_file(&config_path).is_err());
    }
}
