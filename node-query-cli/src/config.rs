use anyhow::{Context, Result};
use node_query::{PartitionConfig, SourceFields};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Node terms partitioning
    #[serde(default)]
    pub partition: PartitionConfig,

    /// Field names used when a request carries no source configuration
    #[serde(default)]
    pub source: SourceFields,
}

impl Config {
    /// Load the config file if one was given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)
                .with_context(|| format!("Loading config from {}", path.display()))?,
            None => Config::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.partition
            .validate()
            .context("Invalid partition configuration")?;

        let source = &self.source;
        for (name, field) in [
            ("source.timestamp", &source.timestamp),
            ("source.host", &source.host),
            ("source.pod", &source.pod),
            ("source.container", &source.container),
        ] {
            if field.trim().is_empty() {
                anyhow::bail!("{name} must not be empty");
            }
        }

        Ok(())
    }
}
