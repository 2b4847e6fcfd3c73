use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which cluster driver variant a run selects. `spec.md` names this a
/// "loadable symbol"; the only authoritative cascade is the beta one, so
/// the symbol collapses to a single selectable variant here rather than
/// pretending a second one is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    #[default]
    Beta,
}

/// Run configuration, keyed under `[make]` the way spec.md names its two
/// config keys as `make.min_cluster_num` / `make.cluster_algorithm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub make: MakeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeConfig {
    /// The minimum sample size a group of pieces must reach before any
    /// cluster strategy will consider generalizing it (spec's `threshold`).
    pub min_cluster_num: i64,
    pub cluster_algorithm: ClusterAlgorithm,
}

impl Default for MakeConfig {
    fn default() -> Self {
        Self {
            min_cluster_num: 3,
            cluster_algorithm: ClusterAlgorithm::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            make: MakeConfig::default(),
        }
    }
}

/// Mirrors `MakeConfig` but with every field optional, so a single file
/// that only sets `min_cluster_num` doesn't clobber another file's
/// `cluster_algorithm` when several `-c` files are merged.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialMakeConfig {
    min_cluster_num: Option<i64>,
    cluster_algorithm: Option<ClusterAlgorithm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    #[serde(default)]
    make: PartialMakeConfig,
}

impl Config {
    /// Loads and merges a sequence of `-c` config files field-by-field,
    /// later files overriding earlier ones; a field absent from every file
    /// keeps `Config::default()`'s value.
    #[tracing::instrument(level = "debug")]
    pub fn load(paths: &[&Path]) -> Result<Self> {
        let mut merged = PartialMakeConfig::default();

        for path in paths {
            let raw = std::fs::read_to_string(path)?;
            let partial: PartialConfig = toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))?;
            if partial.make.min_cluster_num.is_some() {
                merged.min_cluster_num = partial.make.min_cluster_num;
            }
            if partial.make.cluster_algorithm.is_some() {
                merged.cluster_algorithm = partial.make.cluster_algorithm;
            }
        }

        let defaults = MakeConfig::default();
        let config = Config {
            make: MakeConfig {
                min_cluster_num: merged.min_cluster_num.unwrap_or(defaults.min_cluster_num),
                cluster_algorithm: merged.cluster_algorithm.unwrap_or(defaults.cluster_algorithm),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.make.min_cluster_num < 2 {
            return Err(Error::Config(
                "make.min_cluster_num must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_degenerate_threshold() {
        let config = Config {
            make: MakeConfig {
                min_cluster_num: 1,
                cluster_algorithm: ClusterAlgorithm::Beta,
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_from_toml() {
        let config: PartialConfig = toml::from_str("[make]\nmin_cluster_num = 5").unwrap();
        assert_eq!(config.make.min_cluster_num, Some(5));
    }

    #[test]
    fn later_file_overrides_earlier_field_by_field() {
        let mut first = NamedTempFile::new().unwrap();
        write!(first, "[make]\nmin_cluster_num = 5\ncluster_algorithm = \"beta\"").unwrap();
        let mut second = NamedTempFile::new().unwrap();
        write!(second, "[make]\nmin_cluster_num = 7").unwrap();

        let config = Config::load(&[first.path(), second.path()]).unwrap();
        assert_eq!(config.make.min_cluster_num, 7);
        assert_eq!(config.make.cluster_algorithm, ClusterAlgorithm::Beta);
    }
}
