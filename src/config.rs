//
//  config.rs
//  Lineage
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;
use crate::link::LineageDirection;

/// Top-level lineage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for calls to the lineage services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Project/location scope passed with every search.
    #[serde(default = "default_parent_scope")]
    pub parent_scope: String,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Graph engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Direction used for column lineage when none is requested.
    #[serde(default)]
    pub column_direction: LineageDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_parent_scope() -> String {
    "projects/-/locations/global".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_filter() -> String {
    "lineage=info".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            parent_scope: default_parent_scope(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            column_direction: LineageDirection::Both,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LineageConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Parse config from TOML, reporting syntax and type errors.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LineageConfig::default();
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert_eq!(config.graph.column_direction, LineageDirection::Both);
        assert_eq!(config.logging.filter, "lineage=info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = LineageConfig::from_toml_str(
            "[fetch]\nparent_scope = \"projects/p/locations/us\"\n\n[graph]\ncolumn_direction = \"upstream\"\n",
        )
        .unwrap();
        assert_eq!(config.fetch.parent_scope, "projects/p/locations/us");
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.graph.column_direction, LineageDirection::Upstream);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_strict_parse_rejects_bad_types() {
        assert!(LineageConfig::from_toml_str("[fetch]\ntimeout_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[logging]\nfilter = \"lineage=debug\"").unwrap();

        let config = LineageConfig::load(&path);
        assert_eq!(config.logging.filter, "lineage=debug");
    }

    #[test]
    fn test_load_is_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LineageConfig::load(&dir.path().join("missing.toml"));
        assert_eq!(missing, LineageConfig::default());

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[fetch\nnot toml").unwrap();
        assert_eq!(LineageConfig::load(&path), LineageConfig::default());
    }
}
