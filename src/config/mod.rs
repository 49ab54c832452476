// Copyright (c) 2026 DQSN
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Typed service configuration for the surrounding HTTP/metrics shell.
//!
//! None of this is consumed by [`crate::core::contract::evaluate`] itself —
//! the core reads no environment and no files. This module only wires the
//! optional transport that sits in front of it.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable naming the TOML config file path.
pub const CONFIG_PATH_ENV: &str = "DQSN_CONFIG";
/// Default config path when `DQSN_CONFIG` is unset or the file is absent.
pub const DEFAULT_CONFIG_PATH: &str = "./config/dqsn.toml";

/// Config load/parse errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    /// The file contents are not valid TOML for [`ServiceConfig`].
    #[error("failed to parse config file")]
    Parse,
}

/// HTTP transport settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address for the Axum router, e.g. `"0.0.0.0:8080"`.
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging mode for the binary entry point.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact, human-readable output (development default).
    #[default]
    Compact,
    /// Structured JSON output (used under the `production` feature/profile).
    Json,
}

/// Top-level service configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Logical node/service name, surfaced only in logs (never in `evaluate`'s output).
    pub node_name: String,
    /// HTTP transport settings.
    pub http: HttpConfig,
    /// Logging output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            node_name: "dqsn-aggregator".to_string(),
            http: HttpConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `path`. Returns built-in defaults if the file
    /// does not exist; only I/O errors on an existing file and parse errors
    /// are surfaced as [`ConfigError`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        toml::from_str(&raw).map_err(|_| ConfigError::Parse)
    }

    /// Load from the path named by [`CONFIG_PATH_ENV`], or
    /// [`DEFAULT_CONFIG_PATH`] if the variable is unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ServiceConfig::load(Path::new("/nonexistent/path/dqsn.toml")).unwrap();
        assert_eq!(cfg.node_name, "dqsn-aggregator");
        assert_eq!(cfg.http.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.log_format, LogFormat::Compact);
    }

    #[test]
    fn parses_partial_toml_with_defaults_for_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dqsn.toml");
        std::fs::write(&path, "node_name = \"dqsn-east-1\"\n\n[http]\nlisten_addr = \"127.0.0.1:9090\"\n").unwrap();
        let cfg = ServiceConfig::load(&path).unwrap();
        assert_eq!(cfg.node_name, "dqsn-east-1");
        assert_eq!(cfg.http.listen_addr, "127.0.0.1:9090");
        assert_eq!(cfg.log_format, LogFormat::Compact);
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dqsn.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(ServiceConfig::load(&path), Err(ConfigError::Parse)));
    }
}
