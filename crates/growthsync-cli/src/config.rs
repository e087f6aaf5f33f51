//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment.

use anyhow::Context;
use growthsync_core::SyncConfig;
use growthsync_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, read from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "growthsync.toml";

/// API key override
pub const ENV_API_KEY: &str = "GROWTHBOOK_API_KEY";
/// Server URL override
pub const ENV_SERVER_URL: &str = "GROWTHBOOK_SERVER_URL";
/// Data source override
pub const ENV_DATASOURCE_ID: &str = "GROWTHBOOK_DATASOURCE_ID";

/// Everything the binary needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[gateway]` table
    pub gateway: GatewayConfig,
    /// `[sync]` table
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this layout.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read `path`; a missing file yields the defaults when `required` is false
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or is missing and required.
    pub fn load(path: &Path, required: bool) -> anyhow::Result<Self> {
        if !path.exists() && !required {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Apply overrides from `lookup` (the process environment in the binary)
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = set(ENV_API_KEY) {
            self.gateway.api_key = Some(key);
        }
        if let Some(url) = set(ENV_SERVER_URL) {
            self.gateway.server_url = url;
        }
        if let Some(id) = set(ENV_DATASOURCE_ID) {
            self.sync.datasource_id = id;
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn parses_partial_tables() {
        let config = AppConfig::from_toml(
            r#"
            [gateway]
            server_url = "https://growthbook.internal"

            [sync]
            datasource_id = "ds_abc"
            flag_owner = "web-team"
            feature_flag_delay_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.server_url, "https://growthbook.internal");
        assert_eq!(config.gateway.request_timeout_secs, 15);
        assert_eq!(config.sync.datasource_id, "ds_abc");
        assert_eq!(config.sync.flag_owner, "web-team");
        assert_eq!(config.sync.feature_flag_delay_ms, 100);
        assert_eq!(config.sync.assignment_query_id, "user_id");
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "secret_1"),
            (ENV_DATASOURCE_ID, "ds_env"),
            (ENV_SERVER_URL, "  "),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_toml("[sync]\ndatasource_id = \"ds_file\"")
            .unwrap()
            .with_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.gateway.api_key.as_deref(), Some("secret_1"));
        assert_eq!(config.sync.datasource_id, "ds_env");
        assert_eq!(config.gateway.server_url, GatewayConfig::default().server_url);
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(AppConfig::from_toml("[sync]\nfeature_flag_delay_ms = \"soon\"").is_err());
    }
}
