//! Sync controller configuration

use growthsync_model::{FlagDefaults, DEFAULT_ASSIGNMENT_QUERY_ID};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings applied to every experiment and flag the controller writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Data source new experiments read from
    pub datasource_id: String,
    /// Assignment query new and updated experiments use
    pub assignment_query_id: String,
    /// Wait before creating the flag for a new experiment, in milliseconds
    pub feature_flag_delay_ms: u64,
    /// Owner recorded on created flags
    pub flag_owner: String,
    /// Environment receiving the experiment rule
    pub flag_environment: String,
    /// Value served outside the experiment
    pub default_flag_value: String,
    /// Web app base URL, for experiment links
    pub app_url: String,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With data source
    #[inline]
    #[must_use]
    pub fn with_datasource(mut self, datasource_id: impl Into<String>) -> Self {
        self.datasource_id = datasource_id.into();
        self
    }

    /// With flag owner
    #[inline]
    #[must_use]
    pub fn with_flag_owner(mut self, owner: impl Into<String>) -> Self {
        self.flag_owner = owner.into();
        self
    }

    /// With flag creation delay
    #[inline]
    #[must_use]
    pub fn with_feature_flag_delay(mut self, delay: Duration) -> Self {
        self.feature_flag_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Flag creation delay
    #[inline]
    #[must_use]
    pub fn feature_flag_delay(&self) -> Duration {
        Duration::from_millis(self.feature_flag_delay_ms)
    }

    /// Flag settings derived from this configuration
    #[must_use]
    pub fn flag_defaults(&self) -> FlagDefaults {
        FlagDefaults {
            owner: self.flag_owner.clone(),
            environment: self.flag_environment.clone(),
            default_value: self.default_flag_value.clone(),
        }
    }

    /// Link to an experiment in the web app
    #[must_use]
    pub fn experiment_url(&self, experiment_id: &str) -> String {
        format!("{}/experiment/{experiment_id}", self.app_url.trim_end_matches('/'))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let flags = FlagDefaults::default();
        Self {
            datasource_id: String::new(),
            assignment_query_id: DEFAULT_ASSIGNMENT_QUERY_ID.to_string(),
            feature_flag_delay_ms: 5_000,
            flag_owner: flags.owner,
            flag_environment: flags.environment,
            default_flag_value: flags.default_value,
            app_url: "https://app.growthbook.io".to_string(),
        }
    }
}
