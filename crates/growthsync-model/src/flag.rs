//! Feature flag payloads
//!
//! A flag carries one environment with a single `experiment-ref` rule that
//! maps each experiment variation (in platform order) to the flag value
//! `"<index>"`.

use crate::experiment::RemoteExperiment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule type linking a flag to an experiment
pub const EXPERIMENT_REF_RULE: &str = "experiment-ref";

/// Value type of flags created for experiments
pub const STRING_VALUE_TYPE: &str = "string";

/// Flag value served for one experiment variation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagVariation {
    /// Experiment variation id
    pub variation_id: String,
    /// Served value
    pub value: String,
}

/// Targeting rule in one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRule {
    /// Rule type
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced experiment
    pub experiment_id: String,
    /// Whether the rule is active
    pub enabled: bool,
    /// Per-variation values
    pub variations: Vec<FlagVariation>,
}

impl FlagRule {
    /// `experiment-ref` rule for the experiment's current variation order
    #[must_use]
    pub fn experiment_ref(experiment: &RemoteExperiment) -> Self {
        Self {
            kind: EXPERIMENT_REF_RULE.to_string(),
            experiment_id: experiment.id.clone(),
            enabled: true,
            variations: experiment
                .variations
                .iter()
                .enumerate()
                .map(|(index, variation)| FlagVariation {
                    variation_id: variation.variation_id.clone(),
                    value: index.to_string(),
                })
                .collect(),
        }
    }
}

/// Rules for one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEnvironment {
    /// Whether the flag is on in this environment
    pub enabled: bool,
    /// Rules evaluated in order
    pub rules: Vec<FlagRule>,
}

/// Settings shared by every flag this workspace writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDefaults {
    /// Flag owner shown on the platform
    pub owner: String,
    /// Environment receiving the experiment rule
    pub environment: String,
    /// Value served outside the experiment
    pub default_value: String,
}

impl Default for FlagDefaults {
    fn default() -> Self {
        Self {
            owner: String::new(),
            environment: "production".to_string(),
            default_value: "0".to_string(),
        }
    }
}

/// Body of a create- or update-feature-flag call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagSpec {
    /// Flag id, sent on create only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owner
    pub owner: String,
    /// Value type, sent on create only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Default value
    pub default_value: String,
    /// Environment name to rules
    pub environments: BTreeMap<String, FlagEnvironment>,
}

impl FeatureFlagSpec {
    /// Payload creating flag `id` wired to `experiment`
    #[must_use]
    pub fn for_create(
        id: impl Into<String>,
        defaults: &FlagDefaults,
        experiment: &RemoteExperiment,
    ) -> Self {
        Self {
            id: Some(id.into()),
            value_type: Some(STRING_VALUE_TYPE.to_string()),
            ..Self::for_update(defaults, experiment)
        }
    }

    /// Payload rewiring an existing flag to `experiment`
    #[must_use]
    pub fn for_update(defaults: &FlagDefaults, experiment: &RemoteExperiment) -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            defaults.environment.clone(),
            FlagEnvironment {
                enabled: true,
                rules: vec![FlagRule::experiment_ref(experiment)],
            },
        );
        Self {
            id: None,
            owner: defaults.owner.clone(),
            value_type: None,
            default_value: defaults.default_value.clone(),
            environments,
        }
    }

    /// The experiment rule in the given environment, if any
    #[must_use]
    pub fn experiment_rule(&self, environment: &str) -> Option<&FlagRule> {
        self.environments
            .get(environment)?
            .rules
            .iter()
            .find(|rule| rule.kind == EXPERIMENT_REF_RULE)
    }
}
