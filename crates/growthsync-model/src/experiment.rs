//! Remote experiment records and the payloads that create or patch them
//!
//! Fields the platform returns but this workspace does not interpret are kept
//! in `extra` maps so a cached experiment round-trips without loss.

use crate::draft::EntryLink;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a remote experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Created but not started
    #[default]
    Draft,
    /// Assigning users
    Running,
    /// Finished
    Stopped,
}

impl ExperimentStatus {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    /// Check if the experiment is live
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One arm of a remote experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    /// Platform-assigned variation id, referenced by flag rules
    #[serde(default)]
    pub variation_id: String,
    /// Variation key (the index at creation time)
    #[serde(default)]
    pub key: String,
    /// Display name, compared against the draft's variation names
    #[serde(default)]
    pub name: String,
    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Variation {
    /// Create variation
    #[must_use]
    pub fn new(
        variation_id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            variation_id: variation_id.into(),
            key: key.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// One phase of a remote experiment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Traffic split across variations, summing to 1
    #[serde(default)]
    pub variation_weights: Vec<f64>,
    /// Uninterpreted fields (dates, coverage, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Phase {
    /// Same phase with its weights replaced
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.variation_weights = weights;
        self
    }
}

/// Authoritative experiment record held by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteExperiment {
    /// Platform id
    pub id: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: ExperimentStatus,
    /// Tracking key
    #[serde(default)]
    pub tracking_key: String,
    /// Experiment name
    #[serde(default)]
    pub name: String,
    /// Variations in platform order
    #[serde(default)]
    pub variations: Vec<Variation>,
    /// Phases in platform order
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteExperiment {
    /// Create experiment record with no variations or phases
    #[must_use]
    pub fn new(id: impl Into<String>, status: ExperimentStatus) -> Self {
        Self {
            id: id.into(),
            status,
            tracking_key: String::new(),
            name: String::new(),
            variations: Vec::new(),
            phases: Vec::new(),
            extra: Map::new(),
        }
    }

    /// With variations
    #[must_use]
    pub fn with_variations(mut self, variations: Vec<Variation>) -> Self {
        self.variations = variations;
        self
    }

    /// With phases
    #[must_use]
    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    /// Variation names in platform order
    pub fn variation_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variations.iter().map(|v| v.name.as_str())
    }

    /// Check if the experiment is live
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Every phase, with weights overwritten by an even split over `count` variations
    #[must_use]
    pub fn evenly_weighted_phases(&self, count: usize) -> Vec<Phase> {
        self.phases
            .iter()
            .cloned()
            .map(|phase| phase.with_weights(uniform_weights(count)))
            .collect()
    }
}

/// Even traffic split: `count` weights of `1 / count`
#[must_use]
pub fn uniform_weights(count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    #[allow(clippy::cast_precision_loss)]
    let weight = 1.0 / count as f64;
    vec![weight; count]
}

/// Variation as sent when creating or updating an experiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationInput {
    /// Display name
    pub name: String,
    /// Index as a string
    pub key: String,
    /// Linked entry id
    pub id: String,
}

/// Pair entries with names by index into experiment variations
///
/// # Errors
/// - `ModelError::VariationCountMismatch` if the two sequences differ in length
pub fn variation_inputs(
    entries: &[EntryLink],
    names: &[String],
) -> Result<Vec<VariationInput>, ModelError> {
    if entries.len() != names.len() {
        return Err(ModelError::VariationCountMismatch {
            entries: entries.len(),
            names: names.len(),
        });
    }
    Ok(entries
        .iter()
        .zip(names)
        .enumerate()
        .map(|(index, (entry, name))| VariationInput {
            name: name.clone(),
            key: index.to_string(),
            id: entry.id().to_string(),
        })
        .collect())
}

/// Body of a create-experiment call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExperimentRequest {
    /// Data source the experiment reads from
    pub datasource_id: String,
    /// Assignment query
    pub assignment_query_id: String,
    /// Tracking key (the slug)
    pub tracking_key: String,
    /// Trimmed experiment name
    pub name: String,
    /// Variations zipped from the draft
    pub variations: Vec<VariationInput>,
}

/// Partial update of an experiment; absent fields are left untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentPatch {
    /// Assignment query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_query_id: Option<String>,
    /// Tracking key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_key: Option<String>,
    /// Experiment name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full replacement variation list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variations: Option<Vec<VariationInput>>,
    /// Full replacement phase list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentStatus>,
}

impl ExperimentPatch {
    /// Patch that only changes the status
    #[inline]
    #[must_use]
    pub fn status(status: ExperimentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Response wrapper returned by experiment calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentEnvelope {
    /// The experiment after the call
    pub experiment: RemoteExperiment,
}
