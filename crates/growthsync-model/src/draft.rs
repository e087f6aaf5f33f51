//! The experiment draft stored in CMS entry fields
//!
//! A draft is created empty with its entry and is only ever mutated field by
//! field. Once `experiment` carries an id the draft counts as created.

use crate::experiment::RemoteExperiment;
use serde::{Deserialize, Serialize};

/// Reference to a CMS entry linked as a variation
///
/// Serialized in the CMS link shape: `{"sys": {"type": "Link", "linkType": "Entry", "id": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LinkRepr", into = "LinkRepr")]
pub struct EntryLink {
    id: String,
}

impl EntryLink {
    /// Link to the entry with the given id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Linked entry id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for EntryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry({})", self.id)
    }
}

#[derive(Serialize, Deserialize)]
struct LinkRepr {
    sys: LinkSys,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkSys {
    #[serde(rename = "type", default = "link_kind")]
    kind: String,
    #[serde(default = "entry_link_type")]
    link_type: String,
    id: String,
}

fn link_kind() -> String {
    "Link".to_string()
}

fn entry_link_type() -> String {
    "Entry".to_string()
}

impl From<LinkRepr> for EntryLink {
    fn from(repr: LinkRepr) -> Self {
        Self { id: repr.sys.id }
    }
}

impl From<EntryLink> for LinkRepr {
    fn from(link: EntryLink) -> Self {
        Self {
            sys: LinkSys {
                kind: link_kind(),
                link_type: entry_link_type(),
                id: link.id,
            },
        }
    }
}

/// Locally edited experiment state, one value per host field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentDraft {
    /// Cached copy of the remote experiment, absent until created
    pub experiment: Option<RemoteExperiment>,
    /// Experiment name as typed by the editor (untrimmed)
    pub experiment_name: String,
    /// Variation names, paired with `variations` by index
    pub variation_names: Vec<String>,
    /// Linked variation entries, paired with `variation_names` by index
    pub variations: Vec<EntryLink>,
    /// Feature flag id (the slug once created)
    pub feature_flag_id: String,
    /// Tracking key (the slug once created)
    pub tracking_key: String,
}

impl ExperimentDraft {
    /// Empty draft, as created alongside a new entry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote experiment id, if the draft has been created
    #[must_use]
    pub fn experiment_id(&self) -> Option<&str> {
        self.experiment
            .as_ref()
            .map(|e| e.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Whether every variation name has exactly one linked entry
    #[inline]
    #[must_use]
    pub fn variations_aligned(&self) -> bool {
        self.variations.len() == self.variation_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentStatus;

    #[test]
    fn entry_link_uses_cms_shape() {
        let json = serde_json::to_value(EntryLink::new("abc")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"sys": {"type": "Link", "linkType": "Entry", "id": "abc"}})
        );
    }

    #[test]
    fn entry_link_accepts_bare_sys_id() {
        let link: EntryLink = serde_json::from_str(r#"{"sys": {"id": "control-tshirt"}}"#).unwrap();
        assert_eq!(link.id(), "control-tshirt");
    }

    #[test]
    fn empty_draft_is_uncreated() {
        let draft = ExperimentDraft::new();
        assert!(draft.experiment_id().is_none());
        assert!(draft.variations_aligned());
    }

    #[test]
    fn experiment_with_blank_id_is_not_created() {
        let mut draft = ExperimentDraft::new();
        draft.experiment = Some(RemoteExperiment::new("", ExperimentStatus::Draft));
        assert!(draft.experiment_id().is_none());

        draft.experiment = Some(RemoteExperiment::new("exp_1", ExperimentStatus::Draft));
        assert_eq!(draft.experiment_id(), Some("exp_1"));
    }

    #[test]
    fn draft_reads_missing_fields_as_empty() {
        let draft: ExperimentDraft =
            serde_json::from_str(r#"{"experimentName": " My Exp "}"#).unwrap();
        assert_eq!(draft.experiment_name, " My Exp ");
        assert!(draft.variation_names.is_empty());
        assert!(draft.experiment.is_none());
    }
}
