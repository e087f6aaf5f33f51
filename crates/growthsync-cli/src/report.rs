//! Sidebar summary for the `status` command

use growthsync_core::{Evaluation, SyncAction, START_WARNING};
use serde::Serialize;
use std::fmt::Write as _;

/// What the sidebar would show for a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Derived state
    pub state: String,
    /// Offered action's button label
    pub action: Option<String>,
    /// Whether the offered action can be clicked
    pub enabled: bool,
    /// Why it cannot
    pub tooltip: Option<String>,
    /// Shown next to the Start button
    pub warning: Option<String>,
    /// `"<status>"` or `"<status>, out of sync"`
    pub status: Option<String>,
    /// Link to the experiment in the web app
    pub experiment_url: Option<String>,
}

impl StatusReport {
    /// Build from an evaluation and an optional experiment link
    #[must_use]
    pub fn new(eval: &Evaluation, experiment_url: Option<String>) -> Self {
        let action = eval.offered_action();
        Self {
            state: eval.state.to_string(),
            action: action.map(|a| a.label().to_string()),
            enabled: action.is_some_and(|a| eval.is_enabled(a)),
            tooltip: eval.disabled_reason().map(str::to_string),
            warning: (action == Some(SyncAction::Start)).then(|| START_WARNING.to_string()),
            status: eval.status_line(),
            experiment_url,
        }
    }

    /// Plain-text rendering, one `key: value` per line
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "state: {}", self.state);
        match &self.action {
            Some(action) => {
                let enabled = if self.enabled { "enabled" } else { "disabled" };
                let _ = writeln!(out, "action: {action} ({enabled})");
            }
            None => out.push_str("action: none\n"),
        }
        for (key, value) in [
            ("tooltip", &self.tooltip),
            ("warning", &self.warning),
            ("status", &self.status),
            ("experiment", &self.experiment_url),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "{key}: {value}");
            }
        }
        out
    }
}
