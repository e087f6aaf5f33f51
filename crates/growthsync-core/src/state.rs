//! Derived sync state
//!
//! A draft is evaluated into exactly one [`SyncState`], which decides the one
//! action offered to the editor:
//!
//! | State       | Offered  | Enabled when                         |
//! |-------------|----------|--------------------------------------|
//! | `Uncreated` | Create   | name non-blank, ≥ 2 entries, aligned |
//! | `OutOfSync` | Update   | aligned, name, flag id, tracking key |
//! | `InSync`    | Start    | entries and names aligned            |
//! | `Running`   | nothing  |                                      |
//!
//! A running experiment whose names drift is `OutOfSync`; Start is never
//! offered again once running.

use crate::error::SyncAction;
use growthsync_model::{EntryLink, ExperimentDraft, ExperimentStatus, RemoteExperiment};

/// Minimum number of linked entries before an experiment can be created
pub const MIN_VARIATIONS: usize = 2;

/// Tooltip on a disabled Create button
pub const CREATE_DISABLED_REASON: &str = "An experiment needs a name and at least two variations.";

/// Tooltip on Update/Start while entries and names do not pair up
pub const UNALIGNED_REASON: &str = "Create or link an existing entry for each variation.";

/// Tooltip on Update while the name, flag id or tracking key is blank
pub const MISSING_KEYS_REASON: &str =
    "An experiment needs a name, a feature flag id and a tracking key.";

/// Tooltip on the Start button
pub const START_WARNING: &str =
    "Once you start an experiment and users see it, updating it will invalidate the results.";

/// Where a draft stands relative to its remote experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No remote experiment yet
    Uncreated,
    /// Remote names match local names, not running
    InSync,
    /// Remote names differ from local names
    OutOfSync,
    /// In sync and running
    Running,
}

impl SyncState {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncreated => "uncreated",
            Self::InSync => "in sync",
            Self::OutOfSync => "out of sync",
            Self::Running => "running",
        }
    }

    /// The single action offered in this state
    #[inline]
    #[must_use]
    pub fn offered_action(&self) -> Option<SyncAction> {
        match self {
            Self::Uncreated => Some(SyncAction::Create),
            Self::OutOfSync => Some(SyncAction::Update),
            Self::InSync => Some(SyncAction::Start),
            Self::Running => None,
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the sidebar derives from a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Derived state
    pub state: SyncState,
    /// Name is non-blank and at least two entries are linked
    pub can_create: bool,
    /// A remote experiment exists and its names differ from the local ones
    pub show_update_button: bool,
    /// A remote experiment exists and is running
    pub is_running: bool,
    /// Entry count equals name count
    pub variations_aligned: bool,
    /// Name, feature flag id and tracking key are all non-blank
    pub keys_present: bool,
    /// Remote status, if created
    pub status: Option<ExperimentStatus>,
}

impl Evaluation {
    /// The single action offered
    #[inline]
    #[must_use]
    pub fn offered_action(&self) -> Option<SyncAction> {
        self.state.offered_action()
    }

    /// Check if `action` is offered and enabled
    #[must_use]
    pub fn is_enabled(&self, action: SyncAction) -> bool {
        self.offered_action() == Some(action) && self.disabled_reason().is_none()
    }

    /// Why the offered action is disabled, if it is
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&'static str> {
        match self.offered_action()? {
            SyncAction::Create if !(self.can_create && self.variations_aligned) => {
                Some(CREATE_DISABLED_REASON)
            }
            SyncAction::Update | SyncAction::Start if !self.variations_aligned => {
                Some(UNALIGNED_REASON)
            }
            SyncAction::Update if !self.keys_present => Some(MISSING_KEYS_REASON),
            _ => None,
        }
    }

    /// `"<status>"` or `"<status>, out of sync"` once created
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        let status = self.status?;
        Some(if self.show_update_button {
            format!("{status}, out of sync")
        } else {
            status.to_string()
        })
    }
}

/// Name is non-blank and at least [`MIN_VARIATIONS`] entries are linked
#[must_use]
pub fn can_create(name: &str, entries: &[EntryLink]) -> bool {
    !name.trim().is_empty() && entries.len() >= MIN_VARIATIONS
}

/// Ordered, element-wise comparison of local names against remote names
#[must_use]
pub fn is_out_of_sync(names: &[String], remote: &RemoteExperiment) -> bool {
    !names.iter().map(String::as_str).eq(remote.variation_names())
}

/// Evaluate a draft (including its cached remote experiment)
#[must_use]
pub fn evaluate(draft: &ExperimentDraft) -> Evaluation {
    let remote = draft
        .experiment
        .as_ref()
        .filter(|_| draft.experiment_id().is_some());

    let show_update_button = remote.is_some_and(|e| is_out_of_sync(&draft.variation_names, e));
    let is_running = remote.is_some_and(RemoteExperiment::is_running);

    let state = match remote {
        None => SyncState::Uncreated,
        Some(_) if show_update_button => SyncState::OutOfSync,
        Some(_) if is_running => SyncState::Running,
        Some(_) => SyncState::InSync,
    };

    Evaluation {
        state,
        can_create: can_create(&draft.experiment_name, &draft.variations),
        show_update_button,
        is_running,
        variations_aligned: draft.variations_aligned(),
        keys_present: !draft.experiment_name.trim().is_empty()
            && !draft.feature_flag_id.is_empty()
            && !draft.tracking_key.is_empty(),
        status: remote.map(|e| e.status),
    }
}
