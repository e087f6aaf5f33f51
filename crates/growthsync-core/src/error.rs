//! Error types for the sync controller
//!
//! Three failure families, mirroring what the editor sees:
//! - Validation: the action is not offered or its button is disabled (no notification)
//! - Gateway: the primary remote call failed (fixed notification per action)
//! - Contention: another action is still in flight

use crate::state::SyncState;
use growthsync_gateway::GatewayError;
use growthsync_model::ModelError;

/// User-triggered sync actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Create the remote experiment
    Create,
    /// Push local variations to the remote experiment
    Update,
    /// Set the remote experiment running
    Start,
}

impl SyncAction {
    /// Lowercase verb
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Start => "start",
        }
    }

    /// Notification shown when the primary remote call fails
    #[inline]
    #[must_use]
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Create => "Failed to create the experiment on Growthbook",
            Self::Update => "Failed to update the experiment on Growthbook",
            Self::Start => "Failed to start the experiment on Growthbook",
        }
    }

    /// Button label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create New Experiment",
            Self::Update => "Update Experiment",
            Self::Start => "Start Experiment",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main sync error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The action is not offered in the current state
    #[error("{action} is not offered while the draft is {state}")]
    NotOffered {
        /// Requested action
        action: SyncAction,
        /// State the draft was in
        state: SyncState,
    },

    /// The action is offered but disabled
    #[error("{action} is disabled: {reason}")]
    Disabled {
        /// Requested action
        action: SyncAction,
        /// Why, as shown to the editor
        reason: &'static str,
    },

    /// Another action on this draft has not settled yet
    #[error("{action} refused: another action is in flight")]
    Busy {
        /// Requested action
        action: SyncAction,
    },

    /// The primary remote call failed
    #[error("{action} failed: {source}")]
    Gateway {
        /// Requested action
        action: SyncAction,
        /// Underlying gateway failure
        #[source]
        source: GatewayError,
    },

    /// A draft edit could not be applied
    #[error("invalid draft edit: {0}")]
    Field(String),

    /// Payload could not be built from the draft
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl SyncError {
    /// Create gateway error
    #[inline]
    #[must_use]
    pub fn gateway(action: SyncAction, source: GatewayError) -> Self {
        Self::Gateway { action, source }
    }

    /// Check if the failure was a validation refusal (nothing was sent)
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotOffered { .. } | Self::Disabled { .. } | Self::Field(_) | Self::Model(_)
        )
    }

    /// Check if retrying later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy { .. } => true,
            Self::Gateway { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Action the error belongs to, if any
    #[must_use]
    pub fn action(&self) -> Option<SyncAction> {
        match self {
            Self::NotOffered { action, .. }
            | Self::Disabled { action, .. }
            | Self::Busy { action }
            | Self::Gateway { action, .. } => Some(*action),
            Self::Field(_) | Self::Model(_) => None,
        }
    }
}
