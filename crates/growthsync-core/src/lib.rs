//! Growthsync Core - experiment draft synchronisation
//!
//! Keeps a locally edited experiment draft in step with the remote
//! experimentation platform:
//! - Derives the sync state of a draft ([`evaluate`], [`SyncState`])
//! - Runs the create/update/start actions ([`SyncController`])
//! - Edits the variation list ([`DraftEditor`])
//! - Owns the host field contract ([`DraftStore`])
//!
//! # Example
//!
//! ```rust,ignore
//! use growthsync_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(gateway: Arc<dyn ExperimentGateway>) -> Result<(), SyncError> {
//! let store = Arc::new(DraftStore::new());
//! let editor = DraftEditor::new(Arc::clone(&store), Arc::new(TracingNotifier));
//! editor.set_experiment_name("Homepage hero");
//!
//! let controller = SyncController::new(store, gateway, Arc::new(TracingNotifier), SyncConfig::new());
//! if controller.evaluate().is_enabled(SyncAction::Create) {
//!     controller.create().await?;
//! }
//! controller.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod controller;
pub mod deferred;
pub mod editor;
pub mod error;
pub mod notifier;
pub mod state;
pub mod store;

pub use config::SyncConfig;
pub use controller::SyncController;
pub use deferred::DeferredTasks;
pub use editor::DraftEditor;
pub use error::{SyncAction, SyncError};
pub use notifier::{
    Notifier, TracingNotifier, FLAG_CREATE_FAILED, FLAG_UPDATE_FAILED, RUNNING_EDIT_WARNING,
};
pub use state::{
    can_create, evaluate, is_out_of_sync, Evaluation, SyncState, CREATE_DISABLED_REASON,
    MIN_VARIATIONS, MISSING_KEYS_REASON, START_WARNING, UNALIGNED_REASON,
};
pub use store::{DraftField, DraftStore, SubscriptionId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a draft
    pub use crate::{
        DraftEditor, DraftStore, Evaluation, Notifier, SyncAction, SyncConfig, SyncController,
        SyncError, SyncState, TracingNotifier,
    };
    pub use growthsync_gateway::ExperimentGateway;
    pub use growthsync_model::{EntryLink, ExperimentDraft, RemoteExperiment};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
