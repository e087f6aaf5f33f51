//! User-visible notifications

/// Reported when the delayed flag creation after Create fails
pub const FLAG_CREATE_FAILED: &str = "Failed to create the feature flag on Growthbook";

/// Reported when the flag rewrite after Update fails
pub const FLAG_UPDATE_FAILED: &str = "Failed to update the feature flag on Growthbook";

/// Shown once per editing session when a running experiment's variations are edited
pub const RUNNING_EDIT_WARNING: &str = "The experiment has already started. Updating the content may invalidate the experiment results.  If you would like to continue, view the Experiment on Growthbook and start a new phase.";

/// Sink for messages shown to the editor
pub trait Notifier: Send + Sync {
    /// Show an error
    fn error(&self, message: &str);

    /// Show a warning
    fn warning(&self, message: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "growthsync::notify", "{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: "growthsync::notify", "{message}");
    }
}
