//! Variation list editing
//!
//! Names and entries pair up by index. Names are added first and entries are
//! linked to them afterwards, so a new name can only be added once every
//! existing name has its entry.

use crate::error::SyncError;
use crate::notifier::{Notifier, RUNNING_EDIT_WARNING};
use crate::store::DraftStore;
use growthsync_model::{next_variation_name, EntryLink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Edits the name and variation fields of one draft
pub struct DraftEditor {
    store: Arc<DraftStore>,
    notifier: Arc<dyn Notifier>,
    warned: AtomicBool,
}

impl DraftEditor {
    /// Create editor session
    #[must_use]
    pub fn new(store: Arc<DraftStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            warned: AtomicBool::new(false),
        }
    }

    /// Write the experiment name as typed
    pub fn set_experiment_name(&self, name: impl Into<String>) {
        self.store.set_experiment_name(name);
    }

    /// Append the next default variation name and return it
    ///
    /// # Errors
    /// - `SyncError::Field` while some name has no linked entry
    pub fn add_variation(&self) -> Result<String, SyncError> {
        let mut names = self.store.variation_names();
        let entries = self.store.variations();
        if entries.len() != names.len() {
            return Err(SyncError::Field(
                "link an entry to every variation before adding another".to_string(),
            ));
        }

        self.warn_if_running();
        let name = next_variation_name(&names);
        names.push(name.clone());
        self.store.set_variation_names(names);
        tracing::debug!(variation = %name, "variation added");
        Ok(name)
    }

    /// Link `entry` to the variation called `name`
    ///
    /// Replaces an existing link. Entries are linked in order: the variation's
    /// index may not be past the current entry count.
    ///
    /// # Errors
    /// - `SyncError::Field` if no variation is called `name`, or an earlier variation has no entry
    pub fn link_entry(&self, name: &str, entry: EntryLink) -> Result<(), SyncError> {
        let index = self.index_of(name)?;
        let mut entries = self.store.variations();
        match index.cmp(&entries.len()) {
            std::cmp::Ordering::Less => entries[index] = entry,
            std::cmp::Ordering::Equal => entries.push(entry),
            std::cmp::Ordering::Greater => {
                return Err(SyncError::Field(format!(
                    "link entries for the {} earlier variations first",
                    index - entries.len()
                )))
            }
        }
        self.store.set_variations(entries);
        tracing::debug!(variation = %name, "entry linked");
        Ok(())
    }

    /// Remove the variation called `name` and its entry, if linked
    ///
    /// # Errors
    /// - `SyncError::Field` if no variation is called `name`
    pub fn remove_variation(&self, name: &str) -> Result<(), SyncError> {
        let index = self.index_of(name)?;
        self.warn_if_running();

        let mut entries = self.store.variations();
        if index < entries.len() {
            entries.remove(index);
            self.store.set_variations(entries);
        }

        let mut names = self.store.variation_names();
        names.remove(index);
        self.store.set_variation_names(names);
        tracing::debug!(variation = %name, "variation removed");
        Ok(())
    }

    /// Whether the running-experiment warning was already shown
    #[inline]
    #[must_use]
    pub fn has_warned(&self) -> bool {
        self.warned.load(Ordering::SeqCst)
    }

    fn index_of(&self, name: &str) -> Result<usize, SyncError> {
        self.store
            .variation_names()
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| SyncError::Field(format!("no variation named '{name}'")))
    }

    fn warn_if_running(&self) {
        let running = self
            .store
            .experiment()
            .is_some_and(|e| e.is_running());
        if running && !self.warned.swap(true, Ordering::SeqCst) {
            self.notifier.warning(RUNNING_EDIT_WARNING);
        }
    }
}

impl std::fmt::Debug for DraftEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftEditor")
            .field("store", &self.store)
            .field("warned", &self.has_warned())
            .finish_non_exhaustive()
    }
}
