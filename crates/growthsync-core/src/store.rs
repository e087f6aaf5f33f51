//! Host field bindings
//!
//! [`DraftStore`] stands in for the CMS entry: one accessor/mutator pair per
//! field, each write observable by re-reading the field and announced to
//! subscribers with the [`DraftField`] that changed. Subscribers are called
//! after the write lock is released, so they may read the store.

use growthsync_model::{EntryLink, ExperimentDraft, RemoteExperiment};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Host field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    /// `experiment`
    Experiment,
    /// `experimentName`
    ExperimentName,
    /// `variationNames`
    VariationNames,
    /// `variations`
    Variations,
    /// `featureFlagId`
    FeatureFlagId,
    /// `trackingKey`
    TrackingKey,
}

impl DraftField {
    /// Field id as stored on the entry
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Experiment => "experiment",
            Self::ExperimentName => "experimentName",
            Self::VariationNames => "variationNames",
            Self::Variations => "variations",
            Self::FeatureFlagId => "featureFlagId",
            Self::TrackingKey => "trackingKey",
        }
    }
}

/// Handle returned by [`DraftStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(DraftField) + Send + Sync>;

/// Field-by-field access to one entry's draft
pub struct DraftStore {
    draft: RwLock<ExperimentDraft>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl DraftStore {
    /// Store seeded with an empty draft
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_draft(ExperimentDraft::new())
    }

    /// Store seeded with `draft`
    #[must_use]
    pub fn from_draft(draft: ExperimentDraft) -> Self {
        Self {
            draft: RwLock::new(draft),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Copy of the whole draft
    #[must_use]
    pub fn snapshot(&self) -> ExperimentDraft {
        self.draft.read().clone()
    }

    /// Call `listener` after every field write
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(DraftField) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Stop notifying a subscriber; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn write(&self, field: DraftField, apply: impl FnOnce(&mut ExperimentDraft)) {
        apply(&mut *self.draft.write());
        tracing::trace!(field = field.id(), "draft field written");

        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(field);
        }
    }

    /// `experiment`
    #[must_use]
    pub fn experiment(&self) -> Option<RemoteExperiment> {
        self.draft.read().experiment.clone()
    }

    /// Set `experiment`
    pub fn set_experiment(&self, experiment: Option<RemoteExperiment>) {
        self.write(DraftField::Experiment, |d| d.experiment = experiment);
    }

    /// `experimentName`
    #[must_use]
    pub fn experiment_name(&self) -> String {
        self.draft.read().experiment_name.clone()
    }

    /// Set `experimentName`
    pub fn set_experiment_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.write(DraftField::ExperimentName, |d| d.experiment_name = name);
    }

    /// `variationNames`
    #[must_use]
    pub fn variation_names(&self) -> Vec<String> {
        self.draft.read().variation_names.clone()
    }

    /// Set `variationNames`
    pub fn set_variation_names(&self, names: Vec<String>) {
        self.write(DraftField::VariationNames, |d| d.variation_names = names);
    }

    /// `variations`
    #[must_use]
    pub fn variations(&self) -> Vec<EntryLink> {
        self.draft.read().variations.clone()
    }

    /// Set `variations`
    pub fn set_variations(&self, entries: Vec<EntryLink>) {
        self.write(DraftField::Variations, |d| d.variations = entries);
    }

    /// `featureFlagId`
    #[must_use]
    pub fn feature_flag_id(&self) -> String {
        self.draft.read().feature_flag_id.clone()
    }

    /// Set `featureFlagId`
    pub fn set_feature_flag_id(&self, id: impl Into<String>) {
        let id = id.into();
        self.write(DraftField::FeatureFlagId, |d| d.feature_flag_id = id);
    }

    /// `trackingKey`
    #[must_use]
    pub fn tracking_key(&self) -> String {
        self.draft.read().tracking_key.clone()
    }

    /// Set `trackingKey`
    pub fn set_tracking_key(&self, key: impl Into<String>) {
        let key = key.into();
        self.write(DraftField::TrackingKey, |d| d.tracking_key = key);
    }
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore")
            .field("draft", &*self.draft.read())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growthsync_model::ExperimentStatus;
    use parking_lot::Mutex;

    #[test]
    fn writes_are_observable() {
        let store = DraftStore::new();
        store.set_experiment_name(" My Exp ");
        store.set_variation_names(vec!["Control".into()]);
        store.set_variations(vec![EntryLink::new("e1")]);
        store.set_feature_flag_id("my-exp");
        store.set_tracking_key("my-exp");
        store.set_experiment(Some(RemoteExperiment::new("exp_1", ExperimentStatus::Draft)));

        assert_eq!(store.experiment_name(), " My Exp ");
        assert_eq!(store.variation_names(), vec!["Control".to_string()]);
        assert_eq!(store.variations(), vec![EntryLink::new("e1")]);
        assert_eq!(store.feature_flag_id(), "my-exp");
        assert_eq!(store.tracking_key(), "my-exp");
        assert_eq!(store.snapshot().experiment_id(), Some("exp_1"));
    }

    #[test]
    fn subscribers_see_each_field_write() {
        let store = DraftStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |field| sink.lock().push(field));

        store.set_feature_flag_id("a");
        store.set_tracking_key("a");
        assert_eq!(
            *seen.lock(),
            vec![DraftField::FeatureFlagId, DraftField::TrackingKey]
        );

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_tracking_key("b");
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn subscribers_may_read_the_store() {
        let store = Arc::new(DraftStore::new());
        let seen = Arc::new(Mutex::new(String::new()));
        let (reader, sink) = (Arc::clone(&store), Arc::clone(&seen));
        store.subscribe(move |_| *sink.lock() = reader.experiment_name());

        store.set_experiment_name("after");
        assert_eq!(*seen.lock(), "after");
    }

    #[test]
    fn field_ids() {
        assert_eq!(DraftField::VariationNames.id(), "variationNames");
        assert_eq!(DraftField::Experiment.id(), "experiment");
    }
}
