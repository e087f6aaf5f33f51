//! Testing utilities for the growthsync workspace
//!
//! Shared fakes, fixtures, and a controller harness.

#![allow(missing_docs)]

use async_trait::async_trait;
use growthsync_core::{DraftStore, Notifier, SyncConfig, SyncController};
use growthsync_gateway::{ExperimentGateway, GatewayError};
use growthsync_model::{
    uniform_weights, CreateExperimentRequest, EntryLink, ExperimentDraft, ExperimentPatch,
    ExperimentStatus, FeatureFlagSpec, Phase, RemoteExperiment, Variation, VariationInput,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A call received by [`FakeGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CreateExperiment(CreateExperimentRequest),
    UpdateExperiment { id: String, patch: ExperimentPatch },
    CreateFeatureFlag(FeatureFlagSpec),
    UpdateFeatureFlag { id: String, spec: FeatureFlagSpec },
}

#[derive(Debug, Default)]
struct FakeState {
    experiments: BTreeMap<String, RemoteExperiment>,
    flags: BTreeMap<String, FeatureFlagSpec>,
    calls: Vec<GatewayCall>,
    next_id: usize,
    fail_next_create: Option<GatewayError>,
    fail_next_update: Option<GatewayError>,
    fail_flag_creates: Option<GatewayError>,
    fail_flag_updates: Option<GatewayError>,
}

/// In-memory platform
///
/// Experiments get ids `exp_1`, `exp_2`, ... and variations get
/// `var_<entry id>`. Every call is recorded, including failed ones.
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed an experiment as if created earlier
    pub fn insert_experiment(&self, experiment: RemoteExperiment) {
        self.state
            .lock()
            .experiments
            .insert(experiment.id.clone(), experiment);
    }

    /// Seed a flag as if created earlier
    pub fn insert_flag(&self, id: impl Into<String>, spec: FeatureFlagSpec) {
        self.state.lock().flags.insert(id.into(), spec);
    }

    pub fn fail_next_create(&self, error: GatewayError) {
        self.state.lock().fail_next_create = Some(error);
    }

    pub fn fail_next_update(&self, error: GatewayError) {
        self.state.lock().fail_next_update = Some(error);
    }

    /// Fail every flag creation until cleared with `None`
    pub fn fail_flag_creates(&self, error: Option<GatewayError>) {
        self.state.lock().fail_flag_creates = error;
    }

    /// Fail every flag update until cleared with `None`
    pub fn fail_flag_updates(&self, error: Option<GatewayError>) {
        self.state.lock().fail_flag_updates = error;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn experiment(&self, id: &str) -> Option<RemoteExperiment> {
        self.state.lock().experiments.get(id).cloned()
    }

    pub fn experiment_count(&self) -> usize {
        self.state.lock().experiments.len()
    }

    pub fn flag(&self, id: &str) -> Option<FeatureFlagSpec> {
        self.state.lock().flags.get(id).cloned()
    }

    pub fn flag_creates(&self) -> Vec<FeatureFlagSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::CreateFeatureFlag(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn experiment_patches(&self) -> Vec<(String, ExperimentPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::UpdateExperiment { id, patch } => Some((id, patch)),
                _ => None,
            })
            .collect()
    }
}

fn remote_variations(inputs: &[VariationInput]) -> Vec<Variation> {
    inputs
        .iter()
        .map(|input| Variation::new(format!("var_{}", input.id), input.key.clone(), input.name.clone()))
        .collect()
}

#[async_trait]
impl ExperimentGateway for FakeGateway {
    async fn create_experiment(
        &self,
        request: &CreateExperimentRequest,
    ) -> Result<RemoteExperiment, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::CreateExperiment(request.clone()));
        if let Some(error) = state.fail_next_create.take() {
            return Err(error);
        }

        state.next_id += 1;
        let mut experiment = RemoteExperiment::new(format!("exp_{}", state.next_id), ExperimentStatus::Draft)
            .with_variations(remote_variations(&request.variations))
            .with_phases(vec![Phase::default().with_weights(uniform_weights(request.variations.len()))]);
        experiment.name.clone_from(&request.name);
        experiment.tracking_key.clone_from(&request.tracking_key);

        state.experiments.insert(experiment.id.clone(), experiment.clone());
        Ok(experiment)
    }

    async fn update_experiment(
        &self,
        id: &str,
        patch: &ExperimentPatch,
    ) -> Result<RemoteExperiment, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::UpdateExperiment {
            id: id.to_string(),
            patch: patch.clone(),
        });
        if let Some(error) = state.fail_next_update.take() {
            return Err(error);
        }

        let experiment = state
            .experiments
            .get_mut(id)
            .ok_or_else(|| GatewayError::rejected(404, format!("experiment {id} not found")))?;
        if let Some(name) = &patch.name {
            experiment.name.clone_from(name);
        }
        if let Some(key) = &patch.tracking_key {
            experiment.tracking_key.clone_from(key);
        }
        if let Some(variations) = &patch.variations {
            experiment.variations = remote_variations(variations);
        }
        if let Some(phases) = &patch.phases {
            experiment.phases.clone_from(phases);
        }
        if let Some(status) = patch.status {
            experiment.status = status;
        }
        Ok(experiment.clone())
    }

    async fn create_feature_flag(&self, spec: &FeatureFlagSpec) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::CreateFeatureFlag(spec.clone()));
        if let Some(error) = state.fail_flag_creates.clone() {
            return Err(error);
        }

        let id = spec.id.clone().unwrap_or_default();
        if state.flags.contains_key(&id) {
            return Err(GatewayError::rejected(400, format!("feature {id} already exists")));
        }
        state.flags.insert(id, spec.clone());
        Ok(())
    }

    async fn update_feature_flag(
        &self,
        id: &str,
        spec: &FeatureFlagSpec,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::UpdateFeatureFlag {
            id: id.to_string(),
            spec: spec.clone(),
        });
        if let Some(error) = state.fail_flag_updates.clone() {
            return Err(error);
        }

        match state.flags.get_mut(id) {
            Some(flag) => {
                flag.environments.clone_from(&spec.environments);
                Ok(())
            }
            None => Err(GatewayError::rejected(404, format!("feature {id} not found"))),
        }
    }
}

/// Notifier that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    pub fn is_silent(&self) -> bool {
        self.errors.lock().is_empty() && self.warnings.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}

/// Builder for [`ExperimentDraft`] fixtures
#[derive(Debug, Clone, Default)]
pub struct DraftBuilder {
    draft: ExperimentDraft,
}

impl DraftBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.draft.experiment_name = name.to_string();
        self
    }

    /// Add a named variation linked to entry `entry_id`
    #[must_use]
    pub fn variation(mut self, name: &str, entry_id: &str) -> Self {
        self.draft.variation_names.push(name.to_string());
        self.draft.variations.push(EntryLink::new(entry_id));
        self
    }

    /// Add a variation name with no entry
    #[must_use]
    pub fn unlinked(mut self, name: &str) -> Self {
        self.draft.variation_names.push(name.to_string());
        self
    }

    #[must_use]
    pub fn experiment(mut self, experiment: RemoteExperiment) -> Self {
        self.draft.experiment = Some(experiment);
        self
    }

    /// Set both the feature flag id and the tracking key
    #[must_use]
    pub fn slug(mut self, slug: &str) -> Self {
        self.draft.feature_flag_id = slug.to_string();
        self.draft.tracking_key = slug.to_string();
        self
    }

    pub fn build(self) -> ExperimentDraft {
        self.draft
    }

    pub fn store(self) -> Arc<DraftStore> {
        Arc::new(DraftStore::from_draft(self.draft))
    }
}

/// Draft ready to create: "My Exp" with Control/Variation A linked to e0/e1
pub fn ready_draft() -> DraftBuilder {
    DraftBuilder::new()
        .named(" My Exp ")
        .variation("Control", "e0")
        .variation("Variation A", "e1")
}

/// Remote experiment whose variations carry `names`, with one evenly split phase
pub fn remote_experiment(id: &str, status: ExperimentStatus, names: &[&str]) -> RemoteExperiment {
    let variations = names
        .iter()
        .enumerate()
        .map(|(index, name)| Variation::new(format!("var_{index}"), index.to_string(), *name))
        .collect();
    RemoteExperiment::new(id, status)
        .with_variations(variations)
        .with_phases(vec![Phase::default().with_weights(uniform_weights(names.len()))])
}

/// Controller wired to a fresh [`FakeGateway`] and [`RecordingNotifier`]
pub struct Harness {
    pub controller: SyncController,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(draft: ExperimentDraft) -> Self {
        Self::with_gateway(draft, FakeGateway::shared())
    }

    pub fn with_gateway(draft: ExperimentDraft, gateway: Arc<FakeGateway>) -> Self {
        let notifier = RecordingNotifier::shared();
        let controller = SyncController::new(
            Arc::new(DraftStore::from_draft(draft)),
            Arc::clone(&gateway) as Arc<dyn ExperimentGateway>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            SyncConfig::new().with_datasource("ds_test"),
        );
        Self {
            controller,
            gateway,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<DraftStore> {
        self.controller.store()
    }

    pub fn draft(&self) -> ExperimentDraft {
        self.controller.store().snapshot()
    }
}
