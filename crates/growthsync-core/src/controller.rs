//! Experiment sync controller
//!
//! Runs the three editor actions against one draft:
//! - Create: commit the trimmed name and slug, create the experiment, then
//!   create its feature flag after a delay
//! - Update: push names/entries with evenly split weights, then rewrite the flag
//! - Start: set the experiment running
//!
//! Each action re-evaluates the draft first and refuses unless it is the
//! offered, enabled action. One action runs at a time per controller.

use crate::config::SyncConfig;
use crate::deferred::DeferredTasks;
use crate::error::{SyncAction, SyncError};
use crate::notifier::{Notifier, FLAG_CREATE_FAILED, FLAG_UPDATE_FAILED};
use crate::state::{evaluate, Evaluation, SyncState};
use crate::store::DraftStore;
use growthsync_gateway::{ExperimentGateway, GatewayError};
use growthsync_model::{
    slugify, variation_inputs, CreateExperimentRequest, ExperimentDraft, ExperimentPatch,
    ExperimentStatus, FeatureFlagSpec, RemoteExperiment,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Drives create/update/start for one draft
pub struct SyncController {
    store: Arc<DraftStore>,
    gateway: Arc<dyn ExperimentGateway>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
    /// Held for the whole of an action
    in_flight: Mutex<()>,
    deferred: DeferredTasks,
}

impl SyncController {
    /// Create controller
    #[must_use]
    pub fn new(
        store: Arc<DraftStore>,
        gateway: Arc<dyn ExperimentGateway>,
        notifier: Arc<dyn Notifier>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
            in_flight: Mutex::new(()),
            deferred: DeferredTasks::new(),
        }
    }

    /// The draft this controller acts on
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Derived state of the current draft
    #[must_use]
    pub fn evaluate(&self) -> Evaluation {
        evaluate(&self.store.snapshot())
    }

    /// Web app link to the remote experiment, once created
    #[must_use]
    pub fn experiment_url(&self) -> Option<String> {
        let draft = self.store.snapshot();
        draft.experiment_id().map(|id| self.config.experiment_url(id))
    }

    /// Whether an action is currently running
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Deferred follow-up calls not yet finished
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.deferred.pending()
    }

    /// Abort deferred follow-up calls
    pub fn cancel_pending(&self) {
        self.deferred.cancel_all();
    }

    /// Wait for deferred follow-up calls
    pub async fn shutdown(&self) {
        self.deferred.shutdown().await;
    }

    /// Run `action`
    ///
    /// # Errors
    /// See [`create`](Self::create), [`update`](Self::update), [`start`](Self::start).
    pub async fn run(&self, action: SyncAction) -> Result<RemoteExperiment, SyncError> {
        match action {
            SyncAction::Create => self.create().await,
            SyncAction::Update => self.update().await,
            SyncAction::Start => self.start().await,
        }
    }

    /// Create the remote experiment and schedule its feature flag
    ///
    /// # Workflow
    /// 1. Trim the name and write it back
    /// 2. Write the slug to both `featureFlagId` and `trackingKey`
    /// 3. Create the experiment
    /// 4. Cache the returned experiment
    /// 5. After the configured delay, create the feature flag
    ///
    /// Steps 1-2 are committed even if step 3 fails.
    ///
    /// # Errors
    /// - `SyncError::Busy` if another action is running
    /// - `SyncError::NotOffered` if the draft is already created
    /// - `SyncError::Disabled` if the name is blank, fewer than two entries are
    ///   linked, or entries and names do not pair up
    /// - `SyncError::Gateway` if the platform call fails (editor is notified)
    pub async fn create(&self) -> Result<RemoteExperiment, SyncError> {
        let action = SyncAction::Create;
        let _guard = self.acquire(action)?;

        let name = self.trim_name();
        let draft = self.store.snapshot();
        check_offered(action, &evaluate(&draft))?;

        let slug = slugify(&name);
        self.store.set_feature_flag_id(slug.clone());
        self.store.set_tracking_key(slug.clone());

        let request = CreateExperimentRequest {
            datasource_id: self.config.datasource_id.clone(),
            assignment_query_id: self.config.assignment_query_id.clone(),
            tracking_key: slug.clone(),
            name,
            variations: variation_inputs(&draft.variations, &draft.variation_names)?,
        };

        tracing::info!(tracking_key = %slug, variations = request.variations.len(), "creating experiment");
        let experiment = self
            .gateway
            .create_experiment(&request)
            .await
            .map_err(|e| self.report_failure(action, e))?;

        tracing::info!(experiment_id = %experiment.id, "experiment created");
        self.store.set_experiment(Some(experiment.clone()));
        self.schedule_flag_creation(slug, &experiment);

        Ok(experiment)
    }

    /// Push local variations to the remote experiment and rewire its flag
    ///
    /// Phase weights are always reset to an even split.
    ///
    /// # Errors
    /// - `SyncError::Busy` if another action is running
    /// - `SyncError::NotOffered` unless the draft is out of sync
    /// - `SyncError::Disabled` if entries and names do not pair up, or the
    ///   name, flag id or tracking key is blank
    /// - `SyncError::Gateway` if the experiment update fails (editor is notified)
    pub async fn update(&self) -> Result<RemoteExperiment, SyncError> {
        let action = SyncAction::Update;
        let _guard = self.acquire(action)?;

        let name = self.trim_name();
        let draft = self.store.snapshot();
        check_offered(action, &evaluate(&draft))?;
        let (id, current) = created(&draft, action)?;

        let patch = ExperimentPatch {
            assignment_query_id: Some(self.config.assignment_query_id.clone()),
            tracking_key: Some(draft.tracking_key.clone()),
            name: Some(name),
            variations: Some(variation_inputs(&draft.variations, &draft.variation_names)?),
            phases: Some(current.evenly_weighted_phases(draft.variations.len())),
            status: None,
        };

        tracing::info!(experiment_id = %id, "updating experiment");
        let experiment = self
            .gateway
            .update_experiment(id, &patch)
            .await
            .map_err(|e| self.report_failure(action, e))?;

        self.store.set_experiment(Some(experiment.clone()));

        let spec = FeatureFlagSpec::for_update(&self.config.flag_defaults(), &experiment);
        if let Err(e) = self
            .gateway
            .update_feature_flag(&draft.feature_flag_id, &spec)
            .await
        {
            tracing::error!(flag_id = %draft.feature_flag_id, error = %e, "feature flag update failed");
            self.notifier.error(FLAG_UPDATE_FAILED);
        }

        Ok(experiment)
    }

    /// Set the remote experiment running
    ///
    /// # Errors
    /// - `SyncError::Busy` if another action is running
    /// - `SyncError::NotOffered` unless the draft is in sync and not running
    /// - `SyncError::Disabled` if entries and names do not pair up
    /// - `SyncError::Gateway` if the platform call fails (editor is notified)
    pub async fn start(&self) -> Result<RemoteExperiment, SyncError> {
        let action = SyncAction::Start;
        let _guard = self.acquire(action)?;

        let draft = self.store.snapshot();
        check_offered(action, &evaluate(&draft))?;
        let (id, _) = created(&draft, action)?;

        tracing::info!(experiment_id = %id, "starting experiment");
        let experiment = self
            .gateway
            .update_experiment(id, &ExperimentPatch::status(ExperimentStatus::Running))
            .await
            .map_err(|e| self.report_failure(action, e))?;

        self.store.set_experiment(Some(experiment.clone()));
        Ok(experiment)
    }

    fn acquire(&self, action: SyncAction) -> Result<tokio::sync::MutexGuard<'_, ()>, SyncError> {
        self.in_flight.try_lock().map_err(|_| {
            tracing::debug!(%action, "action refused, another is in flight");
            SyncError::Busy { action }
        })
    }

    /// Trim `experimentName` in place and return it
    fn trim_name(&self) -> String {
        let name = self.store.experiment_name().trim().to_string();
        self.store.set_experiment_name(name.clone());
        name
    }

    fn report_failure(&self, action: SyncAction, source: GatewayError) -> SyncError {
        tracing::error!(%action, error = %source, "experiment call failed");
        self.notifier.error(action.failure_message());
        SyncError::gateway(action, source)
    }

    fn schedule_flag_creation(&self, flag_id: String, experiment: &RemoteExperiment) {
        let spec = FeatureFlagSpec::for_create(flag_id.clone(), &self.config.flag_defaults(), experiment);
        let gateway = Arc::clone(&self.gateway);
        let notifier = Arc::clone(&self.notifier);
        let delay = self.config.feature_flag_delay();

        tracing::debug!(%flag_id, ?delay, "scheduling feature flag creation");
        self.deferred.spawn_after(delay, async move {
            match gateway.create_feature_flag(&spec).await {
                Ok(()) => tracing::info!(%flag_id, "feature flag created"),
                Err(e) => {
                    tracing::error!(%flag_id, error = %e, "feature flag creation failed");
                    notifier.error(FLAG_CREATE_FAILED);
                }
            }
        });
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

/// Refuse unless `action` is the offered, enabled action
fn check_offered(action: SyncAction, eval: &Evaluation) -> Result<(), SyncError> {
    if eval.offered_action() != Some(action) {
        return Err(SyncError::NotOffered {
            action,
            state: eval.state,
        });
    }
    match eval.disabled_reason() {
        Some(reason) => Err(SyncError::Disabled { action, reason }),
        None => Ok(()),
    }
}

/// Remote id and cached experiment of a created draft
fn created(
    draft: &ExperimentDraft,
    action: SyncAction,
) -> Result<(&str, &RemoteExperiment), SyncError> {
    match (draft.experiment_id(), draft.experiment.as_ref()) {
        (Some(id), Some(experiment)) => Ok((id, experiment)),
        _ => Err(SyncError::NotOffered {
            action,
            state: SyncState::Uncreated,
        }),
    }
}
