//! Controller flows against the in-memory platform

use growthsync_core::prelude::*;
use growthsync_core::{
    DraftField, FLAG_CREATE_FAILED, FLAG_UPDATE_FAILED, MISSING_KEYS_REASON, UNALIGNED_REASON,
};
use growthsync_gateway::GatewayError;
use growthsync_model::ExperimentStatus;
use growthsync_test_utils::{ready_draft, remote_experiment, DraftBuilder, GatewayCall, Harness};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_create_commits_trimmed_name_and_slug() {
    let h = Harness::new(ready_draft().build());

    let experiment = h.controller.create().await.unwrap();

    let draft = h.draft();
    assert_eq!(draft.experiment_name, "My Exp");
    assert_eq!(draft.feature_flag_id, "my-exp");
    assert_eq!(draft.tracking_key, "my-exp");
    assert_eq!(draft.experiment.as_ref(), Some(&experiment));

    match &h.gateway.calls()[0] {
        GatewayCall::CreateExperiment(request) => {
            assert_eq!(request.name, "My Exp");
            assert_eq!(request.tracking_key, "my-exp");
            assert_eq!(request.assignment_query_id, "user_id");
            assert_eq!(request.datasource_id, "ds_test");
            let keys: Vec<_> = request.variations.iter().map(|v| v.key.as_str()).collect();
            assert_eq!(keys, vec!["0", "1"]);
            let ids: Vec<_> = request.variations.iter().map(|v| v.id.as_str()).collect();
            assert_eq!(ids, vec!["e0", "e1"]);
        }
        other => panic!("unexpected first call {other:?}"),
    }

    assert_eq!(h.controller.evaluate().state, SyncState::InSync);
    h.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_flag_follows_create_after_delay() {
    let h = Harness::new(ready_draft().build());
    let experiment = h.controller.create().await.unwrap();

    tokio::time::sleep(Duration::from_millis(4_900)).await;
    assert!(h.gateway.flag_creates().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let flags = h.gateway.flag_creates();
    assert_eq!(flags.len(), 1);

    let flag = &flags[0];
    assert_eq!(flag.id.as_deref(), Some("my-exp"));
    assert_eq!(flag.value_type.as_deref(), Some("string"));
    let rule = flag.experiment_rule("production").unwrap();
    assert_eq!(rule.experiment_id, experiment.id);
    let values: Vec<_> = rule
        .variations
        .iter()
        .map(|v| (v.variation_id.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(values, vec![("var_e0", "0"), ("var_e1", "1")]);
    assert!(h.notifier.is_silent());
}

#[tokio::test(start_paused = true)]
async fn test_failed_flag_creation_is_reported() {
    let h = Harness::new(ready_draft().build());
    h.gateway
        .fail_flag_creates(Some(GatewayError::Transport("connection reset".into())));

    h.controller.create().await.unwrap();
    h.controller.shutdown().await;

    assert_eq!(h.notifier.errors(), vec![FLAG_CREATE_FAILED.to_string()]);
    assert_eq!(h.controller.evaluate().state, SyncState::InSync);
}

#[tokio::test]
async fn test_create_failure_then_retry_is_safe() {
    let h = Harness::new(ready_draft().build());
    h.gateway.fail_next_create(GatewayError::rejected(500, "boom"));

    let err = h.controller.create().await.unwrap_err();
    assert!(matches!(err, SyncError::Gateway { action: SyncAction::Create, .. }));
    assert_eq!(
        h.notifier.errors(),
        vec!["Failed to create the experiment on Growthbook".to_string()]
    );

    let after_failure = h.draft();
    assert!(after_failure.experiment.is_none());
    assert_eq!(after_failure.feature_flag_id, "my-exp");
    assert_eq!(h.controller.pending_tasks(), 0);
    assert_eq!(h.controller.evaluate().state, SyncState::Uncreated);

    h.controller.create().await.unwrap();
    assert_eq!(h.gateway.experiment_count(), 1);

    let creates: Vec<_> = h
        .gateway
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GatewayCall::CreateExperiment(_)))
        .collect();
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[0], creates[1]);
    h.controller.cancel_pending();
}

#[tokio::test]
async fn test_create_is_never_repeated() {
    let h = Harness::new(ready_draft().build());
    h.controller.create().await.unwrap();
    h.controller.cancel_pending();

    let err = h.controller.create().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::NotOffered {
            action: SyncAction::Create,
            state: SyncState::InSync
        }
    ));
    assert_eq!(h.gateway.experiment_count(), 1);
}

#[tokio::test]
async fn test_create_refused_without_enough_variations() {
    let h = Harness::new(DraftBuilder::new().named("Solo").variation("Control", "e0").build());

    let err = h.controller.create().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.gateway.call_count(), 0);
    assert!(h.notifier.is_silent());
}

#[tokio::test]
async fn test_create_refused_for_blank_name() {
    let h = Harness::new(
        DraftBuilder::new()
            .named("   ")
            .variation("Control", "e0")
            .variation("Variation A", "e1")
            .build(),
    );

    assert!(matches!(
        h.controller.create().await,
        Err(SyncError::Disabled { action: SyncAction::Create, .. })
    ));
    assert_eq!(h.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_in_sync_draft_offers_start_only() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control", "Variation A"]);
    let h = Harness::new(
        ready_draft()
            .experiment(remote)
            .slug("my-exp")
            .build(),
    );

    let eval = h.controller.evaluate();
    assert!(!eval.show_update_button);
    assert_eq!(eval.offered_action(), Some(SyncAction::Start));
    assert!(matches!(
        h.controller.update().await,
        Err(SyncError::NotOffered { action: SyncAction::Update, .. })
    ));
}

#[tokio::test]
async fn test_renamed_variation_offers_update() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control", "Variation A"]);
    let h = Harness::new(
        DraftBuilder::new()
            .named("My Exp")
            .variation("Control", "e0")
            .variation("Variation B", "e1")
            .experiment(remote)
            .slug("my-exp")
            .build(),
    );

    let eval = h.controller.evaluate();
    assert!(eval.show_update_button);
    assert_eq!(eval.offered_action(), Some(SyncAction::Update));
    assert_eq!(eval.status_line().as_deref(), Some("draft, out of sync"));
}

#[tokio::test]
async fn test_running_in_sync_offers_nothing() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Running, &["Control", "Variation A"]);
    let h = Harness::new(ready_draft().experiment(remote).slug("my-exp").build());

    let eval = h.controller.evaluate();
    assert_eq!(eval.state, SyncState::Running);
    assert_eq!(eval.offered_action(), None);
    assert!(matches!(
        h.controller.start().await,
        Err(SyncError::NotOffered { action: SyncAction::Start, .. })
    ));
}

#[tokio::test]
async fn test_failed_update_leaves_cache_untouched() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control", "Variation A"]);
    let gateway = growthsync_test_utils::FakeGateway::shared();
    gateway.insert_experiment(remote.clone());
    let h = Harness::with_gateway(
        DraftBuilder::new()
            .named("My Exp")
            .variation("Control", "e0")
            .variation("Variation B", "e1")
            .experiment(remote.clone())
            .slug("my-exp")
            .build(),
        gateway,
    );
    h.gateway.fail_next_update(GatewayError::rejected(502, "bad gateway"));

    let err = h.controller.update().await.unwrap_err();
    assert!(matches!(err, SyncError::Gateway { action: SyncAction::Update, .. }));
    assert_eq!(
        h.notifier.errors(),
        vec!["Failed to update the experiment on Growthbook".to_string()]
    );
    assert_eq!(h.draft().experiment, Some(remote));
}

#[tokio::test]
async fn test_update_resets_weights_and_rewires_flag() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control", "Variation A"])
        .with_phases(vec![
            growthsync_model::Phase::default().with_weights(vec![0.9, 0.1]),
            growthsync_model::Phase::default().with_weights(vec![0.2, 0.8]),
        ]);
    let gateway = growthsync_test_utils::FakeGateway::shared();
    gateway.insert_experiment(remote.clone());
    gateway.insert_flag(
        "my-exp",
        growthsync_model::FeatureFlagSpec::for_create("my-exp", &SyncConfig::new().flag_defaults(), &remote),
    );
    let h = Harness::with_gateway(
        DraftBuilder::new()
            .named(" My Exp  ")
            .variation("Control", "e0")
            .variation("Variation A", "e1")
            .variation("Variation B", "e2")
            .experiment(remote)
            .slug("my-exp")
            .build(),
        gateway,
    );

    let updated = h.controller.update().await.unwrap();

    let (id, patch) = h.gateway.experiment_patches().remove(0);
    assert_eq!(id, "exp_9");
    assert_eq!(patch.name.as_deref(), Some("My Exp"));
    assert_eq!(patch.tracking_key.as_deref(), Some("my-exp"));
    assert_eq!(patch.assignment_query_id.as_deref(), Some("user_id"));
    let phases = patch.phases.unwrap();
    assert_eq!(phases.len(), 2);
    for phase in &phases {
        assert_eq!(phase.variation_weights.len(), 3);
        let total: f64 = phase.variation_weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    let flag = h.gateway.flag("my-exp").unwrap();
    let rule = flag.experiment_rule("production").unwrap();
    let variation_ids: Vec<_> = rule.variations.iter().map(|v| v.variation_id.clone()).collect();
    let expected: Vec<_> = updated.variations.iter().map(|v| v.variation_id.clone()).collect();
    assert_eq!(variation_ids, expected);

    assert_eq!(h.draft().experiment_name, "My Exp");
    assert_eq!(h.controller.evaluate().state, SyncState::InSync);
    assert!(h.notifier.is_silent());
}

#[tokio::test]
async fn test_failed_flag_update_does_not_fail_update() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control"]);
    let gateway = growthsync_test_utils::FakeGateway::shared();
    gateway.insert_experiment(remote.clone());
    let h = Harness::with_gateway(
        ready_draft().experiment(remote).slug("my-exp").build(),
        gateway,
    );

    // no flag was ever created, so the flag update is rejected
    h.controller.update().await.unwrap();
    assert_eq!(h.notifier.errors(), vec![FLAG_UPDATE_FAILED.to_string()]);
    assert_eq!(h.controller.evaluate().state, SyncState::InSync);
}

#[tokio::test]
async fn test_update_refused_without_slug() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control"]);
    let h = Harness::new(ready_draft().experiment(remote).build());

    let eval = h.controller.evaluate();
    assert_eq!(eval.offered_action(), Some(SyncAction::Update));
    assert!(!eval.is_enabled(SyncAction::Update));
    assert_eq!(eval.disabled_reason(), Some(MISSING_KEYS_REASON));
    assert!(matches!(
        h.controller.update().await,
        Err(SyncError::Disabled { action: SyncAction::Update, reason: MISSING_KEYS_REASON })
    ));
    assert_eq!(h.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_unaligned_draft_disables_update() {
    let remote = remote_experiment("exp_9", ExperimentStatus::Draft, &["Control", "Variation A"]);
    let h = Harness::new(
        ready_draft()
            .unlinked("Variation B")
            .experiment(remote)
            .slug("my-exp")
            .build(),
    );

    assert_eq!(h.controller.evaluate().disabled_reason(), Some(UNALIGNED_REASON));
    assert!(matches!(
        h.controller.update().await,
        Err(SyncError::Disabled { reason: UNALIGNED_REASON, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_full_lifecycle() {
    let h = Harness::new(ready_draft().build());
    let editor = DraftEditor::new(std::sync::Arc::clone(h.store()), h.notifier.clone());
    assert_eq!(h.controller.evaluate().state, SyncState::Uncreated);

    let created = h.controller.create().await.unwrap();
    assert_eq!(h.controller.evaluate().state, SyncState::InSync);
    h.controller.shutdown().await;
    assert!(h.gateway.flag("my-exp").is_some());

    editor.add_variation().unwrap();
    editor
        .link_entry("Variation B", EntryLink::new("e2"))
        .unwrap();
    assert_eq!(h.controller.evaluate().state, SyncState::OutOfSync);

    let updated = h.controller.update().await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.variations.len(), 3);
    assert_eq!(h.controller.evaluate().state, SyncState::InSync);

    let started = h.controller.start().await.unwrap();
    assert!(started.is_running());
    let eval = h.controller.evaluate();
    assert_eq!(eval.state, SyncState::Running);
    assert_eq!(eval.status_line().as_deref(), Some("running"));

    editor.remove_variation("Variation B").unwrap();
    assert_eq!(h.controller.evaluate().state, SyncState::OutOfSync);
    assert_eq!(
        h.notifier.warnings(),
        vec![growthsync_core::RUNNING_EDIT_WARNING.to_string()]
    );

    h.controller.update().await.unwrap();
    assert_eq!(h.controller.evaluate().state, SyncState::Running);
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_store_subscribers_see_controller_writes() {
    let h = Harness::new(ready_draft().build());
    let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&seen);
    h.store().subscribe(move |field| sink.lock().push(field));

    h.controller.create().await.unwrap();
    h.controller.cancel_pending();

    assert_eq!(
        *seen.lock(),
        vec![
            DraftField::ExperimentName,
            DraftField::FeatureFlagId,
            DraftField::TrackingKey,
            DraftField::Experiment,
        ]
    );
}
