use keg_backends::MemoryStore;
use keg_core::{BuildError, EngineSettings, PubPolicy, ScaleEngine};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
fn builder_missing_store_yields_typed_build_error() {
    let err = ScaleEngine::builder()
        .with_settings(EngineSettings::default())
        .try_build()
        .expect_err("should fail with MissingStore");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingStore) => {}
        other => panic!("expected MissingStore, got: {other:?}"),
    }
}

#[rstest]
#[case(EngineSettings { min_weight_g: 9000.0, max_weight_g: 8000.0, ..EngineSettings::default() })]
#[case(EngineSettings { guess_tolerance_g: 0.0, ..EngineSettings::default() })]
#[case(EngineSettings { event_log_cap: 0, ..EngineSettings::default() })]
#[case(EngineSettings {
    pub_policy: PubPolicy { liveness_window: chrono::Duration::zero(), ..PubPolicy::default() },
    ..EngineSettings::default()
})]
fn builder_rejects_invalid_settings(#[case] settings: EngineSettings) {
    let err = ScaleEngine::builder()
        .with_store(Arc::new(MemoryStore::new()))
        .with_settings(settings)
        .try_build()
        .expect_err("should reject settings");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidSettings(_))
    ));
}

#[test]
fn defaults_build() {
    let engine = ScaleEngine::builder()
        .with_store(Arc::new(MemoryStore::new()))
        .try_build()
        .unwrap();
    assert_eq!(engine.settings().min_weight_g, 6000.0);
    assert_eq!(engine.get_push_response(), "   0");
}
