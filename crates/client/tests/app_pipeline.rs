//! End-to-end app loading against a scripted engine: pipeline order,
//! aggregation, caching and cleanup.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use qix::{ClientConfig, EngineClient, Error, ListKind};
use qix_runtime::fake::FakeEngine;

fn client_for(engine: &Arc<FakeEngine>) -> EngineClient {
    common::init_tracing();
    let client = EngineClient::new(
        ClientConfig::new("srv").with_port(4848).with_secure(false),
    );
    client.attach(engine.clone());
    client
}

#[tokio::test]
async fn load_opens_the_app_then_fetches_lists_in_fixed_order() -> anyhow::Result<()> {
    let engine = common::demo_engine();
    let client = client_for(&engine);

    let apps = client.get_app(common::APP_ID).await?;
    assert_eq!(apps.len(), 1);

    let record = &apps[0];
    assert_eq!(record.id, common::APP_ID);
    assert_eq!(record.sheets.len(), 1);
    assert_eq!(record.measures.len(), 1);
    assert_eq!(record.fields.len(), 2);
    assert_eq!(record.variables.len(), 1);
    assert_eq!(record.bookmarks.len(), 1);

    let sheet = &record.sheets[0];
    assert_eq!(sheet.id, "sheet-1");
    assert_eq!(sheet.name, "Overview");
    let titles: Vec<&str> = sheet
        .objects
        .iter()
        .map(|object| object.display_title.as_str())
        .collect();
    assert_eq!(titles, ["Trend", "Total: 1234", "Master title"]);

    assert_eq!(engine.call_sequence()[0], "OpenDoc");
    let lists: Vec<String> = common::created_session_types(&engine)
        .into_iter()
        .filter(|session_type| session_type.ends_with("List"))
        .collect();
    assert_eq!(
        lists,
        ["SheetList", "MeasureList", "FieldList", "VariableList", "BookmarkList"]
    );
    Ok(())
}

#[tokio::test]
async fn every_session_object_is_destroyed_exactly_once() {
    let engine = common::demo_engine();
    let client = client_for(&engine);

    client.get_app(common::APP_ID).await.unwrap();

    let created = engine.calls_of("CreateSessionObject").len();
    let expected: BTreeSet<String> = (1..=created).map(|n| format!("sess-{n}")).collect();
    let destroyed: BTreeSet<String> = common::destroyed_ids(&engine).into_iter().collect();
    assert_eq!(destroyed, expected);
    assert_eq!(common::destroyed_ids(&engine).len(), created);

    // Destroys always go to the app handle, not the session handle.
    for destroy in engine.calls_of("DestroySessionObject") {
        assert_eq!(destroy.handle, 1);
    }
}

#[tokio::test]
async fn cached_app_costs_no_engine_calls_and_stays_identical() -> anyhow::Result<()> {
    let engine = common::demo_engine();
    let client = client_for(&engine);

    let first = client.get_app(common::APP_ID).await?;
    let calls_after_load = engine.calls().len();

    let second = client.get_app(common::APP_ID).await?;
    assert_eq!(engine.calls().len(), calls_after_load);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    Ok(())
}

#[tokio::test]
async fn most_recently_loaded_app_comes_first() {
    let engine = common::demo_engine();
    let client = client_for(&engine);

    client.get_app("a.qvf").await.unwrap();
    let apps = client.get_app("b.qvf").await.unwrap();

    let ids: Vec<&str> = apps.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, ["b.qvf", "a.qvf"]);
}

#[tokio::test]
async fn failure_mid_pipeline_aborts_the_load_and_caches_nothing() {
    let mut app = common::DemoApp::default();
    app.fail_list = Some("MeasureList");
    let engine = FakeEngine::new();
    common::install(app, &engine);
    let client = client_for(&engine);

    let error = client.get_app(common::APP_ID).await.unwrap_err();
    match error {
        Error::ListFetch { kind, .. } => assert_eq!(kind, ListKind::Measure),
        other => panic!("expected a list fetch error, got {other:?}"),
    }

    // The pipeline stopped at the failing stage.
    let types = common::created_session_types(&engine);
    assert!(types.contains(&"SheetList".to_string()));
    assert!(!types.contains(&"FieldList".to_string()));

    // The failed create produced no session, so nothing is leaked:
    // every successful create has a matching destroy.
    assert_eq!(
        common::destroyed_ids(&engine).len(),
        engine.calls_of("CreateSessionObject").len() - 1
    );

    // Nothing was cached; a retry goes back to the engine and succeeds.
    common::install(common::DemoApp::default(), &engine);
    let calls_before_retry = engine.calls().len();
    let apps = client.get_app(common::APP_ID).await.unwrap();
    assert!(engine.calls().len() > calls_before_retry);
    assert_eq!(apps[0].id, common::APP_ID);
}
