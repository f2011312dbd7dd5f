//! Shared fixture: a scripted fake engine emulating one small app.
//!
//! The script keeps per-handle state (created session objects, fetched
//! object properties) so the orchestrator's call patterns can run against it
//! unmodified: handles are allocated on create/get, layouts are served per
//! handle, session ids are `sess-1`, `sess-2`, ... in creation order.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use qix_runtime::fake::FakeEngine;
use qix_runtime::{Error as RuntimeError, Result as RuntimeResult};

pub const APP_ID: &str = "sales.qvf";

/// Contents of the emulated app.
pub struct DemoApp {
    pub sheets: Vec<Value>,
    pub measures: Vec<Value>,
    pub fields: Vec<Value>,
    pub variables: Vec<Value>,
    pub bookmarks: Vec<Value>,
    /// Object id -> `GetProperties` body.
    pub objects: HashMap<String, Value>,
    /// Expression text -> evaluated value.
    pub expressions: HashMap<String, String>,
    /// Session type whose create call should fail (e.g. "MeasureList").
    pub fail_list: Option<&'static str>,
    pub export_url: &'static str,
}

impl Default for DemoApp {
    fn default() -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            "obj-line".to_string(),
            json!({
                "qInfo": {"qId": "obj-line", "qType": "linechart"},
                "title": "Trend",
                "subtitle": "",
                "footnote": ""
            }),
        );
        objects.insert(
            "obj-kpi".to_string(),
            json!({
                "qInfo": {"qId": "obj-kpi", "qType": "kpi"},
                "title": {"qStringExpression": {"qExpr": "='Total: ' & Sum(Sales)"}},
                "subtitle": "Sub"
            }),
        );
        objects.insert(
            "obj-ext".to_string(),
            json!({
                "qInfo": {"qId": "obj-ext", "qType": "barchart"},
                "qExtendsId": "M1",
                "title": "local title that must lose"
            }),
        );
        objects.insert(
            "M1".to_string(),
            json!({
                "qInfo": {"qId": "M1", "qType": "masterobject"},
                "title": "Master title"
            }),
        );

        let mut expressions = HashMap::new();
        expressions.insert("='Total: ' & Sum(Sales)".to_string(), "Total: 1234".to_string());

        Self {
            sheets: vec![json!({
                "qInfo": {"qId": "sheet-1", "qType": "sheet"},
                "qMeta": {"title": "Overview"},
                "qData": {"cells": [
                    {"name": "obj-line", "type": "linechart", "col": 0, "row": 0},
                    {"name": "obj-kpi", "type": "kpi", "col": 6, "row": 0},
                    {"name": "obj-ext", "type": "barchart", "col": 0, "row": 4}
                ]}
            })],
            measures: vec![json!({
                "qInfo": {"qId": "m1", "qType": "measure"},
                "qMeta": {"title": "Margin"}
            })],
            fields: vec![
                json!({"qName": "Country", "qCardinal": 42}),
                json!({"qName": "Sales", "qCardinal": 9000}),
            ],
            variables: vec![json!({"qName": "vThreshold", "qDefinition": "0.25"})],
            bookmarks: vec![json!({
                "qInfo": {"qId": "bm1", "qType": "bookmark"},
                "qMeta": {"title": "Q4 focus"}
            })],
            objects,
            expressions,
            fail_list: None,
            export_url: "/tempcontent/demo-export.csv",
        }
    }
}

#[derive(Default)]
struct ScriptState {
    next_handle: i32,
    next_session: u32,
    /// handle -> `qLayout` body served by `GetLayout`.
    layouts: HashMap<i32, Value>,
    /// handle -> `qProp` body served by `GetProperties`.
    props: HashMap<i32, Value>,
}

impl ScriptState {
    fn allocate(&mut self) -> i32 {
        self.next_handle += 1;
        100 + self.next_handle
    }

    fn session_id(&mut self) -> String {
        self.next_session += 1;
        format!("sess-{}", self.next_session)
    }
}

fn engine_error(code: i64, message: &str) -> RuntimeError {
    RuntimeError::Engine {
        code,
        message: message.to_string(),
        parameter: None,
    }
}

/// Wires `app` into `engine`, replacing any previous script.
pub fn install(app: DemoApp, engine: &Arc<FakeEngine>) {
    let state = Arc::new(Mutex::new(ScriptState::default()));

    engine.on_value(
        "OpenDoc",
        json!({"qReturn": {"qHandle": 1, "qGenericId": APP_ID, "qType": "Doc"}}),
    );
    engine.on_value("DestroySessionObject", json!({"qSuccess": true}));
    engine.on_value(
        "ExportData",
        json!({"qUrl": app.export_url, "qWarnings": []}),
    );

    {
        let state = Arc::clone(&state);
        let objects = app.objects.clone();
        engine.on("GetObject", move |call| {
            let id = call.params["qId"].as_str().unwrap_or_default().to_string();
            let Some(props) = objects.get(&id) else {
                return Err(engine_error(9003, "Object not found"));
            };
            let mut state = state.lock();
            let handle = state.allocate();
            state.props.insert(handle, props.clone());
            Ok(json!({"qReturn": {
                "qHandle": handle,
                "qGenericId": id,
                "qType": "GenericObject"
            }}))
        });
    }

    {
        let state = Arc::clone(&state);
        engine.on("GetProperties", move |call| {
            let state = state.lock();
            let props = state
                .props
                .get(&call.handle)
                .ok_or_else(|| engine_error(9004, "Unknown handle"))?;
            Ok(json!({"qProp": props}))
        });
    }

    {
        let state = Arc::clone(&state);
        engine.on("GetLayout", move |call| {
            let state = state.lock();
            let layout = state
                .layouts
                .get(&call.handle)
                .ok_or_else(|| engine_error(9004, "Unknown handle"))?;
            Ok(json!({"qLayout": layout}))
        });
    }

    {
        let state = Arc::clone(&state);
        engine.on("CreateSessionObject", move |call| {
            let prop = &call.params["qProp"];
            let layout = session_layout(&app, prop)?;

            let mut state = state.lock();
            let handle = state.allocate();
            let id = state.session_id();
            state.layouts.insert(handle, layout);
            Ok(json!({"qReturn": {
                "qHandle": handle,
                "qGenericId": id,
                "qType": "GenericObject"
            }}))
        });
    }
}

/// Installs the default demo app.
pub fn demo_engine() -> Arc<FakeEngine> {
    let engine = FakeEngine::new();
    install(DemoApp::default(), &engine);
    engine
}

/// Installs the fmt subscriber once per test binary; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session_layout(app: &DemoApp, prop: &Value) -> RuntimeResult<Value> {
    // Visualization session copies reference the underlying object.
    if let Some(extends) = prop["qExtendsId"].as_str() {
        return Ok(json!({
            "qInfo": {"qType": "visualization"},
            "extends": extends
        }));
    }

    let session_type = prop["qInfo"]["qType"].as_str().unwrap_or_default();
    if app.fail_list == Some(session_type) {
        return Err(engine_error(9999, "injected list failure"));
    }

    let layout = match session_type {
        "SheetList" => json!({"qAppObjectList": {"qItems": app.sheets}}),
        "MeasureList" => json!({"qMeasureList": {"qItems": app.measures}}),
        "FieldList" => json!({"qFieldList": {"qItems": app.fields}}),
        "VariableList" => json!({"qVariableList": {"qItems": app.variables}}),
        "BookmarkList" => json!({"qBookmarkList": {"qItems": app.bookmarks}}),
        "StringExpression" => {
            let expr = prop["value"]["qStringExpression"]["qExpr"]
                .as_str()
                .unwrap_or_default();
            let value = app.expressions.get(expr).cloned().unwrap_or_default();
            json!({"value": value})
        }
        other => return Err(engine_error(9005, &format!("unscripted session type {other}"))),
    };
    Ok(layout)
}

/// The `qInfo.qType` of every `CreateSessionObject` call, in order.
pub fn created_session_types(engine: &FakeEngine) -> Vec<String> {
    engine
        .calls_of("CreateSessionObject")
        .iter()
        .map(|call| {
            call.params["qProp"]["qInfo"]["qType"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Ids destroyed via `DestroySessionObject`, in order.
pub fn destroyed_ids(engine: &FakeEngine) -> Vec<String> {
    engine
        .calls_of("DestroySessionObject")
        .iter()
        .map(|call| call.params["qId"].as_str().unwrap_or_default().to_string())
        .collect()
}
