//! App opening, aggregation and the per-client app cache.
//!
//! `get_app` assembles one [`AppRecord`] per app id: open the app, then the
//! five list fetches in a fixed order (sheet, measure, field, variable,
//! bookmark), with sheet objects flattened through the title resolver. The
//! pipeline is all-or-nothing: any stage failure aborts the call and the
//! cache is left untouched.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;

use qix_protocol::{GLOBAL_HANDLE, ListKind, ReturnedObject, SheetCell, SheetListItem};
use qix_runtime::EngineRpc;

use crate::error::{Error, Result};
use crate::title::TitleBundle;

/// Handle to an open app: the engine connection plus the app's object handle.
///
/// Cheap to clone; every session fetch, title resolution and visualization
/// in this crate goes through one of these.
#[derive(Clone)]
pub struct AppHandle {
    engine: Arc<dyn EngineRpc>,
    pub app_id: String,
    pub handle: i32,
}

impl AppHandle {
    /// Opens `app_id` on the engine and waits for its open confirmation.
    ///
    /// # Errors
    ///
    /// Fails as [`Error::Open`] when the engine rejects the open.
    pub async fn open(engine: Arc<dyn EngineRpc>, app_id: &str) -> Result<Self> {
        let opened = engine
            .call(
                GLOBAL_HANDLE,
                "OpenDoc",
                serde_json::json!({"qDocName": app_id}),
            )
            .await
            .map_err(|source| Error::Open {
                app_id: app_id.to_string(),
                source,
            })?;

        let returned: ReturnedObject = serde_json::from_value(opened)?;
        tracing::debug!(
            target = "qix.app",
            app_id,
            handle = returned.q_return.q_handle,
            "app opened"
        );

        Ok(Self {
            engine,
            app_id: app_id.to_string(),
            handle: returned.q_return.q_handle,
        })
    }

    pub(crate) fn engine(&self) -> &dyn EngineRpc {
        self.engine.as_ref()
    }
}

impl std::fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHandle")
            .field("app_id", &self.app_id)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Aggregate view of one loaded app.
#[derive(Debug)]
pub struct AppRecord {
    pub id: String,
    pub app: AppHandle,
    pub sheets: Vec<Sheet>,
    pub measures: Vec<Value>,
    pub fields: Vec<Value>,
    pub variables: Vec<Value>,
    pub bookmarks: Vec<Value>,
}

/// One sheet with its flattened objects.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Engine object id of the sheet.
    pub id: String,
    /// Sheet title metadata.
    pub name: String,
    pub objects: Vec<SheetObject>,
}

/// One object placed on a sheet, with its resolved display title.
#[derive(Debug, Clone)]
pub struct SheetObject {
    pub id: String,
    pub object_type: String,
    pub display_title: String,
    pub titles: TitleBundle,
    /// Placement geometry as reported by the sheet.
    pub options: Value,
}

/// The only shared mutable state: loaded apps, most recently loaded first.
///
/// One short mutex scope per operation, so a reader never observes a
/// half-updated list.
#[derive(Default)]
pub(crate) struct AppCache {
    inner: parking_lot::Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    order: Vec<String>,
    records: HashMap<String, Arc<AppRecord>>,
}

impl AppCache {
    pub(crate) fn contains(&self, app_id: &str) -> bool {
        self.inner.lock().records.contains_key(app_id)
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<AppRecord>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    /// Prepends `record`; when the id is already cached the first load wins
    /// and the newcomer is dropped.
    pub(crate) fn insert_front(&self, record: Arc<AppRecord>) {
        let mut inner = self.inner.lock();
        if inner.records.contains_key(&record.id) {
            return;
        }
        inner.order.insert(0, record.id.clone());
        inner.records.insert(record.id.clone(), record);
    }
}

/// The app-load pipeline: open, then the five lists in fixed order.
pub(crate) async fn load_app(engine: Arc<dyn EngineRpc>, app_id: &str) -> Result<AppRecord> {
    let app = AppHandle::open(engine, app_id).await?;

    let sheets = load_sheets(&app).await?;
    let measures = app.get_list(ListKind::Measure).await?;
    let fields = app.get_list(ListKind::Field).await?;
    let variables = app.get_list(ListKind::Variable).await?;
    let bookmarks = app.get_list(ListKind::Bookmark).await?;

    tracing::info!(
        target = "qix.app",
        app_id,
        sheets = sheets.len(),
        measures = measures.len(),
        fields = fields.len(),
        variables = variables.len(),
        bookmarks = bookmarks.len(),
        "app loaded"
    );

    Ok(AppRecord {
        id: app_id.to_string(),
        app,
        sheets,
        measures,
        fields,
        variables,
        bookmarks,
    })
}

/// Fetches the sheet list and resolves every contained object's title.
/// Objects within one sheet resolve concurrently; sheets stay in engine
/// order.
async fn load_sheets(app: &AppHandle) -> Result<Vec<Sheet>> {
    let items = app.get_list(ListKind::Sheet).await?;

    let mut sheets = Vec::with_capacity(items.len());
    for item in items {
        let item: SheetListItem = serde_json::from_value(item)?;
        let sheet_id = item
            .q_info
            .q_id
            .ok_or_else(|| Error::Payload("sheet item missing qInfo.qId".to_string()))?;

        let objects =
            try_join_all(item.q_data.cells.iter().map(|cell| flatten_object(app, cell))).await?;

        sheets.push(Sheet {
            name: item.q_meta.title.unwrap_or_else(|| sheet_id.clone()),
            id: sheet_id,
            objects,
        });
    }
    Ok(sheets)
}

async fn flatten_object(app: &AppHandle, cell: &SheetCell) -> Result<SheetObject> {
    let titles = app.resolve_title(&cell.name).await?;
    Ok(SheetObject {
        display_title: titles.display_title(&cell.name),
        id: cell.name.clone(),
        object_type: cell.obj_type.clone(),
        titles,
        options: serde_json::to_value(cell)?,
    })
}
