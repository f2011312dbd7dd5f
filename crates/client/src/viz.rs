//! Visualization lifecycle: obtain, show, export, close.
//!
//! A [`Visualization`] is a session copy of the underlying object (created
//! with `qExtendsId`), so the handle owns a server-side resource that
//! `close` destroys. Rendering itself belongs to the presentation layer
//! behind [`RenderSurface`]; this module only sequences the engine calls.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use qix_protocol::{ExportDataResult, ExportFileType, ObjectInterface};

use crate::app::AppHandle;
use crate::config::Endpoints;
use crate::error::{Error, Result};

/// Interaction flags forwarded to the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct ShowOptions {
    pub allow_interaction: bool,
    pub allow_selections: bool,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            allow_interaction: true,
            allow_selections: true,
        }
    }
}

/// Boundary to the out-of-scope presentation layer: a screen region that can
/// take a layout or a user-facing error.
pub trait RenderSurface: Send + Sync {
    /// Identifier of the region the visualization renders into.
    fn surface_id(&self) -> &str;

    fn render(&self, layout: &Value, options: &ShowOptions);

    fn render_error(&self, error: &Error);
}

/// Data-export parameters.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFileType,
    pub filename: Option<String>,
}

/// A live rendering session for one object.
///
/// Owned by the caller for the duration of a rendering session; call
/// [`close`](Visualization::close) when no longer shown so the server-side
/// session copy is released.
pub struct Visualization {
    app: AppHandle,
    pub object_id: String,
    session: ObjectInterface,
    export_in_flight: AtomicBool,
}

impl AppHandle {
    /// Obtains a visualization handle for `object_id`.
    pub async fn get_visualization(&self, object_id: &str) -> Result<Visualization> {
        let props = serde_json::json!({
            "qInfo": {"qType": "visualization"},
            "qExtendsId": object_id
        });
        let session = self.create_session_object(props).await?;

        tracing::debug!(
            target = "qix.viz",
            object_id,
            handle = session.q_handle,
            "visualization session created"
        );
        Ok(Visualization {
            app: self.clone(),
            object_id: object_id.to_string(),
            session,
            export_in_flight: AtomicBool::new(false),
        })
    }
}

impl Visualization {
    /// Renders the current layout into `surface`.
    ///
    /// Layout failures are reported to the surface's error path and also
    /// returned, so the consumer can decide whether to retry or tear down.
    pub async fn show(&self, surface: &dyn RenderSurface, options: &ShowOptions) -> Result<()> {
        let layout = self
            .app
            .engine()
            .call(self.session.q_handle, "GetLayout", serde_json::json!({}))
            .await;

        match layout {
            Ok(result) => {
                tracing::debug!(
                    target = "qix.viz",
                    object_id = %self.object_id,
                    surface = surface.surface_id(),
                    "visualization rendered"
                );
                surface.render(&result["qLayout"], options);
                Ok(())
            }
            Err(source) => {
                let error = Error::Engine(source);
                surface.render_error(&error);
                Err(error)
            }
        }
    }

    /// Exports the visualization's data and returns the download URI.
    ///
    /// At most one export per handle may be in flight: a concurrent second
    /// call fails immediately with [`Error::Export`] instead of racing the
    /// first.
    pub async fn export_data(&self, endpoints: &Endpoints, request: &ExportRequest) -> Result<String> {
        if self.export_in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::Export(format!(
                "export already in flight for {}",
                self.object_id
            )));
        }

        let result = self.export_inner(endpoints, request).await;
        self.export_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn export_inner(&self, endpoints: &Endpoints, request: &ExportRequest) -> Result<String> {
        let mut params = serde_json::json!({
            "qFileType": request.format,
            "qPath": "/qHyperCubeDef"
        });
        if let Some(filename) = &request.filename {
            params["qFileName"] = Value::String(filename.clone());
        }

        let exported = self
            .app
            .engine()
            .call(self.session.q_handle, "ExportData", params)
            .await
            .map_err(|error| Error::Export(error.to_string()))?;
        let exported: ExportDataResult = serde_json::from_value(exported)?;

        if !exported.q_warnings.is_empty() {
            tracing::warn!(
                target = "qix.viz",
                object_id = %self.object_id,
                warnings = ?exported.q_warnings,
                "export completed with warnings"
            );
        }
        endpoints.download_url(&exported.q_url)
    }

    /// Releases the server-side session copy. Best effort: a destroy failure
    /// is logged, not surfaced.
    pub async fn close(self) {
        self.app.destroy_session_object(&self.session).await;
    }
}

impl std::fmt::Debug for Visualization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visualization")
            .field("object_id", &self.object_id)
            .field("handle", &self.session.q_handle)
            .finish()
    }
}
