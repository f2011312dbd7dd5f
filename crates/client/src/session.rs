//! The session-scoped list-fetch pattern.
//!
//! Every list read follows the same shape: create one transient session
//! object carrying the list definition, read its layout, destroy it. The
//! destroy is the load-bearing part - session objects are server-side
//! resources with no purpose beyond the call that created them, so exactly
//! one destroy is issued per create, also when the read fails. On the
//! normal path the destroy is awaited so a failure is at least logged,
//! never silently dropped; when the owning future is cancelled mid-read,
//! the armed cleanup guard spawns the destroy from its `Drop` instead, so
//! abandonment never leaks the object.

use serde_json::Value;

use qix_protocol::{ListKind, ObjectInterface, ReturnedObject};

use crate::app::AppHandle;
use crate::error::{Error, Result};

impl AppHandle {
    /// Fetches one of the five app-level lists.
    ///
    /// # Errors
    ///
    /// Fails as [`Error::ListFetch`] when the session object cannot be
    /// created or its layout cannot be read. A destroy failure after a
    /// successful read is logged, not surfaced.
    pub async fn get_list(&self, kind: ListKind) -> Result<Vec<Value>> {
        self.get_list_inner(kind)
            .await
            .map_err(|source| Error::ListFetch {
                kind,
                source: Box::new(source),
            })
    }

    async fn get_list_inner(&self, kind: ListKind) -> Result<Vec<Value>> {
        let mut props = serde_json::json!({
            "qInfo": {"qType": kind.session_type()}
        });
        props[kind.def_field()] = kind.def();

        let session = self.create_session_object(props).await?;
        let layout = self.read_and_destroy(&session).await?;

        let items = layout[kind.layout_field()]["qItems"]
            .as_array()
            .cloned()
            .ok_or_else(|| {
                Error::Payload(format!("{} layout missing {}.qItems", kind, kind.layout_field()))
            })?;

        tracing::debug!(target = "qix.session", kind = %kind, items = items.len(), "list fetched");
        Ok(items)
    }

    /// Creates a session object and returns its engine reference.
    pub(crate) async fn create_session_object(&self, props: Value) -> Result<ObjectInterface> {
        let created = self
            .engine()
            .call(
                self.handle,
                "CreateSessionObject",
                serde_json::json!({"qProp": props}),
            )
            .await?;
        let returned: ReturnedObject = serde_json::from_value(created)?;
        Ok(returned.q_return)
    }

    /// Reads the session object's layout, then destroys it whichever way the
    /// read went - including when the caller drops this future mid-read.
    /// Returns the layout body (`qLayout`).
    pub(crate) async fn read_and_destroy(&self, session: &ObjectInterface) -> Result<Value> {
        let cleanup = self.session_cleanup(session);

        let read = self
            .engine()
            .call(session.q_handle, "GetLayout", serde_json::json!({}))
            .await;

        cleanup.destroy().await;

        let result = read?;
        Ok(result["qLayout"].clone())
    }

    /// Best-effort destroy of a session object; failures are logged.
    pub(crate) async fn destroy_session_object(&self, session: &ObjectInterface) {
        self.session_cleanup(session).destroy().await;
    }

    fn session_cleanup(&self, session: &ObjectInterface) -> SessionCleanup {
        if session.q_generic_id.is_none() {
            tracing::warn!(
                target = "qix.session",
                handle = session.q_handle,
                "session object has no id; cannot destroy"
            );
        }
        SessionCleanup {
            app: self.clone(),
            id: session.q_generic_id.clone(),
        }
    }
}

/// Owns the obligation to destroy one session object.
///
/// The normal path consumes it with [`destroy`](SessionCleanup::destroy),
/// which awaits the call inline. Dropping it with the obligation still
/// pending - the owning future was cancelled while its read was in flight -
/// spawns the destroy as a detached task, so the server-side object is
/// released either way.
struct SessionCleanup {
    app: AppHandle,
    id: Option<String>,
}

impl SessionCleanup {
    async fn destroy(mut self) {
        if let Some(id) = self.id.take() {
            destroy_session(&self.app, &id).await;
        }
    }
}

impl Drop for SessionCleanup {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(target = "qix.session", %id, "no runtime left to destroy session object");
            return;
        };
        let app = self.app.clone();
        runtime.spawn(async move { destroy_session(&app, &id).await });
    }
}

async fn destroy_session(app: &AppHandle, id: &str) {
    match app
        .engine()
        .call(
            app.handle,
            "DestroySessionObject",
            serde_json::json!({"qId": id}),
        )
        .await
    {
        Ok(_) => tracing::trace!(target = "qix.session", %id, "session object destroyed"),
        Err(error) => {
            tracing::warn!(target = "qix.session", %id, %error, "failed to destroy session object");
        }
    }
}
