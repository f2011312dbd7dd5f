//! Display-title resolution for sheet objects.
//!
//! An object's title, subtitle and footnote each come in two shapes: a plain
//! string, passed through unchanged, or a string expression the engine must
//! evaluate against the app. Objects may also extend a master object, whose
//! metadata is then authoritative (one level of indirection). Expression
//! evaluation uses the same transient-session-object pattern as the list
//! fetches: create, read, always destroy.
//!
//! The three fields evaluate sequentially. The engine tolerates concurrent
//! evaluate calls on one app, but sequential keeps failure attribution
//! per-field and matches the observed behavior of the capability API.

use qix_protocol::{GenericObjectProperties, PropertiesEnvelope, ReturnedObject, TitleExpr};

use crate::app::AppHandle;
use crate::error::Result;

/// Resolved title metadata of one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleBundle {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub footnote: Option<String>,
}

impl TitleBundle {
    /// `title || subtitle || footnote || fallback`, where whitespace-only
    /// values count as empty.
    pub fn display_title(&self, fallback: &str) -> String {
        [&self.title, &self.subtitle, &self.footnote]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|text| !text.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl AppHandle {
    /// Resolves the title metadata for `object_id`, following a master-object
    /// link when the properties declare one.
    pub async fn resolve_title(&self, object_id: &str) -> Result<TitleBundle> {
        let own = self.object_properties(object_id).await?;

        // The master object's metadata is authoritative for extending objects.
        let props = match own.q_extends_id.as_deref() {
            Some(master_id) => {
                tracing::debug!(
                    target = "qix.title",
                    object_id,
                    master_id,
                    "object extends a master object"
                );
                self.object_properties(master_id).await?
            }
            None => own,
        };

        Ok(TitleBundle {
            title: self.resolve_field(props.title.as_ref()).await?,
            subtitle: self.resolve_field(props.subtitle.as_ref()).await?,
            footnote: self.resolve_field(props.footnote.as_ref()).await?,
        })
    }

    async fn object_properties(&self, object_id: &str) -> Result<GenericObjectProperties> {
        let fetched = self
            .engine()
            .call(
                self.handle,
                "GetObject",
                serde_json::json!({"qId": object_id}),
            )
            .await?;
        let returned: ReturnedObject = serde_json::from_value(fetched)?;

        let props = self
            .engine()
            .call(
                returned.q_return.q_handle,
                "GetProperties",
                serde_json::json!({}),
            )
            .await?;
        let envelope: PropertiesEnvelope = serde_json::from_value(props)?;
        Ok(envelope.q_prop)
    }

    /// Literal strings pass through unchanged; non-blank expressions are
    /// evaluated against the app.
    async fn resolve_field(&self, field: Option<&TitleExpr>) -> Result<Option<String>> {
        let Some(expr) = field else {
            return Ok(None);
        };
        if let Some(text) = expr.as_literal() {
            return Ok(Some(text.to_string()));
        }
        match expr.as_expression() {
            Some(body) => self.evaluate_expression(body).await.map(Some),
            None => Ok(None),
        }
    }

    /// Evaluates a string expression through a transient session object.
    async fn evaluate_expression(&self, expr: &str) -> Result<String> {
        let props = serde_json::json!({
            "qInfo": {"qType": "StringExpression"},
            "value": {"qStringExpression": {"qExpr": expr}}
        });

        let session = self.create_session_object(props).await?;
        let layout = self.read_and_destroy(&session).await?;

        Ok(layout["value"].as_str().unwrap_or_default().to_string())
    }
}
