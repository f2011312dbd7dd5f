//! Connection configuration and derived endpoint URLs.
//!
//! `ClientConfig` is raw caller input; [`Endpoints`] is the normalized form
//! derived exactly once at client construction and immutable afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Raw connection settings for one engine deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Engine host name (required).
    pub host: String,
    /// Port, omitted from URLs when `None`.
    pub port: Option<u16>,
    /// Virtual-proxy path prefix; `"/"` means none.
    pub prefix: String,
    /// `https`/`wss` when `true`.
    pub secure: bool,
    /// Cloud-tenant id authorizing cross-origin calls (SaaS only).
    pub web_integration_id: Option<String>,
    /// Pre-issued session ticket (enterprise only).
    pub ticket: Option<String>,
    /// Whether the deployment is a SaaS tenant.
    pub saas: bool,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            prefix: "/".to_string(),
            secure: true,
            web_integration_id: None,
            ticket: None,
            saas: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_web_integration_id(mut self, id: impl Into<String>) -> Self {
        self.web_integration_id = Some(id.into());
        self
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    pub fn with_saas(mut self, saas: bool) -> Self {
        self.saas = saas;
        self
    }
}

/// URLs derived from a [`ClientConfig`], computed once and never mutated.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Static-resource root: `scheme://host[:port]{prefix}resources`.
    pub base_url: String,
    /// Server root: `scheme://host[:port]`.
    pub saas_url: String,
    ws_base: String,
}

impl Endpoints {
    pub fn derive(config: &ClientConfig) -> Self {
        let scheme = if config.secure { "https" } else { "http" };
        let ws_scheme = if config.secure { "wss" } else { "ws" };
        let authority = match config.port {
            Some(port) => format!("{}:{port}", config.host),
            None => config.host.clone(),
        };
        let prefix = normalize_prefix(&config.prefix);

        Self {
            base_url: format!("{scheme}://{authority}{prefix}resources"),
            saas_url: format!("{scheme}://{authority}"),
            ws_base: format!("{ws_scheme}://{authority}{prefix}app/"),
        }
    }

    /// Engine socket URL for `app_id`, or the global `engineData` scope.
    ///
    /// The web-integration id is attached only for SaaS tenants; a
    /// pre-issued ticket is attached whenever configured.
    pub fn websocket_url(&self, config: &ClientConfig, app_id: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&self.ws_base)
            .and_then(|base| base.join(app_id.unwrap_or("engineData")))
            .map_err(|error| Error::Connect(format!("invalid engine url: {error}")))?;

        {
            let mut query = url.query_pairs_mut();
            if config.saas {
                if let Some(id) = &config.web_integration_id {
                    query.append_pair("qlik-web-integration-id", id);
                }
            }
            if let Some(ticket) = &config.ticket {
                query.append_pair("qlikTicket", ticket);
            }
        }

        let mut url = url.to_string();
        // Url serializes an empty query as a bare trailing '?'.
        if url.ends_with('?') {
            url.pop();
        }
        Ok(url)
    }

    /// Resolves an engine-relative download path against the server root.
    pub fn download_url(&self, path: &str) -> Result<String> {
        Url::parse(&self.saas_url)
            .and_then(|base| base.join(path))
            .map(|url| url.to_string())
            .map_err(|error| Error::Export(format!("invalid download path {path}: {error}")))
    }
}

/// Ensures exactly one `/` joins prefix segments: leading and trailing slash,
/// with `""` and `"/"` both meaning no prefix.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
