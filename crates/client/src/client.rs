//! The engine client orchestrator.
//!
//! Owns the normalized configuration, the bootstrap state, the engine
//! connection and the app cache, and enforces the bootstrap → connect →
//! authenticate ordering. Everything here is cheap sequencing; the heavy
//! lifting lives in the per-concern modules.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use qix_runtime::{Connection, EngineEvent, EngineRpc, SocketTransport};

use crate::app::{self, AppCache, AppRecord};
use crate::auth::UserIdentity;
use crate::bootstrap::{BootstrapAssets, BootstrapState};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpMethod, ReqwestClient};
use crate::viz::{ExportRequest, Visualization};

/// Client-side orchestrator for one engine deployment.
pub struct EngineClient {
    config: ClientConfig,
    endpoints: Endpoints,
    http: Arc<dyn HttpClient>,
    bootstrap: BootstrapState,
    engine: parking_lot::Mutex<Option<Arc<dyn EngineRpc>>>,
    event_sink: parking_lot::Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
    pub(crate) identity: parking_lot::Mutex<Option<UserIdentity>>,
    apps: AppCache,
}

impl EngineClient {
    /// Builds a client; URLs are derived here, once, and never change.
    pub fn new(config: ClientConfig) -> Self {
        let endpoints = Endpoints::derive(&config);
        Self {
            config,
            endpoints,
            http: Arc::new(ReqwestClient::new()),
            bootstrap: BootstrapState::new(),
            engine: parking_lot::Mutex::new(None),
            event_sink: parking_lot::Mutex::new(None),
            identity: parking_lot::Mutex::new(None),
            apps: AppCache::default(),
        }
    }

    /// Swaps the HTTP implementation (tests, custom TLS stacks).
    pub fn with_http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Installs the sink receiving engine-level events (pushes, lost
    /// connection). Install before [`connect`](Self::connect); the sink is
    /// wired into the connection at connect time.
    pub fn on_engine_event(&self, sink: mpsc::UnboundedSender<EngineEvent>) {
        *self.event_sink.lock() = Some(sink);
    }

    /// Loads the engine runtime assets; idempotent across the client.
    pub async fn bootstrap(&self) -> Result<()> {
        self.bootstrap
            .bootstrap(self.http.as_ref(), &self.endpoints.base_url)
            .await
    }

    /// The bootstrap assets, for the presentation layer to inject.
    pub async fn bootstrap_assets(&self) -> Option<BootstrapAssets> {
        self.bootstrap.assets().await
    }

    /// Dials the engine socket and starts the connection loop.
    ///
    /// Must run after [`bootstrap`](Self::bootstrap) and before
    /// [`authenticate`](Self::authenticate) or any app access.
    pub async fn connect(&self) -> Result<Arc<dyn EngineRpc>> {
        if !self.bootstrap.is_ready().await {
            return Err(Error::Connect(
                "bootstrap has not completed".to_string(),
            ));
        }
        if let Some(engine) = self.engine.lock().clone() {
            return Ok(engine);
        }

        let url = self.endpoints.websocket_url(&self.config, None)?;
        tracing::debug!(target = "qix.connect", %url, "dialing engine");

        let parts = SocketTransport::connect(&url)
            .await
            .map_err(|error| Error::Connect(error.to_string()))?;
        let connection = Arc::new(Connection::new(parts));

        if let Some(sink) = self.event_sink.lock().clone() {
            connection.set_event_sink(sink);
        }

        let loop_connection = Arc::clone(&connection);
        tokio::spawn(async move { loop_connection.run().await });

        let engine: Arc<dyn EngineRpc> = connection;
        *self.engine.lock() = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Attaches a pre-built engine seam instead of dialing a socket
    /// (embedding, tests). Counts as connected and as bootstrapped-by-proxy
    /// for ordering purposes.
    pub fn attach(&self, engine: Arc<dyn EngineRpc>) {
        *self.engine.lock() = Some(engine);
    }

    pub(crate) fn engine(&self) -> Result<Arc<dyn EngineRpc>> {
        self.engine
            .lock()
            .clone()
            .ok_or_else(|| Error::Connect("connect() has not completed".to_string()))
    }

    /// One JSON request against the deployment's HTTP APIs.
    ///
    /// # Errors
    ///
    /// Non-success statuses are errors like everything else; there is no
    /// falsy-sentinel return.
    pub async fn fetch_api(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let response = self.http.request(method, url, body).await?;
        if !(200..300).contains(&response.status) {
            return Err(Error::Http(format!(
                "{url} returned status {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    /// Returns the app cache, most recently loaded first, loading `app_id`
    /// on first request.
    ///
    /// A cached id costs zero engine calls and its record stays
    /// reference-identical across calls. A load failure leaves the cache
    /// exactly as it was.
    pub async fn get_app(&self, app_id: &str) -> Result<Vec<Arc<AppRecord>>> {
        if self.apps.contains(app_id) {
            tracing::debug!(target = "qix.app", app_id, "cache hit");
            return Ok(self.apps.snapshot());
        }

        let engine = self.engine()?;
        let record = app::load_app(engine, app_id).await?;
        self.apps.insert_front(Arc::new(record));
        Ok(self.apps.snapshot())
    }

    /// Exports a visualization's data, resolving the download URI against
    /// this deployment's endpoints.
    pub async fn export_data(
        &self,
        visualization: &Visualization,
        request: &ExportRequest,
    ) -> Result<String> {
        visualization.export_data(&self.endpoints, request).await
    }
}

impl std::fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineClient")
            .field("endpoints", &self.endpoints)
            .field("connected", &self.engine.lock().is_some())
            .finish()
    }
}
