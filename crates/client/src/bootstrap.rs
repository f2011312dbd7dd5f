//! Process-wide, idempotent loading of the engine client runtime assets.
//!
//! The runtime script and its stylesheet must be present exactly once before
//! anything talks to the engine. Instead of ambient global state guarded by
//! a presence check, the guard is an explicitly passed [`BootstrapState`]:
//! the first successful `bootstrap` fills it, every later call is a no-op,
//! and a failed attempt leaves it empty so the caller may try again.

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Paths of the runtime assets below `base_url`.
const RUNTIME_SCRIPT: &str = "js/qix.js";
const RUNTIME_STYLESHEET: &str = "autogenerated/qix-styles.css";

/// The fetched runtime assets, handed to the presentation layer as-is.
#[derive(Debug, Clone)]
pub struct BootstrapAssets {
    pub script: Vec<u8>,
    pub stylesheet: Vec<u8>,
}

/// Init-once holder for the bootstrap assets.
///
/// The async mutex serializes concurrent bootstrap attempts, so at most one
/// load sequence is ever in flight.
#[derive(Default)]
pub struct BootstrapState {
    assets: Mutex<Option<BootstrapAssets>>,
}

impl BootstrapState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads script and stylesheet unless both are already present.
    ///
    /// Completes only after both resources loaded; the first failure is
    /// surfaced and nothing is stored.
    pub async fn bootstrap(&self, http: &dyn HttpClient, base_url: &str) -> Result<()> {
        let mut slot = self.assets.lock().await;
        if slot.is_some() {
            tracing::debug!(target = "qix.bootstrap", "runtime already loaded");
            return Ok(());
        }

        let script_url = format!("{base_url}/{RUNTIME_SCRIPT}");
        let style_url = format!("{base_url}/{RUNTIME_STYLESHEET}");

        let (script, stylesheet) = tokio::try_join!(
            fetch_asset(http, &script_url),
            fetch_asset(http, &style_url),
        )?;

        tracing::debug!(
            target = "qix.bootstrap",
            script_bytes = script.len(),
            stylesheet_bytes = stylesheet.len(),
            "engine runtime loaded"
        );
        *slot = Some(BootstrapAssets { script, stylesheet });
        Ok(())
    }

    /// Whether a bootstrap has completed successfully.
    pub async fn is_ready(&self) -> bool {
        self.assets.lock().await.is_some()
    }

    /// The loaded assets, once ready.
    pub async fn assets(&self) -> Option<BootstrapAssets> {
        self.assets.lock().await.clone()
    }
}

async fn fetch_asset(http: &dyn HttpClient, url: &str) -> Result<Vec<u8>> {
    http.fetch_bytes(url)
        .await
        .map_err(|error| Error::Bootstrap(format!("{url}: {error}")))
}
