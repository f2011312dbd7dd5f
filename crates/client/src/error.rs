//! Error taxonomy of the orchestration layer.
//!
//! Every failure is surfaced to the immediate caller as one of these
//! variants; nothing is retried internally. Retry and backoff policy belong
//! to the consumer.

use qix_protocol::ListKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine runtime script or stylesheet failed to load.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// The engine socket could not be established, or was used out of order.
    #[error("engine connection failed: {0}")]
    Connect(String),

    /// The repository who-am-I call failed or returned a malformed identity.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The app never reached its open state.
    #[error("app {app_id} failed to open")]
    Open {
        app_id: String,
        #[source]
        source: qix_runtime::Error,
    },

    /// A session-scoped list fetch failed at create, read or destroy.
    #[error("{kind} list fetch failed")]
    ListFetch {
        kind: ListKind,
        #[source]
        source: Box<Error>,
    },

    /// A visualization data export failed or was attempted re-entrantly.
    #[error("export failed: {0}")]
    Export(String),

    /// An engine call failed below the orchestration layer.
    #[error(transparent)]
    Engine(#[from] qix_runtime::Error),

    /// An HTTP call returned a non-success status or never completed.
    #[error("http request failed: {0}")]
    Http(String),

    /// The engine answered with a payload the client cannot interpret.
    #[error("unexpected engine payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Payload(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
