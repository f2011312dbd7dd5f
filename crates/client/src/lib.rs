//! Client-side orchestration over a remote QIX-style analytics engine.
//!
//! The crate connects, authenticates, opens apps and assembles their sheets,
//! measures, fields, variables and bookmarks into a cached aggregate, then
//! manages individual visualization renderings and exports. It sequences and
//! cleans up; the wire work lives in `qix-runtime` and the pixels belong to
//! whatever implements [`RenderSurface`].
//!
//! ```no_run
//! use qix::{ClientConfig, EngineClient};
//!
//! # async fn demo() -> qix::Result<()> {
//! let client = EngineClient::new(
//!     ClientConfig::new("tenant.cloud.example")
//!         .with_web_integration_id("wi-123")
//!         .with_saas(true),
//! );
//! client.bootstrap().await?;
//! client.connect().await?;
//! let me = client.authenticate().await?;
//! let apps = client.get_app("sales.qvf").await?;
//! println!("{} loaded {} sheets", me.user_id, apps[0].sheets.len());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod title;
pub mod viz;

pub use app::{AppHandle, AppRecord, Sheet, SheetObject};
pub use auth::UserIdentity;
pub use bootstrap::{BootstrapAssets, BootstrapState};
pub use client::EngineClient;
pub use config::{ClientConfig, Endpoints};
pub use error::{Error, Result};
pub use http::{HttpClient, HttpMethod, HttpResponse, ReqwestClient};
pub use title::TitleBundle;
pub use viz::{ExportRequest, RenderSurface, ShowOptions, Visualization};

pub use qix_protocol::{ExportFileType, ListKind};
pub use qix_runtime::{EngineEvent, EngineRpc};
