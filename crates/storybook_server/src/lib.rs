//! HTTP surface for the storybook service.
//!
//! - [`AppConfig`] layers bundled defaults, an optional TOML file and
//!   `STORYBOOK__*` environment variables
//! - [`router`] maps the REST routes onto the domain services
//! - [`CurrentUser`] authenticates each request through a [`TokenVerifier`](storybook_interface::TokenVerifier),
//!   in production a [`JwksVerifier`]
//! - [`AppError`] renders failures as `{"error": {"class", "message"}}` with
//!   the status code of their error class
//!
//! # Example
//!
//! ```no_run
//! use storybook_server::{AppConfig, serve};
//!
//! # async fn run() -> storybook_error::StorybookResult<()> {
//! let config = AppConfig::load(None)?;
//! serve(config).await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod observability;
mod routes;
mod server;
mod state;

pub use auth::{CurrentUser, JwksVerifier};
pub use config::{
    AppConfig, AuthSettings, DatabaseSettings, EndpointSettings, ObservabilitySettings,
    OracleSettings, ServerSettings, StorageSettings,
};
pub use error::AppError;
pub use observability::{Telemetry, init_telemetry};
pub use routes::{
    AppJson, CharacterListParams, ChatRequest, ExploreParams, ImagePromptsResponse, ListParams,
    PageCountResponse, RewriteRequest, RewriteTextRequest, RewriteTextResponse, TitleBody,
    VisibilityRequest, router,
};
pub use server::{build_state, serve};
pub use state::AppState;
