//! `jetway-http` — plug plain async handler functions into an axum pipeline.
//!
//! A jetway handler is any `async fn(ApiRequest) -> Result<R, ApiError>`
//! where `R` normalizes into a [`Reply`]: a bare JSON document (200), a
//! `(document, status)` pair, a `(document, status, headers)` triple, a
//! chunk stream, or a pre-built response passed through verbatim.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jetway_auth::TokenResolver;
//! use jetway_http::middleware::require_login;
//! use jetway_http::{ApiError, ApiRequest, App, AppConfig};
//! use serde_json::{Value, json};
//!
//! async fn hello(_request: ApiRequest) -> Result<Value, ApiError> {
//!     Ok(json!({"hello": "world"}))
//! }
//!
//! let router = App::new(AppConfig::from_env())
//!     .resolver(Arc::new(TokenResolver::new()))
//!     .route("/hello", hello)
//!     .route("/private", require_login(hello))
//!     .into_router();
//! # let _ = router;
//! ```
//!
//! Routing itself (pattern matching, path parameters) is axum's; this crate
//! owns what happens between a matched route and the response bytes.

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod reply;
pub mod request;

pub use app::App;
pub use config::{AppConfig, Mode};
pub use error::ApiError;
pub use handler::{BoxHandler, Handler};
pub use reply::{IntoReply, Reply, headers};
pub use request::ApiRequest;
