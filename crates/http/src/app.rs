//! Route registration and per-request dispatch.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{RawPathParams, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::json;

use jetway_auth::{NoAuth, PrincipalResolver};

use crate::config::AppConfig;
use crate::handler::{BoxHandler, Handler};
use crate::request::ApiRequest;

/// Registration surface for jetway handlers.
///
/// Routes are registered once at startup; the resulting [`Router`] owns an
/// immutable route table, and every request runs as its own tokio task with
/// no shared mutable state beyond the `Arc`'d config and resolver.
pub struct App {
    config: AppConfig,
    resolver: Arc<dyn PrincipalResolver>,
    routes: Vec<(String, BoxHandler)>,
}

struct Shared {
    config: AppConfig,
    resolver: Arc<dyn PrincipalResolver>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(NoAuth),
            routes: Vec::new(),
        }
    }

    /// Install the principal resolver (defaults to [`NoAuth`]).
    pub fn resolver(mut self, resolver: Arc<dyn PrincipalResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register `handler` for `path` (axum pattern syntax, e.g.
    /// `/items/:id`). All methods dispatch to the same handler.
    pub fn route(mut self, path: &str, handler: impl Handler) -> Self {
        self.routes.push((path.to_string(), Arc::new(handler)));
        self
    }

    /// Build the axum router. Unmatched paths get the fixed
    /// `{"error": "Page not found"}` 404 payload, whatever the method.
    pub fn into_router(self) -> Router {
        let shared = Arc::new(Shared {
            config: self.config,
            resolver: self.resolver,
        });

        let mut router = Router::new();
        for (path, handler) in self.routes {
            let shared = Arc::clone(&shared);
            let endpoint = move |params: RawPathParams, request: Request| {
                let shared = Arc::clone(&shared);
                let handler = Arc::clone(&handler);
                async move { dispatch(shared, handler, params, request).await }
            };
            router = router.route(&path, any(endpoint));
        }

        router.fallback(not_found)
    }
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({"error": "Page not found"})),
    )
        .into_response()
}

#[derive(Debug)]
enum BodyFailure {
    /// The client took too long to deliver its body.
    Timeout,
    /// The body exceeds `config.body_limit`.
    TooLarge,
    /// The transport gave up mid-read (client disconnect or malformed
    /// framing). The connection is unusable, so there is nothing to say.
    Aborted,
}

async fn collect_body(config: &AppConfig, body: Body) -> Result<Bytes, BodyFailure> {
    let limited = Limited::new(body, config.body_limit);
    match tokio::time::timeout(config.read_timeout, limited.collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(err)) if err.is::<LengthLimitError>() => {
            tracing::debug!(limit = config.body_limit, "request body over limit");
            Err(BodyFailure::TooLarge)
        }
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "request body read failed");
            Err(BodyFailure::Aborted)
        }
        Err(_elapsed) => Err(BodyFailure::Timeout),
    }
}

/// One request, start to finish: receive the body, build the request
/// context, run the handler chain, render whatever came back.
async fn dispatch(
    shared: Arc<Shared>,
    handler: BoxHandler,
    params: RawPathParams,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let body = match collect_body(&shared.config, body).await {
        Ok(bytes) => bytes,
        Err(BodyFailure::Timeout) => {
            return (
                StatusCode::REQUEST_TIMEOUT,
                "408 Request Timeout (upload too slow)",
            )
                .into_response();
        }
        Err(BodyFailure::TooLarge) => {
            return StatusCode::BAD_REQUEST.into_response();
        }
        Err(BodyFailure::Aborted) => {
            // The client already severed the connection; this response is
            // never written.
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let params = params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let request = ApiRequest::new(parts, params, body, Arc::clone(&shared.resolver));

    match handler.call(request).await {
        Ok(reply) => reply.into_response(),
        Err(error) => error.into_response(shared.config.mode),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_collected() {
        let config = AppConfig::default().body_limit(64);
        let bytes = collect_body(&config, Body::from("hello")).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn over_limit_body_is_too_large_not_aborted() {
        let config = AppConfig::default().body_limit(8);
        let outcome = collect_body(&config, Body::from(vec![b'x'; 64])).await;
        assert!(matches!(outcome, Err(BodyFailure::TooLarge)));
    }

    #[tokio::test]
    async fn stalled_body_is_a_timeout() {
        let config = AppConfig::default().read_timeout(Duration::from_millis(20));
        let body = Body::from_stream(tokio_stream::pending::<Result<Bytes, Infallible>>());
        let outcome = collect_body(&config, body).await;
        assert!(matches!(outcome, Err(BodyFailure::Timeout)));
    }
}
