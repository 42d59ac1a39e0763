//! Minimal wiring sample: a public route, a streaming route, a login-gated
//! route, and a validated query route, served on 0.0.0.0:8080.
//!
//! Try it with `JETWAY_MODE=debug cargo run --example demo`.

use std::sync::Arc;
use std::time::Duration;

use jetway_auth::{TokenResolver, UserInfo};
use jetway_http::middleware::{require_login, validate_query};
use jetway_http::{ApiError, ApiRequest, App, AppConfig, Reply};
use jetway_schema::{Kind, Schema};
use serde_json::{Value, json};
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;

async fn hello(_request: ApiRequest) -> Result<Value, ApiError> {
    Ok(json!({"hello": "world"}))
}

async fn whoami(mut request: ApiRequest) -> Result<Value, ApiError> {
    Ok(json!({"user": request.principal().await?.username()}))
}

async fn countdown(_request: ApiRequest) -> Result<Reply, ApiError> {
    let (tx, rx) = unbounded_channel();
    tokio::spawn(async move {
        for n in (1..=3).rev() {
            if tx.send(format!("{n}\n")).is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    });
    Ok(Reply::stream(UnboundedReceiverStream::new(rx)).header("content-type", "text/plain"))
}

async fn lookup(request: ApiRequest) -> Result<Value, ApiError> {
    Ok(request.validated_query().cloned().unwrap_or(json!({})))
}

#[tokio::main]
async fn main() {
    jetway_observability::init();

    let resolver = TokenResolver::new().user("dev-token", UserInfo::staff("dev"));

    let router = App::new(AppConfig::from_env())
        .resolver(Arc::new(resolver))
        .route("/hello", hello)
        .route("/whoami", require_login(whoami))
        .route("/countdown", countdown)
        .route(
            "/lookup",
            validate_query(Schema::new().field("id", Kind::Int), lookup),
        )
        .into_router();

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, router).await.unwrap();
}
