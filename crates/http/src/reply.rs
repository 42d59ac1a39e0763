//! Reply normalization: turning what a handler returned into a response.

use std::convert::Infallible;
use std::pin::Pin;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};

/// Boxed chunk stream; chunks are forwarded to the client verbatim, in
/// production order, without whole-body buffering.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, Infallible>> + Send + 'static>>;

/// The uniform response shape every handler return value normalizes into:
/// a payload (JSON document or chunk stream), a status, and headers.
///
/// Exactly one payload kind is active per reply; `Raw` short-circuits
/// normalization entirely and is sent as-is.
pub enum Reply {
    Json {
        body: Value,
        status: StatusCode,
        headers: HeaderMap,
    },
    Stream {
        body: ChunkStream,
        status: StatusCode,
        headers: HeaderMap,
    },
    Raw(Response),
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Json { body, status, headers } => f
                .debug_struct("Json")
                .field("body", body)
                .field("status", status)
                .field("headers", headers)
                .finish(),
            Reply::Stream { status, headers, .. } => f
                .debug_struct("Stream")
                .field("status", status)
                .field("headers", headers)
                .finish_non_exhaustive(),
            Reply::Raw(resp) => f.debug_tuple("Raw").field(resp).finish(),
        }
    }
}

impl Reply {
    /// A buffered JSON reply at 200.
    pub fn json(body: Value) -> Self {
        Reply::Json {
            body,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// A streaming reply at 200. The stream must be finite; it is consumed
    /// exactly once.
    pub fn stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Bytes>,
    {
        let body: ChunkStream =
            Box::pin(stream.map(|chunk| Ok::<Bytes, Infallible>(chunk.into())));
        Reply::Stream {
            body,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// A pre-built response, sent verbatim.
    pub fn raw(response: Response) -> Self {
        Reply::Raw(response)
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        match &mut self {
            Reply::Json { status: slot, .. } | Reply::Stream { status: slot, .. } => {
                *slot = status;
            }
            Reply::Raw(response) => *response.status_mut() = status,
        }
        self
    }

    /// Set an explicit header. Explicit headers win over the defaults
    /// applied when the reply is rendered.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) else {
            tracing::warn!("dropping invalid reply header");
            return self;
        };
        match &mut self {
            Reply::Json { headers, .. } | Reply::Stream { headers, .. } => {
                headers.insert(name, value);
            }
            Reply::Raw(response) => {
                response.headers_mut().insert(name, value);
            }
        }
        self
    }

    /// Render to an HTTP response.
    ///
    /// JSON replies default to `content-type: application/json`, streaming
    /// replies to `text/html`; explicit headers are merged in afterwards and
    /// may override either default.
    pub fn into_response(self) -> Response {
        match self {
            Reply::Json {
                body,
                status,
                headers,
            } => {
                let mut response = (status, axum::Json(body)).into_response();
                merge_headers(response.headers_mut(), &headers);
                response
            }
            Reply::Stream {
                body,
                status,
                headers,
            } => {
                let mut response = Body::from_stream(body).into_response();
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
                merge_headers(response.headers_mut(), &headers);
                response
            }
            Reply::Raw(response) => response,
        }
    }
}

fn merge_headers(target: &mut HeaderMap, explicit: &HeaderMap) {
    for (name, value) in explicit {
        target.insert(name.clone(), value.clone());
    }
}

/// Build a header map from name/value pairs, dropping invalid ones.
pub fn headers<I, K, V>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (K, V)>,
    K: TryInto<HeaderName>,
    V: TryInto<HeaderValue>,
{
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            map.insert(name, value);
        } else {
            tracing::warn!("dropping invalid header pair");
        }
    }
    map
}

/// Normalization of handler return values.
///
/// The accepted shapes mirror the handler-calling convention: a bare JSON
/// document, a `(document, status)` pair, a `(document, status, headers)`
/// triple, a [`Reply`] (how streams are expressed), or a pre-built
/// [`Response`]. Anything else is simply not a handler return type, so the
/// "malformed handler return" failure of looser runtimes is a compile error
/// here.
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        Reply::json(self)
    }
}

impl IntoReply for (Value, StatusCode) {
    fn into_reply(self) -> Reply {
        Reply::json(self.0).status(self.1)
    }
}

impl IntoReply for (Value, StatusCode, HeaderMap) {
    fn into_reply(self) -> Reply {
        let (body, status, headers) = self;
        let mut reply = Reply::json(body).status(status);
        if let Reply::Json { headers: slot, .. } = &mut reply {
            *slot = headers;
        }
        reply
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply {
        Reply::Raw(self)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::json;
    use tokio_stream::iter;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn bare_document_is_json_200() {
        let response = json!({"hello": "world"}).into_reply().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/json");
        assert_eq!(body_text(response).await, r#"{"hello":"world"}"#);
    }

    #[tokio::test]
    async fn pair_carries_status() {
        let response = (json!({"bad": "request"}), StatusCode::BAD_REQUEST)
            .into_reply()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response), "application/json");
    }

    #[tokio::test]
    async fn triple_headers_appear_verbatim() {
        let response = (
            json!({"bad": "request"}),
            StatusCode::BAD_REQUEST,
            headers([("cache-control", "no-cache")]),
        )
            .into_reply()
            .into_response();
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-cache"
        );
        assert_eq!(content_type(&response), "application/json");
    }

    #[tokio::test]
    async fn explicit_content_type_overrides_json_default() {
        let response = (
            json!({}),
            StatusCode::OK,
            headers([("content-type", "application/vnd.api+json")]),
        )
            .into_reply()
            .into_response();
        assert_eq!(content_type(&response), "application/vnd.api+json");
    }

    #[tokio::test]
    async fn stream_defaults_to_text_html_and_preserves_order() {
        let reply = Reply::stream(iter(["1,foo\n", "2,bar"]));
        let response = reply.into_reply().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/html");
        assert_eq!(body_text(response).await, "1,foo\n2,bar");
    }

    #[tokio::test]
    async fn stream_content_type_override() {
        let response = Reply::stream(iter(["x"]))
            .header("content-type", "text/csv")
            .into_response();
        assert_eq!(content_type(&response), "text/csv");
    }

    #[tokio::test]
    async fn raw_response_passes_through() {
        let raw = (StatusCode::OK, "foo").into_response();
        let response = raw.into_reply().into_response();
        assert_eq!(body_text(response).await, "foo");
    }
}
