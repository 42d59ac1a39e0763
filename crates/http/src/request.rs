//! The per-request context handed to handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, header};
use serde_json::Value;

use jetway_auth::{Credentials, Principal, PrincipalResolver};

use crate::error::ApiError;

/// Cached outcome of the one-and-only JSON parse of the body.
enum JsonSlot {
    Unparsed,
    Parsed(Value),
    Failed,
}

/// One inbound HTTP call, owned by the dispatch path for the call's
/// duration and moved through the middleware chain into the handler.
///
/// The JSON body and the principal are lazy: parsed/resolved on first
/// access and cached, so repeated access is idempotent. Nothing here is
/// shared or pooled across requests.
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    params: Vec<(String, String)>,
    body: Bytes,
    resolver: Arc<dyn PrincipalResolver>,
    json: JsonSlot,
    validated_query: Option<Value>,
    principal: Option<Principal>,
}

impl ApiRequest {
    pub fn new(
        parts: Parts,
        params: Vec<(String, String)>,
        body: Bytes,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Self {
        let query = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            query,
            params,
            body,
            resolver,
            json: JsonSlot::Unparsed,
            validated_query: None,
            principal: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decoded query-string pairs, in arrival order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Path parameter extracted by the router, e.g. `id` for `/items/:id`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body parsed as JSON. Parsing happens once; an unparseable body
    /// yields [`ApiError::MalformedBody`] on this and every later call,
    /// which dispatch renders as the terminal `Broken json` 400.
    pub fn json(&mut self) -> Result<&Value, ApiError> {
        if matches!(self.json, JsonSlot::Unparsed) {
            self.json = match serde_json::from_slice(&self.body) {
                Ok(value) => JsonSlot::Parsed(value),
                Err(err) => {
                    tracing::debug!(error = %err, "request body is not valid json");
                    JsonSlot::Failed
                }
            };
        }
        match &self.json {
            JsonSlot::Parsed(value) => Ok(value),
            _ => Err(ApiError::MalformedBody),
        }
    }

    /// Replace the handler-visible JSON document (validation middleware
    /// installs the coerced document through this).
    pub fn set_json(&mut self, value: Value) {
        self.json = JsonSlot::Parsed(value);
    }

    /// The coerced query document, present once `validate_query` has run.
    pub fn validated_query(&self) -> Option<&Value> {
        self.validated_query.as_ref()
    }

    pub fn set_validated_query(&mut self, value: Value) {
        self.validated_query = Some(value);
    }

    /// The caller's identity, resolved at most once per request via the
    /// app's [`PrincipalResolver`] and cached.
    pub async fn principal(&mut self) -> Result<&Principal, ApiError> {
        if self.principal.is_none() {
            let credentials = self.credentials();
            let principal = self
                .resolver
                .resolve(&credentials)
                .await
                .map_err(ApiError::Internal)?;
            self.principal = Some(principal);
        }
        // The slot was just filled; the fallback value is unreachable.
        Ok(self.principal.get_or_insert(Principal::Anonymous))
    }

    fn credentials(&self) -> Credentials {
        let bearer_token = self
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let cookie = self
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Credentials {
            bearer_token,
            cookie,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use jetway_auth::{NoAuth, TokenResolver, UserInfo};

    use super::*;

    fn request_with(uri: &str, body: &str, resolver: Arc<dyn PrincipalResolver>) -> ApiRequest {
        let (parts, _) = Request::builder()
            .uri(uri)
            .header("authorization", "Bearer tok-1")
            .body(())
            .expect("static request")
            .into_parts();
        ApiRequest::new(parts, Vec::new(), Bytes::from(body.to_string()), resolver)
    }

    #[test]
    fn json_parse_is_cached() {
        let mut request = request_with("/x", r#"{"foo": 1}"#, Arc::new(NoAuth));
        assert_eq!(request.json().unwrap()["foo"], 1);
        // Second access hits the cache, not the parser.
        assert_eq!(request.json().unwrap()["foo"], 1);
    }

    #[test]
    fn malformed_json_fails_every_time() {
        let mut request = request_with("/x", "bad json", Arc::new(NoAuth));
        assert!(matches!(request.json(), Err(ApiError::MalformedBody)));
        assert!(matches!(request.json(), Err(ApiError::MalformedBody)));
    }

    #[test]
    fn set_json_replaces_document() {
        let mut request = request_with("/x", r#"{"id": "1"}"#, Arc::new(NoAuth));
        request.set_json(serde_json::json!({"id": 1}));
        assert_eq!(request.json().unwrap()["id"], 1);
    }

    #[test]
    fn query_pairs_are_decoded() {
        let request = request_with("/x?id=1&name=a%20b", "", Arc::new(NoAuth));
        assert_eq!(
            request.query_pairs(),
            &[
                ("id".to_string(), "1".to_string()),
                ("name".to_string(), "a b".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn principal_resolution_is_cached() {
        let resolver = TokenResolver::new().user("tok-1", UserInfo::new("user"));
        let mut request = request_with("/x", "", Arc::new(resolver));

        assert_eq!(request.principal().await.unwrap().username(), Some("user"));
        assert_eq!(request.principal().await.unwrap().username(), Some("user"));
    }

    #[tokio::test]
    async fn missing_credentials_resolve_anonymous() {
        let resolver = TokenResolver::new().user("tok-1", UserInfo::new("user"));
        let (parts, _) = Request::builder().uri("/x").body(()).expect("static").into_parts();
        let mut request = ApiRequest::new(parts, Vec::new(), Bytes::new(), Arc::new(resolver));
        assert!(!request.principal().await.unwrap().is_authenticated());
    }
}
