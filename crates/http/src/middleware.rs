//! Composable wrappers around handlers: auth gates and schema validation.
//!
//! Wrappers nest at registration time and run outermost-first, so
//! composition order is whatever the registration site writes:
//!
//! ```ignore
//! app.route("/items", require_login(validate_json(schema, create_item)))
//! ```
//!
//! checks the login before touching the body, while the reverse nesting
//! validates first. There is no implicit ordering rule beyond the nesting.

use std::sync::Arc;

use jetway_schema::Schema;

use crate::error::ApiError;
use crate::handler::{Handler, HandlerFuture};
use crate::request::ApiRequest;

/// Reject anonymous callers with a 403 before the inner handler runs.
pub fn require_login<H: Handler>(inner: H) -> RequireLogin<H> {
    RequireLogin {
        inner: Arc::new(inner),
    }
}

/// Reject callers without the staff flag. Composes [`require_login`], so an
/// anonymous caller sees the login rejection, a logged-in non-staff caller
/// the staff one.
pub fn require_staff<H: Handler>(inner: H) -> RequireLogin<RequireStaff<H>> {
    require_login(RequireStaff {
        inner: Arc::new(inner),
    })
}

/// Validate and coerce the JSON body against `schema`; the inner handler
/// sees the coerced document. An empty schema means no validation.
pub fn validate_json<H: Handler>(schema: Schema, inner: H) -> ValidateJson<H> {
    ValidateJson {
        schema: Arc::new(schema.compile()),
        inner: Arc::new(inner),
    }
}

/// Validate and coerce the query string against `schema`; the coerced
/// document lands in [`ApiRequest::validated_query`]. An empty schema means
/// no validation.
pub fn validate_query<H: Handler>(schema: Schema, inner: H) -> ValidateQuery<H> {
    ValidateQuery {
        schema: Arc::new(schema.compile()),
        inner: Arc::new(inner),
    }
}

pub struct RequireLogin<H> {
    inner: Arc<H>,
}

impl<H: Handler> Handler for RequireLogin<H> {
    fn call(&self, mut request: ApiRequest) -> HandlerFuture {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let authenticated = request.principal().await?.is_authenticated();
            if !authenticated {
                tracing::debug!(path = %request.path(), "rejecting anonymous caller");
                return Err(ApiError::forbidden("You have to log in"));
            }
            inner.call(request).await
        })
    }
}

pub struct RequireStaff<H> {
    inner: Arc<H>,
}

impl<H: Handler> Handler for RequireStaff<H> {
    fn call(&self, mut request: ApiRequest) -> HandlerFuture {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let staff = request.principal().await?.is_staff();
            if !staff {
                tracing::debug!(path = %request.path(), "rejecting non-staff caller");
                return Err(ApiError::forbidden("Access denied"));
            }
            inner.call(request).await
        })
    }
}

pub struct ValidateJson<H> {
    /// Compiled once at registration; every request shares this instance.
    schema: Arc<jetway_schema::Compiled>,
    inner: Arc<H>,
}

impl<H: Handler> Handler for ValidateJson<H> {
    fn call(&self, mut request: ApiRequest) -> HandlerFuture {
        let inner = Arc::clone(&self.inner);
        let schema = Arc::clone(&self.schema);
        Box::pin(async move {
            if !schema.is_empty() {
                let document = request.json()?.clone();
                let coerced = schema.validate(&document).map_err(ApiError::validation)?;
                request.set_json(coerced);
            }
            inner.call(request).await
        })
    }
}

pub struct ValidateQuery<H> {
    schema: Arc<jetway_schema::Compiled>,
    inner: Arc<H>,
}

impl<H: Handler> Handler for ValidateQuery<H> {
    fn call(&self, mut request: ApiRequest) -> HandlerFuture {
        let inner = Arc::clone(&self.inner);
        let schema = Arc::clone(&self.schema);
        Box::pin(async move {
            if !schema.is_empty() {
                let pairs = request
                    .query_pairs()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Vec<_>>();
                let coerced = schema
                    .validate_pairs(pairs)
                    .map_err(ApiError::validation)?;
                request.set_validated_query(coerced);
            }
            inner.call(request).await
        })
    }
}
