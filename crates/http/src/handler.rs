//! The handler-calling convention.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ApiError;
use crate::reply::{IntoReply, Reply};
use crate::request::ApiRequest;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, ApiError>> + Send + 'static>>;

/// An application-supplied route endpoint.
///
/// Implemented for free by any `async fn(ApiRequest) -> Result<R, ApiError>`
/// with `R: IntoReply`, which is how handlers are normally written; the
/// middleware combinators implement it too, so wrapped and bare handlers
/// register identically.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: ApiRequest) -> HandlerFuture;
}

/// A shared, type-erased handler as stored in the route table.
pub type BoxHandler = Arc<dyn Handler>;

impl<F, Fut, R> Handler for F
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
    R: IntoReply,
{
    fn call(&self, request: ApiRequest) -> HandlerFuture {
        let future = self(request);
        Box::pin(async move { future.await.map(IntoReply::into_reply) })
    }
}
