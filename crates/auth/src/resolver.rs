//! The resolver seam: how a request's credential material becomes a
//! [`Principal`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::principal::{Principal, UserInfo};

/// Credential material extracted from the transport layer.
///
/// The adapter fills this from headers; resolvers never see the request
/// itself. Both slots absent simply means an anonymous caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// `Authorization: Bearer <token>` payload, if present.
    pub bearer_token: Option<String>,
    /// Raw `Cookie` header, for session-cookie deployments.
    pub cookie: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            cookie: None,
        }
    }
}

/// Resolves the caller identity from credential material.
///
/// Implementations are supplied by the embedding application (session store,
/// token service, ...). Resolution runs at most once per request; the
/// adapter caches the result, so implementations must be side-effect-free
/// on repeated calls with the same input but need not memoize themselves.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Resolve the principal. "Not logged in" is `Ok(Principal::Anonymous)`,
    /// not an error; `Err` means the backing store itself failed.
    async fn resolve(&self, credentials: &Credentials) -> anyhow::Result<Principal>;
}

/// Resolver for deployments without authentication: every caller is
/// anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl PrincipalResolver for NoAuth {
    async fn resolve(&self, _credentials: &Credentials) -> anyhow::Result<Principal> {
        Ok(Principal::Anonymous)
    }
}

/// Bearer-token lookup against a fixed, process-wide table.
///
/// Suited to service-to-service tokens and to tests; anything needing
/// revocation or expiry should implement [`PrincipalResolver`] against its
/// own store instead.
#[derive(Debug, Clone, Default)]
pub struct TokenResolver {
    users: HashMap<String, UserInfo>,
}

impl TokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as authenticating `user`.
    pub fn user(mut self, token: impl Into<String>, user: UserInfo) -> Self {
        self.users.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl PrincipalResolver for TokenResolver {
    async fn resolve(&self, credentials: &Credentials) -> anyhow::Result<Principal> {
        let principal = credentials
            .bearer_token
            .as_deref()
            .and_then(|token| self.users.get(token))
            .map(|user| Principal::User(user.clone()))
            .unwrap_or(Principal::Anonymous);

        if let Principal::User(user) = &principal {
            tracing::debug!(username = %user.username, "resolved principal");
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_auth_always_anonymous() {
        let principal = NoAuth
            .resolve(&Credentials::bearer("anything"))
            .await
            .unwrap();
        assert_eq!(principal, Principal::Anonymous);
    }

    #[tokio::test]
    async fn token_resolver_matches_registered_token() {
        let resolver = TokenResolver::new().user("tok-1", UserInfo::new("user"));

        let principal = resolver.resolve(&Credentials::bearer("tok-1")).await.unwrap();
        assert_eq!(principal.username(), Some("user"));

        let principal = resolver.resolve(&Credentials::bearer("nope")).await.unwrap();
        assert_eq!(principal, Principal::Anonymous);

        let principal = resolver.resolve(&Credentials::anonymous()).await.unwrap();
        assert_eq!(principal, Principal::Anonymous);
    }
}
