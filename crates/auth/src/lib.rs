//! `jetway-auth` — principal model and the resolver seam toward the host's
//! session/credential state.
//!
//! This crate is intentionally decoupled from HTTP: it sees only extracted
//! credential material, never headers or sockets. Who actually owns user
//! records (a session store, a token service, a database) is the embedding
//! application's business, reached through [`PrincipalResolver`].

pub mod principal;
pub mod resolver;

pub use principal::{Principal, UserId, UserInfo};
pub use resolver::{Credentials, NoAuth, PrincipalResolver, TokenResolver};
