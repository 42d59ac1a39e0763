//! `jetway-schema` — declarative validation schemas for JSON bodies and
//! query strings.
//!
//! A [`Schema`] is built once (typically at route-registration time),
//! compiled, and then shared read-only across every request to that route.
//! Validation both checks and coerces: a query-string `"1"` against a
//! [`Kind::Int`] field comes back as the JSON number `1`.
//!
//! This crate is intentionally decoupled from HTTP; it only speaks
//! `serde_json` values and string pairs.

pub mod errors;
pub mod schema;

pub use errors::FieldErrors;
pub use schema::{Compiled, Kind, Schema};
