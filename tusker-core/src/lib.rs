//! Core traits and types for the tusker PostgreSQL client.
//!
//! This crate is database-agnostic: it defines the error taxonomy, the
//! normalized result model, the client configuration, the abstract
//! [`Connection`] contract, and the result-shape-enforcing
//! [`QueryMethods`] built on top of it. The concrete driver adapter lives
//! in `tusker-postgres`.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(future_incompatible)]

mod configuration;
mod connection;
mod error;
mod fetch;
mod query_id;
mod query_result;
mod row;

pub use configuration::{ClientConfiguration, ConnectionUri, SslMode, Timeout, TypeParser};
pub use connection::Connection;
pub use error::{BackendError, BoxDynError, Error, Result};
pub use fetch::QueryMethods;
pub use query_id::QueryId;
pub use query_result::{CommandTag, QueryResult, StreamItem};
pub use row::{Field, Fields, Row, Value};

/// Convenience re-export of the traits callers are expected to have in
/// scope.
pub mod prelude {
    #[doc(no_inline)]
    pub use super::Connection as _;
    #[doc(no_inline)]
    pub use super::QueryMethods as _;
}
