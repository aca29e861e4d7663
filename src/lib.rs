//! tusker is a disciplined, type-aware PostgreSQL client.
//!
//! The crate pairs a driver adapter over `tokio-postgres` with a family of
//! result-shape-enforcing query methods: each method states how many rows
//! and columns it expects and fails with a precise error kind when the
//! result disagrees.
//!
//! ```rust,no_run
//! use tusker::{ClientConfiguration, NoticeSink, PgDriver, QueryMethods as _};
//!
//! # async fn example() -> tusker::Result<()> {
//! let configuration = ClientConfiguration::new("postgres://postgres@localhost/app")?;
//! let driver = PgDriver::new(&configuration, NoticeSink::log())?;
//!
//! let mut conn = driver.connect().await?;
//!
//! // exactly one row of exactly one column, or a structured error
//! let count = conn.one_first("SELECT count(*) FROM users", &[], None).await?;
//! println!("{count}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub use tusker_core::{
    BackendError, BoxDynError, ClientConfiguration, CommandTag, Connection, ConnectionUri, Error,
    Field, Fields, QueryId, QueryMethods, QueryResult, Result, Row, SslMode, StreamItem, Timeout,
    TypeParser, Value,
};
pub use tusker_postgres::{Notice, NoticeSink, PgConnection, PgDriver};

#[doc(no_inline)]
pub use tusker_core::prelude;
