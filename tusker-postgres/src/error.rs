use tokio_postgres::error::DbError;

use tusker_core::{BackendError, Error, Value};

/// Classifies a raw wire-client error against the originating statement.
///
/// Errors reported by the backend carry a SQLSTATE code and go through the
/// taxonomy mapper; client-side errors (I/O, protocol, closed connection)
/// have no code and pass through unchanged.
pub(crate) fn map_wire_error(error: tokio_postgres::Error, sql: &str, values: &[Value]) -> Error {
    match error.as_db_error() {
        Some(db_error) => Error::from_backend(backend_error(db_error), sql, values),
        None => Error::Driver(Box::new(error)),
    }
}

fn backend_error(raw: &DbError) -> BackendError {
    BackendError {
        code: Some(raw.code().code().to_owned()),
        message: raw.message().to_owned(),
        detail: raw.detail().map(str::to_owned),
        hint: raw.hint().map(str::to_owned),
        table: raw.table().map(str::to_owned),
        column: raw.column().map(str::to_owned),
        constraint: raw.constraint().map(str::to_owned),
    }
}
