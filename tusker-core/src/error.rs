use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use crate::row::Value;

/// A boxed [`std::error::Error`] used where the concrete error type is not
/// known, e.g. type-parser failures and passthrough driver errors.
pub type BoxDynError = Box<dyn StdError + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents all the ways a method can fail within tusker.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The backend rejected a parameter value as syntactically or
    /// semantically invalid (`22P02`).
    #[error("{message}")]
    InvalidInput {
        message: String,
        #[source]
        source: BackendError,
    },

    /// The backend session died unexpectedly (`57P01`).
    #[error("backend terminated the connection unexpectedly")]
    BackendTerminated(#[source] BackendError),

    /// The statement was actively cancelled by user request (`57014` with a
    /// cancellation message).
    #[error("statement cancelled by user request")]
    StatementCancelled(#[source] BackendError),

    /// The statement exceeded its allotted time (`57014` otherwise).
    #[error("statement exceeded its configured timeout")]
    StatementTimeout(#[source] BackendError),

    /// A `NOT NULL` integrity constraint was violated (`23502`).
    #[error("query violated a not-null integrity constraint")]
    NotNullViolation(#[source] BackendError),

    /// A foreign-key integrity constraint was violated (`23503`).
    #[error("query violated a foreign-key integrity constraint")]
    ForeignKeyViolation(#[source] BackendError),

    /// A unique integrity constraint was violated (`23505`).
    #[error("query violated a unique integrity constraint")]
    UniqueViolation(#[source] BackendError),

    /// A check integrity constraint was violated (`23514`).
    #[error("query violated a check integrity constraint")]
    CheckViolation(#[source] BackendError),

    /// The statement could not be parsed by the backend (`42601`). Carries
    /// the offending statement and its bound values.
    #[error("syntax error in statement")]
    InputSyntax {
        sql: String,
        values: Vec<Value>,
        #[source]
        source: BackendError,
    },

    /// Zero rows were returned where the query method required at least one.
    #[error("query returned no rows")]
    NotFound,

    /// The result's row or column cardinality violates the query method's
    /// shape contract.
    #[error("query returned a result violating the method's shape contract")]
    DataIntegrity,

    /// A raw driver error without a backend status code (I/O, protocol,
    /// closed connection), passed through unchanged.
    #[error("driver: {0}")]
    Driver(#[source] BoxDynError),

    /// Error occurred while parsing a connection string or otherwise
    /// resolving configuration, including type-parser bring-up failures.
    #[error("configuration: {message}")]
    Configuration {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxDynError>,
    },

    /// A wire value could not be decoded into a row value.
    #[error("error decoding column {column:?}")]
    Decode {
        column: String,
        #[source]
        source: BoxDynError,
    },
}

impl Error {
    #[doc(hidden)]
    pub fn configuration(
        message: impl Into<Cow<'static, str>>,
        source: impl Into<BoxDynError>,
    ) -> Self {
        Self::Configuration { message: message.into(), source: Some(source.into()) }
    }

    #[doc(hidden)]
    pub fn configuration_msg(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration { message: message.into(), source: None }
    }

    /// Classifies a raw backend error by its status code.
    ///
    /// `sql` and `values` are the originating statement; they are retained
    /// only by the kinds whose definition carries query context. Errors with
    /// no status code, and codes outside the mapping table, pass through as
    /// [`Error::Driver`].
    pub fn from_backend(raw: BackendError, sql: &str, values: &[Value]) -> Self {
        let Some(code) = raw.code.as_deref() else {
            return Self::Driver(Box::new(raw));
        };

        match code {
            // invalid_text_representation
            "22P02" => Self::InvalidInput { message: raw.message.clone(), source: raw },

            // admin_shutdown
            "57P01" => Self::BackendTerminated(raw),

            // query_canceled: the backend uses one code for both user
            // cancellation and timer expiry; the message disambiguates.
            "57014" if raw.message.contains("canceling statement due to user request") => {
                Self::StatementCancelled(raw)
            }
            "57014" => Self::StatementTimeout(raw),

            // not_null_violation
            "23502" => Self::NotNullViolation(raw),

            // foreign_key_violation
            "23503" => Self::ForeignKeyViolation(raw),

            // unique_violation
            "23505" => Self::UniqueViolation(raw),

            // check_violation
            "23514" => Self::CheckViolation(raw),

            // syntax_error
            "42601" => {
                Self::InputSyntax { sql: sql.to_owned(), values: values.to_vec(), source: raw }
            }

            _ => Self::Driver(Box::new(raw)),
        }
    }
}

/// A structured error reported by the backend, as surfaced by the underlying
/// wire-protocol client.
#[derive(Debug, Clone)]
pub struct BackendError {
    /// SQLSTATE status code. Absent on errors raised client-side.
    pub code: Option<String>,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub constraint: Option<String>,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            detail: None,
            hint: None,
            table: None,
            column: None,
            constraint: None,
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.pad(&self.message),
        }
    }
}

impl StdError for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(code: &str, message: &str) -> BackendError {
        BackendError::new(code, message)
    }

    #[test]
    fn maps_invalid_text_representation() {
        let error = Error::from_backend(
            backend("22P02", "invalid input syntax for type integer: \"x\""),
            "SELECT $1::int4",
            &[],
        );

        match error {
            Error::InvalidInput { message, .. } => {
                assert_eq!(message, "invalid input syntax for type integer: \"x\"");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn maps_admin_shutdown() {
        let error = Error::from_backend(backend("57P01", "terminating connection"), "SELECT 1", &[]);
        assert!(matches!(error, Error::BackendTerminated(_)));
    }

    #[test]
    fn disambiguates_query_canceled_by_message() {
        let cancelled = Error::from_backend(
            backend("57014", "canceling statement due to user request"),
            "SELECT 1",
            &[],
        );
        assert!(matches!(cancelled, Error::StatementCancelled(_)));

        let timeout = Error::from_backend(
            backend("57014", "canceling statement due to statement timeout"),
            "SELECT 1",
            &[],
        );
        assert!(matches!(timeout, Error::StatementTimeout(_)));
    }

    #[test]
    fn maps_integrity_violations() {
        for (code, expect) in [
            ("23502", "not-null"),
            ("23503", "foreign-key"),
            ("23505", "unique"),
            ("23514", "check"),
        ] {
            let error = Error::from_backend(backend(code, "violation"), "INSERT INTO t VALUES (1)", &[]);
            match (code, &error) {
                ("23502", Error::NotNullViolation(_))
                | ("23503", Error::ForeignKeyViolation(_))
                | ("23505", Error::UniqueViolation(_))
                | ("23514", Error::CheckViolation(_)) => {}
                _ => panic!("code {code} ({expect}) mapped to {error:?}"),
            }
        }
    }

    #[test]
    fn syntax_error_carries_query_context() {
        let values = vec![serde_json::json!(1)];
        let error = Error::from_backend(
            backend("42601", "syntax error at or near \"SELEC\""),
            "SELEC 1",
            &values,
        );

        match error {
            Error::InputSyntax { sql, values, .. } => {
                assert_eq!(sql, "SELEC 1");
                assert_eq!(values, vec![serde_json::json!(1)]);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn unknown_code_passes_through() {
        let error = Error::from_backend(backend("0A000", "not supported"), "SELECT 1", &[]);
        assert!(matches!(error, Error::Driver(_)));
    }

    #[test]
    fn codeless_error_passes_through() {
        let raw = BackendError {
            code: None,
            message: "connection reset".into(),
            detail: None,
            hint: None,
            table: None,
            column: None,
            constraint: None,
        };

        let error = Error::from_backend(raw, "SELECT 1", &[]);
        assert!(matches!(error, Error::Driver(_)));
    }

    #[test]
    fn mapped_kinds_retain_the_raw_error_as_source() {
        let error = Error::from_backend(backend("23505", "duplicate key"), "INSERT", &[]);
        let source = StdError::source(&error).expect("source");
        assert_eq!(source.to_string(), "23505: duplicate key");
    }
}
