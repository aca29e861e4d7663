use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::row::{Fields, Row};

/// The SQL command a statement executed, as relevant to result handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTag {
    Select,
    Insert,
    Update,
    Delete,
    Copy,
    RefreshMaterializedView,
    Unknown,
}

impl CommandTag {
    /// Derives the command from the statement's leading keywords.
    ///
    /// The underlying client does not surface the backend's command tag for
    /// row-returning statements, so the tag is recovered from the text.
    /// Statements starting with anything else (`WITH`, `VALUES`, DDL) are
    /// `Unknown`.
    pub fn from_sql_text(sql: &str) -> Self {
        let mut words = sql.split_whitespace().map(|word| word.to_ascii_uppercase());

        match words.next().as_deref() {
            Some("SELECT") => Self::Select,
            Some("INSERT") => Self::Insert,
            Some("UPDATE") => Self::Update,
            Some("DELETE") => Self::Delete,
            Some("COPY") => Self::Copy,
            Some("REFRESH")
                if words.next().as_deref() == Some("MATERIALIZED")
                    && words.next().as_deref() == Some("VIEW") =>
            {
                Self::RefreshMaterializedView
            }
            _ => Self::Unknown,
        }
    }
}

impl Display for CommandTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Copy => "COPY",
            Self::RefreshMaterializedView => "REFRESH MATERIALIZED VIEW",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// The normalized result of a single statement.
#[derive(Debug)]
pub struct QueryResult {
    pub command: CommandTag,
    pub fields: Arc<Fields>,
    /// Rows returned for row-returning statements, rows affected for DML;
    /// absent when the driver reports neither.
    pub row_count: Option<u64>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(
        command: CommandTag,
        fields: Arc<Fields>,
        row_count: Option<u64>,
        rows: Vec<Row>,
    ) -> Self {
        Self { command, fields, row_count, rows }
    }
}

/// One element of a streamed result: the fields known so far and one row.
///
/// The row description may still be empty at the time early elements are
/// produced; consumers must not assume it is populated before consumption
/// begins.
#[derive(Debug)]
pub struct StreamItem {
    pub fields: Arc<Fields>,
    pub row: Row,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_command_from_leading_keywords() {
        assert_eq!(CommandTag::from_sql_text("SELECT 1"), CommandTag::Select);
        assert_eq!(CommandTag::from_sql_text("  select *\nfrom t"), CommandTag::Select);
        assert_eq!(
            CommandTag::from_sql_text("insert into t values (1)"),
            CommandTag::Insert,
        );
        assert_eq!(CommandTag::from_sql_text("UPDATE t SET x = 1"), CommandTag::Update);
        assert_eq!(CommandTag::from_sql_text("DELETE FROM t"), CommandTag::Delete);
        assert_eq!(CommandTag::from_sql_text("COPY t TO STDOUT"), CommandTag::Copy);
    }

    #[test]
    fn refresh_materialized_view_is_matched_as_a_phrase() {
        assert_eq!(
            CommandTag::from_sql_text("REFRESH MATERIALIZED VIEW v"),
            CommandTag::RefreshMaterializedView,
        );
        // REFRESH alone is not a recognized command
        assert_eq!(CommandTag::from_sql_text("REFRESH v"), CommandTag::Unknown);
    }

    #[test]
    fn unrecognized_statements_are_unknown() {
        assert_eq!(CommandTag::from_sql_text("WITH x AS (SELECT 1) SELECT * FROM x"), CommandTag::Unknown);
        assert_eq!(CommandTag::from_sql_text(""), CommandTag::Unknown);
        assert_eq!(CommandTag::from_sql_text("CREATE TABLE t (x int)"), CommandTag::Unknown);
    }
}
