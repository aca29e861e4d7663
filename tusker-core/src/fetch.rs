use futures_core::future::BoxFuture;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::query_id::QueryId;
use crate::query_result::QueryResult;
use crate::row::{Row, Value};

/// How many rows a query method accepts.
#[derive(Debug, Clone, Copy)]
enum RowBound {
    Any,
    AtMostOne,
    AtLeastOne,
    ExactlyOne,
}

/// The shared skeleton of every query method: run the base query, then hold
/// the result to the method's row bound.
async fn run<C>(
    conn: &mut C,
    sql: &str,
    values: &[Value],
    query_id: QueryId,
    bound: RowBound,
) -> Result<QueryResult>
where
    C: Connection + ?Sized,
{
    let result = conn.execute(sql, values).await?;

    tracing::debug!(
        target: "tusker::query",
        query_id = %query_id,
        command = %result.command,
        rows = result.rows.len(),
        "statement executed",
    );

    match bound {
        RowBound::Any => {}
        RowBound::AtMostOne if result.rows.len() > 1 => return Err(data_integrity(query_id)),
        RowBound::AtLeastOne if result.rows.is_empty() => return Err(not_found(query_id)),
        RowBound::ExactlyOne if result.rows.is_empty() => return Err(not_found(query_id)),
        RowBound::ExactlyOne if result.rows.len() > 1 => return Err(data_integrity(query_id)),
        _ => {}
    }

    Ok(result)
}

fn not_found(query_id: QueryId) -> Error {
    tracing::error!(target: "tusker::query", query_id = %query_id, "NotFoundError");

    Error::NotFound
}

fn data_integrity(query_id: QueryId) -> Error {
    tracing::error!(target: "tusker::query", query_id = %query_id, "DataIntegrityError");

    Error::DataIntegrity
}

/// Projects each row onto its first column, by field order.
///
/// The column contract is checked against the first row only; rows of one
/// result share a single row description.
fn first_column(result: QueryResult, query_id: QueryId) -> Result<Vec<Value>> {
    match result.rows.first() {
        None => return Ok(Vec::new()),
        Some(row) if row.is_empty() => {
            tracing::error!(
                target: "tusker::query",
                query_id = %query_id,
                "result row has no columns",
            );

            return Err(Error::DataIntegrity);
        }
        Some(row) if row.len() > 1 => return Err(data_integrity(query_id)),
        Some(_) => {}
    }

    Ok(result
        .rows
        .into_iter()
        .map(|row| row.into_first_value().expect("row bound to one column"))
        .collect())
}

/// The result-shape-enforcing query methods.
///
/// Every method takes the statement, its bound values, and an optionally
/// inherited [`QueryId`]; the id (inherited or fresh) tags every log record
/// the call emits. Shape violations surface as [`Error::NotFound`] and
/// [`Error::DataIntegrity`]; driver errors pass through untouched.
pub trait QueryMethods: Connection {
    /// Runs the statement with no shape expectations and returns the raw
    /// [`QueryResult`].
    fn query<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<QueryResult>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);

            run(self, sql, values, query_id, RowBound::Any).await
        })
    }

    /// Expects any number of rows.
    fn any<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Vec<Row>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);

            Ok(run(self, sql, values, query_id, RowBound::Any).await?.rows)
        })
    }

    /// Expects any number of rows of exactly one column; returns the
    /// first-column values.
    fn any_first<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Vec<Value>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let result = run(self, sql, values, query_id, RowBound::Any).await?;

            first_column(result, query_id)
        })
    }

    /// Expects at least one row.
    fn many<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Vec<Row>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);

            Ok(run(self, sql, values, query_id, RowBound::AtLeastOne).await?.rows)
        })
    }

    /// Expects at least one row of exactly one column; returns the
    /// first-column values.
    fn many_first<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Vec<Value>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let result = run(self, sql, values, query_id, RowBound::AtLeastOne).await?;

            first_column(result, query_id)
        })
    }

    /// Expects zero or one row.
    fn maybe_one<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Option<Row>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let mut result = run(self, sql, values, query_id, RowBound::AtMostOne).await?;

            Ok(result.rows.pop())
        })
    }

    /// Expects zero or one row of exactly one column.
    fn maybe_one_first<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Option<Value>>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let result = run(self, sql, values, query_id, RowBound::AtMostOne).await?;

            Ok(first_column(result, query_id)?.pop())
        })
    }

    /// Expects exactly one row.
    fn one<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Row>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let mut result = run(self, sql, values, query_id, RowBound::ExactlyOne).await?;

            Ok(result.rows.pop().expect("row bound to exactly one row"))
        })
    }

    /// Expects exactly one row of exactly one column.
    fn one_first<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
        inherited: Option<QueryId>,
    ) -> BoxFuture<'e, Result<Value>> {
        Box::pin(async move {
            let query_id = QueryId::inherit(inherited);
            let result = run(self, sql, values, query_id, RowBound::ExactlyOne).await?;

            Ok(first_column(result, query_id)?.pop().expect("row bound to exactly one row"))
        })
    }
}

impl<C: Connection + ?Sized> QueryMethods for C {}
