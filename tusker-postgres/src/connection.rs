use std::sync::Arc;

use async_stream::try_stream;
use futures_core::future::BoxFuture;
use futures_core::stream::BoxStream;
use futures_util::{pin_mut, TryStreamExt};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::Statement;

use tusker_core::{
    CommandTag, Connection, Field, Fields, QueryResult, Result, StreamItem, Value,
};

use crate::decode::decode_row;
use crate::error::map_wire_error;
use crate::logger::QueryLogger;
use crate::params::to_params;
use crate::type_parsers::TypeParserRegistry;

/// One live session against the backend.
///
/// Built by [`PgDriver::connect`][crate::PgDriver::connect]; the underlying
/// client and its notice listener are owned here and released by
/// [`close`][Connection::close].
pub struct PgConnection {
    pub(crate) client: tokio_postgres::Client,
    pub(crate) registry: Arc<TypeParserRegistry>,
    pub(crate) connection_task: JoinHandle<()>,
}

impl PgConnection {
    async fn run_query(&self, sql: &str, values: &[Value]) -> Result<QueryResult> {
        let mut logger = QueryLogger::new(sql);

        let statement =
            self.client.prepare(sql).await.map_err(|error| map_wire_error(error, sql, values))?;
        let fields = Arc::new(statement_fields(&statement));

        let params = to_params(values);
        let stream = self
            .client
            .query_raw(&statement, params.iter().map(|param| param as &(dyn ToSql + Sync)))
            .await
            .map_err(|error| map_wire_error(error, sql, values))?;
        pin_mut!(stream);

        let mut rows = Vec::new();
        while let Some(row) =
            stream.try_next().await.map_err(|error| map_wire_error(error, sql, values))?
        {
            rows.push(decode_row(&self.registry, &fields, &row)?);
            logger.increment_rows_returned();
        }

        // row-returning statements report the rows seen; DML reports the
        // backend's affected count
        let row_count = if rows.is_empty() {
            stream.rows_affected()
        } else {
            Some(rows.len() as u64)
        };

        Ok(QueryResult::new(CommandTag::from_sql_text(sql), fields, row_count, rows))
    }
}

impl Connection for PgConnection {
    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
    ) -> BoxFuture<'e, Result<QueryResult>> {
        Box::pin(self.run_query(sql, values))
    }

    fn fetch<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
    ) -> BoxStream<'e, Result<StreamItem>> {
        let client = &self.client;
        let registry = &self.registry;

        Box::pin(try_stream! {
            let statement =
                client.prepare(sql).await.map_err(|error| map_wire_error(error, sql, values))?;
            let fields = Arc::new(statement_fields(&statement));

            let params = to_params(values);
            let rows = client
                .query_raw(&statement, params.iter().map(|param| param as &(dyn ToSql + Sync)))
                .await
                .map_err(|error| map_wire_error(error, sql, values))?;
            pin_mut!(rows);

            while let Some(row) =
                rows.try_next().await.map_err(|error| map_wire_error(error, sql, values))?
            {
                let row = decode_row(registry, &fields, &row)?;

                yield StreamItem { fields: Arc::clone(&fields), row };
            }
        })
    }

    fn close(self) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            let Self { client, connection_task, .. } = self;

            // dropping the client terminates the wire session; aborting the
            // pump detaches the notice listener
            drop(client);
            connection_task.abort();

            Ok(())
        })
    }
}

fn statement_fields(statement: &Statement) -> Fields {
    Fields::new(
        statement
            .columns()
            .iter()
            .map(|column| Field::new(column.name(), column.type_().oid()))
            .collect(),
    )
}
