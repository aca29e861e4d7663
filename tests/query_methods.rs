//! Exercises the public shape-method surface against an in-memory
//! connection.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::json;

use tusker::{
    CommandTag, Connection, Error, Field, Fields, QueryId, QueryMethods as _, QueryResult, Result,
    Row, StreamItem, Value,
};

struct StubConnection {
    results: VecDeque<Result<QueryResult>>,
    statements: Vec<String>,
}

impl StubConnection {
    fn returning(result: Result<QueryResult>) -> Self {
        Self { results: VecDeque::from([result]), statements: Vec::new() }
    }
}

impl Connection for StubConnection {
    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        _values: &'e [Value],
    ) -> BoxFuture<'e, Result<QueryResult>> {
        self.statements.push(sql.to_owned());
        let result = self.results.pop_front().expect("unexpected statement");

        Box::pin(async move { result })
    }

    fn fetch<'e>(
        &'e mut self,
        _sql: &'e str,
        _values: &'e [Value],
    ) -> BoxStream<'e, Result<StreamItem>> {
        Box::pin(futures_util::stream::empty())
    }

    fn close(self) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

fn select(names: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    let fields =
        Arc::new(Fields::new(names.iter().map(|name| Field::new(*name, 25)).collect()));
    let row_count = Some(rows.len() as u64);
    let rows: Vec<Row> =
        rows.into_iter().map(|values| Row::new(Arc::clone(&fields), values)).collect();

    QueryResult::new(CommandTag::Select, fields, row_count, rows)
}

#[tokio::test]
async fn a_full_round_trip_through_the_facade() {
    let mut conn = StubConnection::returning(Ok(select(
        &["id", "name"],
        vec![vec![json!(7), json!("ada")]],
    )));

    let row = conn.one("SELECT id, name FROM users WHERE id = $1", &[json!(7)], None).await.unwrap();

    assert_eq!(row.get("id"), Some(&json!(7)));
    assert_eq!(row.get("name"), Some(&json!("ada")));
    assert_eq!(conn.statements, vec!["SELECT id, name FROM users WHERE id = $1"]);
}

#[tokio::test]
async fn shape_violations_surface_as_precise_kinds() {
    let mut conn = StubConnection::returning(Ok(select(&["id"], vec![])));
    assert!(matches!(conn.one("SELECT 1", &[], None).await, Err(Error::NotFound)));

    let mut conn =
        StubConnection::returning(Ok(select(&["id"], vec![vec![json!(1)], vec![json!(2)]])));
    assert!(matches!(conn.maybe_one("SELECT 1", &[], None).await, Err(Error::DataIntegrity)));
}

#[tokio::test]
async fn first_column_projection_uses_field_order() {
    let mut conn =
        StubConnection::returning(Ok(select(&["value"], vec![vec![json!(3)], vec![json!(1)]])));

    let values = conn.many_first("SELECT value FROM t", &[], None).await.unwrap();

    assert_eq!(values, vec![json!(3), json!(1)]);
}

#[tokio::test]
async fn inherited_query_ids_are_reused_verbatim() {
    let inherited = QueryId::new();
    assert_eq!(QueryId::inherit(Some(inherited)), inherited);

    let mut conn = StubConnection::returning(Ok(select(&["id"], vec![vec![json!(1)]])));
    let result = conn.query("SELECT 1", &[], Some(inherited)).await.unwrap();

    assert_eq!(result.rows.len(), 1);
}
