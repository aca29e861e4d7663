use futures_core::future::BoxFuture;
use futures_core::stream::BoxStream;

use crate::error::Result;
use crate::query_result::{QueryResult, StreamItem};
use crate::row::Value;

/// The abstract connection contract implemented by driver adapters.
///
/// A connection owns one underlying client session. Taking `&mut self` on
/// every operation guarantees first-in-first-out execution within a
/// connection; no ordering is promised across connections.
pub trait Connection: Send {
    /// Runs a single statement and awaits its full, normalized result.
    ///
    /// Raw backend errors are classified by status code before they reach
    /// the caller; errors without a code pass through unchanged.
    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
    ) -> BoxFuture<'e, Result<QueryResult>>;

    /// Opens a streaming cursor over the statement's result.
    ///
    /// The returned stream is lazy, ordered, finite, and non-restartable.
    /// Each element carries the row description known at emission time; raw
    /// errors surface, classified, as stream items.
    fn fetch<'e>(
        &'e mut self,
        sql: &'e str,
        values: &'e [Value],
    ) -> BoxStream<'e, Result<StreamItem>>;

    /// Releases the underlying client and detaches its listeners.
    fn close(self) -> BoxFuture<'static, Result<()>>
    where
        Self: Sized;
}
