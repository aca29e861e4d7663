use std::fmt::{self, Display, Formatter};

use uuid::Uuid;

/// An opaque token correlating every log record and error emitted for one
/// logical query.
///
/// Ids are unique within the process lifetime; no ordering is promised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The sole propagation policy: reuse the caller's id when one was
    /// supplied, otherwise generate a fresh one.
    pub fn inherit(inherited: Option<QueryId>) -> Self {
        inherited.unwrap_or_else(Self::new)
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QueryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
