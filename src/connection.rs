//! Connection seam used by statements
//!
//! The statement core does not talk to the network itself. A [`Connection`]
//! receives the serialized execute request and answers with a [`ResultSet`]
//! handle or an error. Transport, pooling and authentication live behind
//! this trait.

use bytes::Bytes;

use crate::error::Result;

/// Handle to an open result produced by one execution
///
/// Rows are not decoded here; the handle only identifies the server-side
/// cursor so it can be released again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultSet {
    /// Server-side cursor id
    pub cursor_id: u32,
    /// Rows inserted, updated or deleted (0 for queries)
    pub rows_affected: u64,
    /// Whether the result has rows to fetch
    pub has_rows: bool,
}

impl ResultSet {
    /// A result for a query with rows to fetch
    pub fn query(cursor_id: u32) -> Self {
        Self {
            cursor_id,
            rows_affected: 0,
            has_rows: true,
        }
    }

    /// A result for a statement that only reports an update count
    pub fn update_count(cursor_id: u32, rows_affected: u64) -> Self {
        Self {
            cursor_id,
            rows_affected,
            has_rows: false,
        }
    }
}

/// A database connection able to execute serialized requests
///
/// Implementations must tolerate several statements issuing requests; a
/// single statement never has more than one request in flight.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use edb_rs::{Connection, ResultSet, Result};
///
/// struct Loopback;
///
/// #[async_trait::async_trait]
/// impl Connection for Loopback {
///     async fn execute(&self, _request: Bytes) -> Result<ResultSet> {
///         Ok(ResultSet::update_count(1, 0))
///     }
///
///     fn close_result(&self, _result: &ResultSet) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Execute a serialized request and return the produced result
    async fn execute(&self, request: Bytes) -> Result<ResultSet>;

    /// Release a result previously returned by [`execute`](Self::execute)
    fn close_result(&self, result: &ResultSet) -> Result<()>;
}
