use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Identity;
use crate::query::{Query, Row, Table};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BackendError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("rejected by row-level policy: {0}")]
    PolicyViolation(String),

    #[error("no {table} row {id} was affected")]
    NoRowsAffected { table: Table, id: Uuid },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed row: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// The remote data store and auth service.
///
/// Every call is a round trip; authorization is enforced on the other side
/// by row-level policy, so implementations act as the signed-in user they
/// were built for. Futures are `Send` so views can be driven from a
/// multi-threaded runtime.
pub trait Backend: Send + Sync {
    /// The identity attached to this session, or `None` when signed out.
    fn current_identity(&self) -> impl Future<Output = Result<Option<Identity>, BackendError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Row>, BackendError>> + Send;

    /// Inserts one row and returns it as stored (with generated id and timestamps).
    fn insert(&self, table: Table, row: Row) -> impl Future<Output = Result<Row, BackendError>> + Send;

    /// Updates the row with this primary key and returns it as stored.
    /// A row that does not exist or is hidden by policy is `NoRowsAffected`.
    fn update(
        &self,
        table: Table,
        id: Uuid,
        patch: Row,
    ) -> impl Future<Output = Result<Row, BackendError>> + Send;

    fn delete(&self, table: Table, id: Uuid) -> impl Future<Output = Result<(), BackendError>> + Send;
}
