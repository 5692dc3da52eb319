use std::sync::Arc;

use connect_client::{AppContext, SessionHub};
use connect_db::{Database, LocalBackend};
use connect_rest::RestBackend;
use connect_types::models::Identity;
use connect_types::{Backend, BackendError, Query, Row, Table};
use uuid::Uuid;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub backend: SharedBackend,
    pub hub: SessionHub,
}

/// Process-wide backend handle, specialised per request.
pub enum SharedBackend {
    Rest(RestBackend),
    Local(Arc<Database>),
}

impl AppStateInner {
    /// A view context acting as the holder of `token` (or anonymously).
    pub fn context(&self, token: Option<&str>) -> Result<AppContext<AnyBackend>, ApiError> {
        let backend = match &self.backend {
            SharedBackend::Rest(base) => AnyBackend::Rest(base.for_session(token.map(str::to_string))),
            SharedBackend::Local(db) => match token {
                None => AnyBackend::Local(LocalBackend::new(db.clone())),
                Some(token) => {
                    let id = Uuid::parse_str(token).map_err(|_| ApiError::BadToken)?;
                    AnyBackend::Local(LocalBackend::signed_in(db.clone(), id))
                }
            },
        };
        Ok(AppContext::new(Arc::new(backend), self.hub.clone()))
    }
}

/// Either backend, chosen at startup.
pub enum AnyBackend {
    Rest(RestBackend),
    Local(LocalBackend),
}

impl Backend for AnyBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        match self {
            Self::Rest(b) => b.current_identity().await,
            Self::Local(b) => b.current_identity().await,
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        match self {
            Self::Rest(b) => b.sign_out().await,
            Self::Local(b) => b.sign_out().await,
        }
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        match self {
            Self::Rest(b) => b.select(query).await,
            Self::Local(b) => b.select(query).await,
        }
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, BackendError> {
        match self {
            Self::Rest(b) => b.insert(table, row).await,
            Self::Local(b) => b.insert(table, row).await,
        }
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, BackendError> {
        match self {
            Self::Rest(b) => b.update(table, id, patch).await,
            Self::Local(b) => b.update(table, id, patch).await,
        }
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
        match self {
            Self::Rest(b) => b.delete(table, id).await,
            Self::Local(b) => b.delete(table, id).await,
        }
    }
}
