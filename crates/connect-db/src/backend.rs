use std::sync::Arc;

use connect_types::models::Identity;
use connect_types::{Backend, BackendError, Query, Row, Table};
use parking_lot::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::Database;

/// [`Backend`] over the local database, acting as one signed-in user.
pub struct LocalBackend {
    db: Arc<Database>,
    session: RwLock<Option<Uuid>>,
}

impl LocalBackend {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            session: RwLock::new(None),
        }
    }

    pub fn signed_in(db: Arc<Database>, user_id: Uuid) -> Self {
        Self {
            db,
            session: RwLock::new(Some(user_id)),
        }
    }

    pub fn sign_in(&self, user_id: Uuid) {
        *self.session.write() = Some(user_id);
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn actor(&self) -> Option<Uuid> {
        *self.session.read()
    }

    /// Runs blocking DB work off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T, BackendError>
    where
        F: FnOnce(&Database, Option<Uuid>) -> Result<T, BackendError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let actor = self.actor();
        tokio::task::spawn_blocking(move || f(&db, actor))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                BackendError::Storage(e.to_string())
            })?
    }
}

impl Backend for LocalBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        match self.actor() {
            Some(id) => self.run(move |db, _| db.get_identity(id)).await,
            None => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if let Some(id) = self.session.write().take() {
            info!("{} signed out", id);
        }
        Ok(())
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        let query = query.clone();
        self.run(move |db, actor| db.select(actor, &query)).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, BackendError> {
        self.run(move |db, actor| db.insert(actor, table, row)).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, BackendError> {
        self.run(move |db, actor| db.update(actor, table, id, patch)).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
        self.run(move |db, actor| db.delete(actor, table, id)).await
    }
}
