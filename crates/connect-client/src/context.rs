use std::sync::Arc;

use connect_types::{Backend, BackendError};

use crate::routes::Route;
use crate::session::{self, Session, SessionHub};

/// What every view is opened with: the backend acting for the current user
/// and the hub that announces identity changes.
pub struct AppContext<B> {
    backend: Arc<B>,
    hub: SessionHub,
}

impl<B> Clone for AppContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            hub: self.hub.clone(),
        }
    }
}

impl<B: Backend> AppContext<B> {
    pub fn new(backend: Arc<B>, hub: SessionHub) -> Self {
        Self { backend, hub }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// Fresh session snapshot: identity plus profile.
    pub async fn session(&self) -> Session {
        session::resolve_session(self.backend()).await
    }

    /// Ends the session and tells every subscriber. The caller navigates home.
    pub async fn sign_out(&self) -> Result<Route, BackendError> {
        self.hub.sign_out(self.backend()).await?;
        Ok(Route::Home)
    }
}
