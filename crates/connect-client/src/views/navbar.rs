use connect_types::events::IdentityChange;
use connect_types::{Backend, BackendError};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::context::AppContext;
use crate::routes::{self, NavItem, Route};
use crate::session::{self, Session};
use crate::view::ViewScope;

#[derive(Debug, Clone, Serialize)]
pub struct NavSnapshot {
    pub items: Vec<NavItem>,
    pub display_name: Option<String>,
    pub signed_in: bool,
}

/// Navigation bar: follows identity changes for as long as it lives.
pub struct Navbar<B> {
    ctx: AppContext<B>,
    scope: ViewScope,
    session: Mutex<Session>,
}

impl<B: Backend> Navbar<B> {
    pub async fn open(ctx: &AppContext<B>) -> Self {
        // Subscribe first so a change during the initial lookup is not missed.
        let scope = ViewScope::open(ctx.hub(), None);
        let session = ctx.session().await;
        Self {
            ctx: ctx.clone(),
            scope,
            session: Mutex::new(session),
        }
    }

    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    pub fn items(&self) -> Vec<NavItem> {
        routes::nav_items(&self.session.lock())
    }

    pub fn display_name(&self) -> Option<String> {
        self.session.lock().display_name()
    }

    /// Applies pending identity changes that concern this navbar's user
    /// (or a sign-in, while anonymous), loading the new user's profile.
    /// Returns whether anything changed.
    pub async fn sync(&self) -> bool {
        let mut current = self.session.lock().identity().map(|i| i.id);
        let mut next = None;
        for change in self.scope.poll_changes() {
            let applies = match current {
                Some(id) => change.subject() == id,
                None => matches!(change, IdentityChange::SignedIn { .. }),
            };
            if applies {
                current = change.identity().map(|i| i.id);
                next = Some(change);
            }
        }
        let Some(change) = next else {
            return false;
        };
        debug!("Navbar observed {:?}", change);
        let session = session::session_for(self.ctx.backend(), change.identity().cloned()).await;
        if !self.scope.is_live() {
            return false;
        }
        *self.session.lock() = session;
        true
    }

    pub async fn sign_out(&self) -> Result<Route, BackendError> {
        let route = self.ctx.sign_out().await?;
        *self.session.lock() = Session::Anonymous;
        Ok(route)
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn snapshot(&self) -> NavSnapshot {
        let session = self.session.lock();
        NavSnapshot {
            items: routes::nav_items(&session),
            display_name: session.display_name(),
            signed_in: session.is_signed_in(),
        }
    }
}
