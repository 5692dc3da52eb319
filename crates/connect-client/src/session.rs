use connect_types::events::IdentityChange;
use connect_types::models::{self, Identity, Profile, Role};
use connect_types::{Backend, BackendError};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::profile;

/// Identity snapshot for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    Anonymous,
    SignedIn {
        identity: Identity,
        profile: ProfileState,
    },
}

/// Result of loading the signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "profile", rename_all = "snake_case")]
pub enum ProfileState {
    Ready(Profile),
    /// Signed in, but no profile row exists yet.
    NotSetUp,
    /// The profile could not be read.
    Unavailable,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::SignedIn { identity, .. } => Some(identity),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::SignedIn {
                profile: ProfileState::Ready(profile),
                ..
            } => Some(profile),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.profile().map(Profile::role)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn display_name(&self) -> Option<String> {
        let identity = self.identity()?;
        Some(models::display_name(self.profile(), identity.email.as_deref()))
    }
}

/// Asks the backend who is signed in, then loads their profile.
///
/// A failed identity lookup is treated as signed out.
pub async fn resolve_session<B: Backend>(backend: &B) -> Session {
    match backend.current_identity().await {
        Ok(identity) => session_for(backend, identity).await,
        Err(e) => {
            warn!("Identity lookup failed, continuing signed out: {}", e);
            Session::Anonymous
        }
    }
}

/// Builds a session for an identity already known, e.g. from an
/// [`IdentityChange`], without asking the auth service again.
pub async fn session_for<B: Backend>(backend: &B, identity: Option<Identity>) -> Session {
    match identity {
        None => Session::Anonymous,
        Some(identity) => {
            let profile = profile::load_profile(backend, identity.id).await;
            Session::SignedIn { identity, profile }
        }
    }
}

/// Broadcasts identity changes to every open view.
#[derive(Clone)]
pub struct SessionHub {
    tx: broadcast::Sender<IdentityChange>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> IdentitySubscription {
        IdentitySubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn publish(&self, change: IdentityChange) {
        // No receivers just means no view is open.
        let delivered = self.tx.send(change).unwrap_or(0);
        debug!("Identity change delivered to {} subscribers", delivered);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Ends the remote session, then announces who left.
    pub async fn sign_out<B: Backend>(&self, backend: &B) -> Result<(), BackendError> {
        let leaving = match backend.current_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Identity lookup before sign-out failed: {}", e);
                None
            }
        };
        backend.sign_out().await?;

        match leaving {
            Some(identity) => {
                info!("{} signed out", identity.id);
                self.publish(IdentityChange::SignedOut { id: identity.id });
            }
            None => debug!("Signed out with no known identity, nothing to announce"),
        }
        Ok(())
    }
}

/// One view's handle on the identity stream. Dropping it unsubscribes.
pub struct IdentitySubscription {
    rx: broadcast::Receiver<IdentityChange>,
}

impl IdentitySubscription {
    /// Every pending change, oldest first.
    pub fn drain(&mut self) -> Vec<IdentityChange> {
        let mut pending = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(change) => pending.push(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Identity subscriber skipped {} stale changes", skipped);
                }
                Err(_) => return pending,
            }
        }
    }

    /// The newest pending change, if any.
    pub fn latest(&mut self) -> Option<IdentityChange> {
        self.drain().pop()
    }

    /// Waits for the next change. `None` once the hub is gone.
    pub async fn changed(&mut self) -> Option<IdentityChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
