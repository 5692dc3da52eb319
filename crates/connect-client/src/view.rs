//! Lifecycle pieces shared by every view: liveness, identity tracking,
//! in-flight bookkeeping and the result shapes views report.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use connect_types::BackendError;
use connect_types::events::IdentityChange;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::{IdentitySubscription, SessionHub};

/// Rows for a list view, with the load error kept beside them.
///
/// A failed read renders like an empty one; `load_error` is how callers
/// (and logs) tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub load_error: Option<BackendError>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            load_error: None,
        }
    }
}

impl<T> Listing<T> {
    pub fn from_result(what: &str, result: Result<Vec<T>, BackendError>) -> Self {
        match result {
            Ok(rows) => {
                debug!("Loaded {} {}", rows.len(), what);
                Self {
                    rows,
                    load_error: None,
                }
            }
            Err(e) => {
                warn!("Failed to load {}: {}", what, e);
                Self {
                    rows: Vec::new(),
                    load_error: Some(e),
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What became of a mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Written remotely and reflected locally.
    Applied,
    /// The same row already has a request outstanding.
    Busy,
    /// A local precondition failed; nothing was sent.
    Refused(&'static str),
    /// The backend refused or could not be reached; local state is unchanged.
    Failed(BackendError),
    /// The view closed before the result arrived.
    Discarded,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A view's lifetime: liveness flag plus its identity subscription.
///
/// Closing (or dropping) the scope releases the subscription, and any
/// remote result that arrives afterwards is discarded.
pub struct ViewScope {
    live: AtomicBool,
    revoked: AtomicBool,
    granted_to: Option<Uuid>,
    changes: Mutex<Option<IdentitySubscription>>,
}

impl ViewScope {
    /// `granted_to` is the identity a gated view was opened for; public
    /// views pass `None` and are never revoked.
    pub fn open(hub: &SessionHub, granted_to: Option<Uuid>) -> Self {
        Self {
            live: AtomicBool::new(true),
            revoked: AtomicBool::new(false),
            granted_to,
            changes: Mutex::new(Some(hub.subscribe())),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.changes.lock().take();
    }

    /// Drains pending identity changes, oldest first.
    ///
    /// If the identity a gated view was granted to signed out, the scope is
    /// revoked for good. Changes about other users leave it alone.
    pub fn poll_changes(&self) -> Vec<IdentityChange> {
        let changes = match self.changes.lock().as_mut() {
            Some(subscription) => subscription.drain(),
            None => return Vec::new(),
        };
        if let Some(granted) = self.granted_to {
            if changes.iter().any(|c| c.is_sign_out_of(granted)) {
                info!("Identity {} signed out of a gated view, revoking access", granted);
                self.revoked.store(true, Ordering::SeqCst);
            }
        }
        changes
    }

    /// Like [`poll_changes`](Self::poll_changes), keeping only the newest.
    pub fn poll_identity(&self) -> Option<IdentityChange> {
        self.poll_changes().pop()
    }

    pub fn is_revoked(&self) -> bool {
        self.poll_changes();
        self.revoked.load(Ordering::SeqCst)
    }

    /// Checked before a mutation is sent.
    pub fn ready(&self) -> Result<(), Outcome> {
        if !self.is_live() {
            return Err(Outcome::Discarded);
        }
        if self.is_revoked() {
            return Err(Outcome::Refused("no longer signed in"));
        }
        Ok(())
    }

    /// Checked when a remote call finishes: closed views drop the result,
    /// failures are logged.
    pub fn settle<T>(&self, action: &str, result: Result<T, BackendError>) -> Result<T, Outcome> {
        if !self.is_live() {
            debug!("{} finished after its view closed, discarding", action);
            return Err(Outcome::Discarded);
        }
        result.map_err(|e| {
            warn!("{} failed: {}", action, e);
            Outcome::Failed(e)
        })
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Rows with a mutation outstanding. A second request for the same row is
/// turned away rather than queued.
#[derive(Debug, Default)]
pub struct InFlight {
    keys: Mutex<HashSet<Uuid>>,
}

impl InFlight {
    pub fn begin(&self, key: Uuid) -> Result<InFlightGuard<'_>, Outcome> {
        if !self.keys.lock().insert(key) {
            debug!("Request for {} already in flight", key);
            return Err(Outcome::Busy);
        }
        Ok(InFlightGuard { set: self, key })
    }

    pub fn contains(&self, key: Uuid) -> bool {
        self.keys.lock().contains(&key)
    }
}

pub struct InFlightGuard<'a> {
    set: &'a InFlight,
    key: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.keys.lock().remove(&self.key);
    }
}
