use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identity;

/// Identity changes broadcast to every open view.
/// Each event names the identity it concerns, since one hub may serve
/// many users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IdentityChange {
    /// A user signed in somewhere in the application
    SignedIn { identity: Identity },

    /// This identity's session ended
    SignedOut { id: Uuid },

    /// The signed-in user's auth record changed (e.g. email)
    UserUpdated { identity: Identity },
}

impl IdentityChange {
    /// The identity in effect after this change, for whoever it concerns.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn { identity } | Self::UserUpdated { identity } => Some(identity),
            Self::SignedOut { .. } => None,
        }
    }

    /// Id of the user this change is about.
    pub fn subject(&self) -> Uuid {
        match self {
            Self::SignedIn { identity } | Self::UserUpdated { identity } => identity.id,
            Self::SignedOut { id } => *id,
        }
    }

    pub fn is_sign_out_of(&self, user: Uuid) -> bool {
        matches!(self, Self::SignedOut { id } if *id == user)
    }
}
