use connect_types::models::Role;
use thiserror::Error;

use crate::routes::Route;

/// Reasons a gated view refuses to open.
///
/// Remote failures never surface here: reads degrade into an empty
/// [`Listing`](crate::view::Listing) and writes into
/// [`Outcome::Failed`](crate::view::Outcome::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("sign in required")]
    AuthRequired,

    #[error("this page is for {required} accounts, signed in as {actual}")]
    RoleMismatch { required: Role, actual: Role },

    #[error("account setup is not complete")]
    ProfileIncomplete,

    #[error("not found")]
    NotFound,
}

impl ViewError {
    /// Where the user is sent instead, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Self::AuthRequired => Some(Route::Login),
            Self::RoleMismatch { .. } => Some(Route::Dashboard),
            Self::ProfileIncomplete | Self::NotFound => None,
        }
    }
}
