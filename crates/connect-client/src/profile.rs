use connect_types::Backend;
use tracing::{info, warn};
use uuid::Uuid;

use crate::queries;
use crate::session::ProfileState;

/// Loads the profile that determines the user's role.
///
/// Never fails: a missing row is [`ProfileState::NotSetUp`] and a failed
/// read is logged and reported as [`ProfileState::Unavailable`].
pub async fn load_profile<B: Backend>(backend: &B, id: Uuid) -> ProfileState {
    match queries::profile(backend, id).await {
        Ok(Some(profile)) => ProfileState::Ready(profile),
        Ok(None) => {
            info!("No profile for {} yet", id);
            ProfileState::NotSetUp
        }
        Err(e) => {
            warn!("Failed to load profile {}: {}", id, e);
            ProfileState::Unavailable
        }
    }
}
