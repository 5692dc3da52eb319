//! One view model per route. Gated views are constructed only after their
//! access gate grants them, so a view value always belongs to an admitted
//! user.

pub mod applications;
pub mod catalog;
pub mod dashboard;
pub mod event_detail;
pub mod manage_events;
pub mod my_applications;
pub mod navbar;
pub mod organizations;
pub mod profile;

pub use applications::ApplicationsView;
pub use catalog::CatalogView;
pub use dashboard::DashboardView;
pub use event_detail::EventDetailView;
pub use manage_events::ManageEventsView;
pub use my_applications::MyApplicationsView;
pub use navbar::Navbar;
pub use organizations::OrganizationsView;
pub use profile::ProfileView;

use connect_types::Backend;
use connect_types::models::{Identity, Profile};

use crate::context::AppContext;
use crate::error::ViewError;
use crate::gate::AccessGate;
use crate::routes::Route;
use crate::session::{ProfileState, Session};

/// The user a gated view was opened for.
pub(crate) struct Admission {
    pub identity: Identity,
    pub profile: Profile,
}

/// Resolves the session and runs `route`'s gate. Nothing is queried for
/// the view unless this succeeds.
pub(crate) async fn admit<B: Backend>(ctx: &AppContext<B>, route: Route) -> Result<Admission, ViewError> {
    let session = ctx.session().await;
    AccessGate::for_route(route).admit(&session)?;
    match session {
        Session::SignedIn {
            identity,
            profile: ProfileState::Ready(profile),
        } => Ok(Admission { identity, profile }),
        // Only reachable for public routes, which never come through here.
        _ => Err(ViewError::AuthRequired),
    }
}
