use connect_types::{Backend, BackendError};
use connect_types::models::Role;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::{Admission, admit};
use crate::context::AppContext;
use crate::error::ViewError;
use crate::queries;
use crate::routes::{NavItem, Route};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationStats {
    pub total_events: usize,
    pub published_events: usize,
    pub total_applications: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub tagline: &'static str,
    pub actions: Vec<NavItem>,
    /// Organizations only; `None` when the counts could not be read.
    pub stats: Option<OrganizationStats>,
}

pub fn quick_actions(role: Role) -> Vec<NavItem> {
    let item = |label: &'static str, route: Route| NavItem { label, route };
    match role {
        Role::Participant => vec![
            item("Browse Events", Route::Events),
            item("My Applications", Route::MyApplications),
            item("Edit Profile", Route::Profile),
        ],
        Role::Organization => vec![
            item("Create Event", Route::CreateEvent),
            item("Manage Events", Route::ManageEvents),
            item("View Applications", Route::Applications),
            item("Edit Profile", Route::Profile),
        ],
    }
}

fn tagline(role: Role) -> &'static str {
    match role {
        Role::Participant => "Discover and apply to amazing events",
        Role::Organization => "Manage your events and applications",
    }
}

async fn organization_stats<B: Backend>(ctx: &AppContext<B>, organization: Uuid) -> Option<OrganizationStats> {
    let counted = async {
        let events = queries::managed_events(ctx.backend(), organization).await?;
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let total_applications = queries::received_application_count(ctx.backend(), &ids).await?;
        Ok::<_, BackendError>(OrganizationStats {
            total_events: events.len(),
            published_events: events.iter().filter(|e| e.is_published).count(),
            total_applications,
        })
    };
    match counted.await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Failed to load dashboard stats for {}: {}", organization, e);
            None
        }
    }
}

impl DashboardView {
    pub async fn open<B: Backend>(ctx: &AppContext<B>) -> Result<Self, ViewError> {
        let Admission { identity, profile } = admit(ctx, Route::Dashboard).await?;
        let role = profile.role();
        let stats = match role {
            Role::Organization => organization_stats(ctx, identity.id).await,
            Role::Participant => None,
        };

        Ok(Self {
            display_name: profile.display_name(identity.email.as_deref()),
            email: identity.email,
            role,
            tagline: tagline(role),
            actions: quick_actions(role),
            stats,
        })
    }
}
