use connect_types::models::Organization;
use connect_types::{Backend, BackendError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::context::AppContext;
use crate::filter;
use crate::queries;
use crate::view::Listing;

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationsSnapshot {
    pub organizations: Vec<Organization>,
    pub search: String,
    pub empty_message: Option<&'static str>,
    pub load_error: Option<BackendError>,
}

/// The public directory of organizations.
pub struct OrganizationsView {
    listing: Listing<Organization>,
    search: Mutex<String>,
}

impl OrganizationsView {
    pub async fn open<B: Backend>(ctx: &AppContext<B>) -> Self {
        Self {
            listing: Listing::from_result("organizations", queries::organizations(ctx.backend()).await),
            search: Mutex::new(String::new()),
        }
    }

    pub fn set_search(&self, term: &str) {
        *self.search.lock() = term.to_string();
    }

    pub fn visible(&self) -> Vec<Organization> {
        let search = self.search.lock().clone();
        filter::search_organizations(&self.listing.rows, &search)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn listing(&self) -> &Listing<Organization> {
        &self.listing
    }

    pub fn snapshot(&self) -> OrganizationsSnapshot {
        let search = self.search.lock().clone();
        let organizations = self.visible();
        let empty_message = organizations.is_empty().then_some(if search.is_empty() {
            "No organizations are currently registered."
        } else {
            "Try adjusting your search criteria."
        });
        OrganizationsSnapshot {
            organizations,
            search,
            empty_message,
            load_error: self.listing.load_error.clone(),
        }
    }
}
