use connect_types::Backend;
use connect_types::models::CatalogEvent;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::filter::{self, CategoryFilter};
use crate::queries;
use crate::view::Listing;

const NO_EVENTS: &str = "No events are currently available. Check back later!";
const NO_MATCHES: &str = "Try adjusting your search or filter criteria.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: CategoryFilter,
}

impl EventCriteria {
    fn is_active(&self) -> bool {
        !self.search.is_empty() || self.category != CategoryFilter::All
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub events: Vec<CatalogEvent>,
    pub categories: Vec<CategoryFilter>,
    pub criteria: EventCriteria,
    pub empty_message: Option<&'static str>,
    pub load_error: Option<connect_types::BackendError>,
}

/// The public events page.
pub struct CatalogView {
    listing: Listing<CatalogEvent>,
    criteria: Mutex<EventCriteria>,
}

impl CatalogView {
    pub async fn open<B: Backend>(ctx: &AppContext<B>) -> Self {
        let listing = Listing::from_result("catalog events", queries::catalog(ctx.backend()).await);
        Self {
            listing,
            criteria: Mutex::new(EventCriteria::default()),
        }
    }

    pub fn listing(&self) -> &Listing<CatalogEvent> {
        &self.listing
    }

    pub fn set_search(&self, term: &str) {
        self.criteria.lock().search = term.to_string();
    }

    pub fn set_category(&self, category: CategoryFilter) {
        self.criteria.lock().category = category;
    }

    pub fn set_criteria(&self, criteria: EventCriteria) {
        *self.criteria.lock() = criteria;
    }

    pub fn categories(&self) -> Vec<CategoryFilter> {
        filter::categories(&self.listing.rows)
    }

    /// Events passing the current search and category, recomputed per call.
    pub fn visible(&self) -> Vec<CatalogEvent> {
        let criteria = self.criteria.lock().clone();
        filter::filter_events(&self.listing.rows, &criteria.search, &criteria.category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.visible().is_empty() {
            return None;
        }
        Some(if self.criteria.lock().is_active() {
            NO_MATCHES
        } else {
            NO_EVENTS
        })
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            events: self.visible(),
            categories: self.categories(),
            criteria: self.criteria.lock().clone(),
            empty_message: self.empty_message(),
            load_error: self.listing.load_error.clone(),
        }
    }
}
