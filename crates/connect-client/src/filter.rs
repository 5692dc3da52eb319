//! Client-side search and filtering over already-loaded rows.

use std::fmt;

use connect_types::models::{ApplicationStatus, CatalogEvent, Organization, ReviewApplication};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text fields a free-text search looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match on any field. An empty term matches.
    fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let term = term.to_lowercase();
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

impl Searchable for CatalogEvent {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.event.title.as_str(),
            self.event.description.as_str(),
            self.event.location.as_str(),
        ]
    }
}

impl Searchable for Organization {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.organization_name.as_str()];
        fields.extend(self.location.as_deref());
        fields.extend(self.bio.as_deref());
        fields
    }
}

/// Category selector: every category, or exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn admits(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        match value {
            "" | "all" => Self::All,
            other => Self::Only(other.to_string()),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => f.write_str(category),
        }
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// "all" followed by each distinct category in first-seen order.
pub fn categories(events: &[CatalogEvent]) -> Vec<CategoryFilter> {
    let mut options = vec![CategoryFilter::All];
    for event in events {
        let option = CategoryFilter::Only(event.event.category.clone());
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}

pub fn filter_events<'a>(
    events: &'a [CatalogEvent],
    search: &str,
    category: &CategoryFilter,
) -> Vec<&'a CatalogEvent> {
    events
        .iter()
        .filter(|e| e.matches(search) && category.admits(&e.event.category))
        .collect()
}

pub fn search_organizations<'a>(organizations: &'a [Organization], search: &str) -> Vec<&'a Organization> {
    organizations.iter().filter(|o| o.matches(search)).collect()
}

/// Review-list status selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Accepted,
    Rejected,
}

impl StatusFilter {
    pub fn admits(self, status: ApplicationStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == ApplicationStatus::Pending,
            Self::Accepted => status == ApplicationStatus::Accepted,
            Self::Rejected => status == ApplicationStatus::Rejected,
        }
    }
}

pub fn filter_by_status(applications: &[ReviewApplication], filter: StatusFilter) -> Vec<&ReviewApplication> {
    applications
        .iter()
        .filter(|a| filter.admits(a.application.status))
        .collect()
}
