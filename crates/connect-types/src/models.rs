use std::fmt;
use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal behind the current session.
/// Supplied by the auth service, never stored by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Organization,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Profiles --

/// A row of `profiles`. The `user_type` column selects which variant of
/// [`ProfileKind`] is active; the other role's columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ProfileKind,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum ProfileKind {
    Participant {
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        age: Option<i32>,
    },
    Organization {
        #[serde(default)]
        organization_name: Option<String>,
        #[serde(default)]
        website: Option<String>,
    },
}

impl Profile {
    pub fn role(&self) -> Role {
        match self.kind {
            ProfileKind::Participant { .. } => Role::Participant,
            ProfileKind::Organization { .. } => Role::Organization,
        }
    }

    /// Name shown in the navbar, dashboard greeting and profile header.
    pub fn display_name(&self, email: Option<&str>) -> String {
        match &self.kind {
            ProfileKind::Organization {
                organization_name, ..
            } => non_empty(organization_name.as_deref())
                .unwrap_or("Organization")
                .to_string(),
            ProfileKind::Participant {
                first_name,
                last_name,
                ..
            } => {
                let full = format!(
                    "{} {}",
                    first_name.as_deref().unwrap_or(""),
                    last_name.as_deref().unwrap_or("")
                );
                let full = full.trim();
                if full.is_empty() {
                    non_empty(email).unwrap_or("User").to_string()
                } else {
                    full.to_string()
                }
            }
        }
    }
}

/// Display name for a signed-in user whose profile may not be loaded.
pub fn display_name(profile: Option<&Profile>, email: Option<&str>) -> String {
    match profile {
        Some(profile) => profile.display_name(email),
        None => non_empty(email).unwrap_or("User").to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Directory entry for the public organizations page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub organization_name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Events --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub max_participants: NonZeroU32,
    pub category: String,
    pub organization_id: Uuid,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery_urls: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `organization` embed on event reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    #[serde(default)]
    pub organization_name: Option<String>,
}

/// An event joined with its organizer's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEvent {
    #[serde(flatten)]
    pub event: Event,
    #[serde(default)]
    pub organization: Option<Organizer>,
}

impl CatalogEvent {
    pub fn organizer_name(&self) -> &str {
        self.organization
            .as_ref()
            .and_then(|o| non_empty(o.organization_name.as_deref()))
            .unwrap_or("Organization")
    }
}

// -- Applications --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    /// Only a pending application can be decided, and only once.
    pub fn can_become(self, next: ApplicationStatus) -> bool {
        self == Self::Pending && next != Self::Pending
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organization's review verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn status(self) -> ApplicationStatus {
        match self {
            Self::Accept => ApplicationStatus::Accepted,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub event_id: Uuid,
    pub participant_id: Uuid,
    pub motivation_letter: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `event` embed on the organization's review list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: String,
    pub organization_id: Uuid,
}

/// The `participant` embed on the organization's review list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ParticipantSummary {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// An application as seen by the organization reviewing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewApplication {
    #[serde(flatten)]
    pub application: Application,
    pub event: EventSummary,
    #[serde(default)]
    pub participant: Option<ParticipantSummary>,
}

/// An application as seen by the participant who submitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantApplication {
    #[serde(flatten)]
    pub application: Application,
    #[serde(default)]
    pub event: Option<Event>,
}
