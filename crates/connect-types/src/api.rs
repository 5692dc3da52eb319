use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ApplicationStatus, Decision, Profile, ProfileKind, Role};
use crate::query::{Row, to_row};
use crate::backend::BackendError;

// -- Profile edit --

/// Editable profile fields. Values are saved exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        let mut form = Self {
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            ..Self::default()
        };
        match &profile.kind {
            ProfileKind::Participant {
                first_name,
                last_name,
                age,
            } => {
                form.first_name = first_name.clone();
                form.last_name = last_name.clone();
                form.age = *age;
            }
            ProfileKind::Organization {
                organization_name,
                website,
            } => {
                form.organization_name = organization_name.clone();
                form.website = website.clone();
            }
        }
        form
    }

    /// The update payload for this role. `user_type` is never sent.
    pub fn patch_for(&self, role: Role) -> Result<Row, BackendError> {
        match role {
            Role::Participant => to_row(&ParticipantPatch {
                first_name: &self.first_name,
                last_name: &self.last_name,
                age: self.age,
                bio: &self.bio,
                location: &self.location,
            }),
            Role::Organization => to_row(&OrganizationPatch {
                organization_name: &self.organization_name,
                website: &self.website,
                bio: &self.bio,
                location: &self.location,
            }),
        }
    }

    /// Copies the role's editable fields onto a loaded profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        profile.bio = self.bio.clone();
        profile.location = self.location.clone();
        match &mut profile.kind {
            ProfileKind::Participant {
                first_name,
                last_name,
                age,
            } => {
                *first_name = self.first_name.clone();
                *last_name = self.last_name.clone();
                *age = self.age;
            }
            ProfileKind::Organization {
                organization_name,
                website,
            } => {
                *organization_name = self.organization_name.clone();
                *website = self.website.clone();
            }
        }
    }
}

#[derive(Serialize)]
struct ParticipantPatch<'a> {
    first_name: &'a Option<String>,
    last_name: &'a Option<String>,
    age: Option<i32>,
    bio: &'a Option<String>,
    location: &'a Option<String>,
}

#[derive(Serialize)]
struct OrganizationPatch<'a> {
    organization_name: &'a Option<String>,
    website: &'a Option<String>,
    bio: &'a Option<String>,
    location: &'a Option<String>,
}

// -- Events --

#[derive(Debug, Serialize)]
pub struct PublishPatch {
    pub is_published: bool,
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    pub motivation_letter: String,
}

#[derive(Debug, Serialize)]
pub struct NewApplication {
    pub event_id: Uuid,
    pub participant_id: Uuid,
    pub motivation_letter: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct StatusPatch {
    pub status: ApplicationStatus,
}
