//! Single-row remote writes, each scoped by primary key.

use connect_types::api::{NewApplication, ProfileForm, PublishPatch, StatusPatch};
use connect_types::models::{Application, ApplicationStatus, Event, Role};
use connect_types::query::{from_row, to_row};
use connect_types::{Backend, BackendError, Table};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this event? This action cannot be undone.";

/// Proof that the user confirmed deleting one event.
///
/// Only the managed-events view hands these out; [`delete_event`] takes one
/// by value, so an unconfirmed delete cannot reach the backend.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DeleteConfirmation {
    event_id: Uuid,
    title: String,
}

impl DeleteConfirmation {
    pub(crate) fn new(event: &Event) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prompt(&self) -> &'static str {
        DELETE_PROMPT
    }
}

pub async fn set_application_status<B: Backend>(
    backend: &B,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<(), BackendError> {
    backend
        .update(Table::Applications, id, to_row(&StatusPatch { status })?)
        .await?;
    info!("Application {} is now {}", id, status);
    Ok(())
}

pub async fn set_published<B: Backend>(backend: &B, id: Uuid, is_published: bool) -> Result<(), BackendError> {
    backend
        .update(Table::Events, id, to_row(&PublishPatch { is_published })?)
        .await?;
    info!("Event {} published={}", id, is_published);
    Ok(())
}

pub async fn delete_event<B: Backend>(backend: &B, confirmation: DeleteConfirmation) -> Result<(), BackendError> {
    backend.delete(Table::Events, confirmation.event_id).await?;
    info!("Deleted event {} ({})", confirmation.event_id, confirmation.title);
    Ok(())
}

/// Sends the role's editable fields verbatim.
pub async fn update_profile<B: Backend>(
    backend: &B,
    id: Uuid,
    role: Role,
    form: &ProfileForm,
) -> Result<(), BackendError> {
    backend.update(Table::Profiles, id, form.patch_for(role)?).await?;
    info!("Updated profile {}", id);
    Ok(())
}

/// Inserts a pending application and returns it as stored.
pub async fn submit_application<B: Backend>(
    backend: &B,
    application: &NewApplication,
) -> Result<Application, BackendError> {
    let row = backend
        .insert(Table::Applications, to_row(application)?)
        .await?;
    let stored: Application = from_row(row)?;
    info!(
        "Participant {} applied to event {}",
        stored.participant_id, stored.event_id
    );
    Ok(stored)
}
