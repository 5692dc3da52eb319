use connect_types::models::Event;
use connect_types::{Backend, BackendError};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::{Admission, admit};
use crate::context::AppContext;
use crate::error::ViewError;
use crate::mutations::{self, DeleteConfirmation};
use crate::routes::Route;
use crate::view::{InFlight, Listing, Outcome, ViewScope};
use crate::queries;

const NO_EVENTS: &str = "Create your first event to get started with your organization.";

#[derive(Debug, Clone, Serialize)]
pub struct ManageEventsSnapshot {
    pub events: Vec<Event>,
    pub empty_message: Option<&'static str>,
    pub load_error: Option<BackendError>,
}

/// An organization's own events, drafts included.
pub struct ManageEventsView<B> {
    ctx: AppContext<B>,
    scope: ViewScope,
    organization: Uuid,
    listing: Mutex<Listing<Event>>,
    in_flight: InFlight,
}

impl<B: Backend> ManageEventsView<B> {
    pub async fn open(ctx: &AppContext<B>) -> Result<Self, ViewError> {
        let Admission { identity, .. } = admit(ctx, Route::ManageEvents).await?;
        let listing = Listing::from_result(
            "managed events",
            queries::managed_events(ctx.backend(), identity.id).await,
        );

        Ok(Self {
            ctx: ctx.clone(),
            scope: ViewScope::open(ctx.hub(), Some(identity.id)),
            organization: identity.id,
            listing: Mutex::new(listing),
            in_flight: InFlight::default(),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.listing.lock().rows.clone()
    }

    pub fn load_error(&self) -> Option<BackendError> {
        self.listing.lock().load_error.clone()
    }

    fn find(&self, id: Uuid) -> Option<Event> {
        self.listing.lock().rows.iter().find(|e| e.id == id).cloned()
    }

    /// Re-reads the list. A result arriving after close is dropped.
    pub async fn reload(&self) {
        let result = queries::managed_events(self.ctx.backend(), self.organization).await;
        if self.scope.is_live() {
            *self.listing.lock() = Listing::from_result("managed events", result);
        }
    }

    /// Flips `is_published` on one event.
    pub async fn toggle_publish(&self, id: Uuid) -> Outcome {
        self.try_toggle_publish(id)
            .await
            .err()
            .unwrap_or(Outcome::Applied)
    }

    async fn try_toggle_publish(&self, id: Uuid) -> Result<(), Outcome> {
        self.scope.ready()?;
        let event = self.find(id).ok_or(Outcome::Refused("event is not in this list"))?;

        let _guard = self.in_flight.begin(id)?;
        let published = !event.is_published;
        let result = mutations::set_published(self.ctx.backend(), id, published).await;
        self.scope.settle("publish toggle", result)?;

        if let Some(event) = self.listing.lock().rows.iter_mut().find(|e| e.id == id) {
            event.is_published = published;
        }
        Ok(())
    }

    /// First step of a delete: the confirmation to show the user.
    /// `None` when the event is not in this list.
    pub fn request_delete(&self, id: Uuid) -> Option<DeleteConfirmation> {
        self.find(id).map(|event| DeleteConfirmation::new(&event))
    }

    /// Second step: the user said yes.
    pub async fn confirm_delete(&self, confirmation: DeleteConfirmation) -> Outcome {
        self.try_delete(confirmation)
            .await
            .err()
            .unwrap_or(Outcome::Applied)
    }

    async fn try_delete(&self, confirmation: DeleteConfirmation) -> Result<(), Outcome> {
        self.scope.ready()?;
        let id = confirmation.event_id();

        let _guard = self.in_flight.begin(id)?;
        let result = mutations::delete_event(self.ctx.backend(), confirmation).await;
        self.scope.settle("event delete", result)?;

        self.listing.lock().rows.retain(|e| e.id != id);
        Ok(())
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn snapshot(&self) -> ManageEventsSnapshot {
        let listing = self.listing.lock();
        ManageEventsSnapshot {
            events: listing.rows.clone(),
            empty_message: listing.is_empty().then_some(NO_EVENTS),
            load_error: listing.load_error.clone(),
        }
    }
}
