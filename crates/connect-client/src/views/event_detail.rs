use connect_types::Backend;
use connect_types::api::NewApplication;
use connect_types::models::{ApplicationStatus, CatalogEvent, Role};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::ViewError;
use crate::session::Session;
use crate::view::{InFlight, Outcome, ViewScope};
use crate::{mutations, queries};

#[derive(Debug, Clone, Serialize)]
pub struct EventDetailSnapshot {
    pub event: CatalogEvent,
    pub organizer_name: String,
    pub application_status: Option<ApplicationStatus>,
    pub can_apply: bool,
}

/// One event's page, with the participant's apply action.
pub struct EventDetailView<B> {
    ctx: AppContext<B>,
    scope: ViewScope,
    session: Session,
    event: CatalogEvent,
    application: Mutex<Option<ApplicationStatus>>,
    in_flight: InFlight,
}

impl<B: Backend> EventDetailView<B> {
    /// Drafts are not found unless the viewer owns them. A failed read is
    /// also reported as not found, after logging.
    pub async fn open(ctx: &AppContext<B>, id: Uuid) -> Result<Self, ViewError> {
        let session = ctx.session().await;
        let viewer = session.identity().map(|i| i.id);

        let event = match queries::event_detail(ctx.backend(), id).await {
            Ok(Some(event)) => event,
            Ok(None) => return Err(ViewError::NotFound),
            Err(e) => {
                warn!("Failed to load event {}: {}", id, e);
                return Err(ViewError::NotFound);
            }
        };
        if !event.event.is_published && viewer != Some(event.event.organization_id) {
            return Err(ViewError::NotFound);
        }

        let application = match (session.role(), viewer) {
            (Some(Role::Participant), Some(me)) => {
                match queries::existing_application(ctx.backend(), id, me).await {
                    Ok(existing) => existing.map(|a| a.status),
                    Err(e) => {
                        warn!("Failed to check existing application on {}: {}", id, e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Self {
            ctx: ctx.clone(),
            scope: ViewScope::open(ctx.hub(), viewer),
            session,
            event,
            application: Mutex::new(application),
            in_flight: InFlight::default(),
        })
    }

    pub fn event(&self) -> &CatalogEvent {
        &self.event
    }

    pub fn application_status(&self) -> Option<ApplicationStatus> {
        *self.application.lock()
    }

    pub fn can_apply(&self) -> bool {
        self.apply_precondition().is_ok()
    }

    fn apply_precondition(&self) -> Result<Uuid, Outcome> {
        let Some(identity) = self.session.identity() else {
            return Err(Outcome::Refused("sign in to apply"));
        };
        match self.session.role() {
            Some(Role::Participant) => {}
            Some(Role::Organization) => return Err(Outcome::Refused("organizations cannot apply")),
            None => return Err(Outcome::Refused("account setup is not complete")),
        }
        if !self.event.event.is_published {
            return Err(Outcome::Refused("event is not open for applications"));
        }
        if self.application.lock().is_some() {
            return Err(Outcome::Refused("already applied"));
        }
        Ok(identity.id)
    }

    /// Submits a pending application with this motivation letter.
    pub async fn apply(&self, motivation_letter: &str) -> Outcome {
        self.try_apply(motivation_letter)
            .await
            .err()
            .unwrap_or(Outcome::Applied)
    }

    async fn try_apply(&self, motivation_letter: &str) -> Result<(), Outcome> {
        self.scope.ready()?;
        let participant_id = self.apply_precondition()?;
        if motivation_letter.trim().is_empty() {
            return Err(Outcome::Refused("motivation letter is required"));
        }

        let _guard = self.in_flight.begin(self.event.event.id)?;
        let request = NewApplication {
            event_id: self.event.event.id,
            participant_id,
            motivation_letter: motivation_letter.to_string(),
        };
        let result = mutations::submit_application(self.ctx.backend(), &request).await;
        let stored = self.scope.settle("application submit", result)?;

        *self.application.lock() = Some(stored.status);
        Ok(())
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn snapshot(&self) -> EventDetailSnapshot {
        EventDetailSnapshot {
            event: self.event.clone(),
            organizer_name: self.event.organizer_name().to_string(),
            application_status: self.application_status(),
            can_apply: self.can_apply(),
        }
    }
}
