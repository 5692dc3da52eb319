use connect_types::models::{ApplicationStatus, Decision, ReviewApplication};
use connect_types::{Backend, BackendError};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::{Admission, admit};
use crate::context::AppContext;
use crate::error::ViewError;
use crate::filter::{self, StatusFilter};
use crate::routes::Route;
use crate::view::{InFlight, Listing, Outcome, ViewScope};
use crate::{mutations, queries};

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRow {
    #[serde(flatten)]
    pub application: ReviewApplication,
    pub participant_name: String,
    /// Decisions on offer; empty once the application is decided.
    pub controls: Vec<Decision>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationsSnapshot {
    pub applications: Vec<ReviewRow>,
    pub status_filter: StatusFilter,
    pub counts: StatusCounts,
    pub empty_message: Option<String>,
    pub load_error: Option<BackendError>,
}

/// Applications to the organization's events, for review.
pub struct ApplicationsView<B> {
    ctx: AppContext<B>,
    scope: ViewScope,
    organization: Uuid,
    listing: Mutex<Listing<ReviewApplication>>,
    status_filter: Mutex<StatusFilter>,
    in_flight: InFlight,
}

/// Accept/reject are offered only while pending.
pub fn controls(status: ApplicationStatus) -> Vec<Decision> {
    match status {
        ApplicationStatus::Pending => vec![Decision::Accept, Decision::Reject],
        ApplicationStatus::Accepted | ApplicationStatus::Rejected => Vec::new(),
    }
}

impl<B: Backend> ApplicationsView<B> {
    pub async fn open(ctx: &AppContext<B>) -> Result<Self, ViewError> {
        let Admission { identity, .. } = admit(ctx, Route::Applications).await?;
        let listing = Listing::from_result(
            "review applications",
            queries::review_applications(ctx.backend(), identity.id).await,
        );

        Ok(Self {
            ctx: ctx.clone(),
            scope: ViewScope::open(ctx.hub(), Some(identity.id)),
            organization: identity.id,
            listing: Mutex::new(listing),
            status_filter: Mutex::new(StatusFilter::All),
            in_flight: InFlight::default(),
        })
    }

    pub fn set_status_filter(&self, filter: StatusFilter) {
        *self.status_filter.lock() = filter;
    }

    /// Applications passing the status filter, newest first.
    pub fn applications(&self) -> Vec<ReviewApplication> {
        let filter = *self.status_filter.lock();
        let listing = self.listing.lock();
        filter::filter_by_status(&listing.rows, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn find(&self, id: Uuid) -> Option<ReviewApplication> {
        self.listing
            .lock()
            .rows
            .iter()
            .find(|a| a.application.id == id)
            .cloned()
    }

    pub fn controls_for(&self, id: Uuid) -> Vec<Decision> {
        self.find(id)
            .map(|a| controls(a.application.status))
            .unwrap_or_default()
    }

    pub fn load_error(&self) -> Option<BackendError> {
        self.listing.lock().load_error.clone()
    }

    pub async fn reload(&self) {
        let result = queries::review_applications(self.ctx.backend(), self.organization).await;
        if self.scope.is_live() {
            *self.listing.lock() = Listing::from_result("review applications", result);
        }
    }

    /// Accepts or rejects a pending application.
    pub async fn decide(&self, id: Uuid, decision: Decision) -> Outcome {
        self.try_decide(id, decision)
            .await
            .err()
            .unwrap_or(Outcome::Applied)
    }

    async fn try_decide(&self, id: Uuid, decision: Decision) -> Result<(), Outcome> {
        self.scope.ready()?;
        let current = self
            .find(id)
            .ok_or(Outcome::Refused("application is not in this list"))?;
        let next = decision.status();
        if !current.application.status.can_become(next) {
            return Err(Outcome::Refused("application was already decided"));
        }

        let _guard = self.in_flight.begin(id)?;
        let result = mutations::set_application_status(self.ctx.backend(), id, next).await;
        self.scope.settle("application decision", result)?;

        let mut listing = self.listing.lock();
        if let Some(row) = listing.rows.iter_mut().find(|a| a.application.id == id) {
            row.application.status = next;
        }
        Ok(())
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn snapshot(&self) -> ApplicationsSnapshot {
        let status_filter = *self.status_filter.lock();
        let listing = self.listing.lock();

        let mut counts = StatusCounts {
            total: listing.rows.len(),
            ..StatusCounts::default()
        };
        for row in &listing.rows {
            match row.application.status {
                ApplicationStatus::Pending => counts.pending += 1,
                ApplicationStatus::Accepted => counts.accepted += 1,
                ApplicationStatus::Rejected => counts.rejected += 1,
            }
        }

        let applications: Vec<ReviewRow> = filter::filter_by_status(&listing.rows, status_filter)
            .into_iter()
            .map(|a| ReviewRow {
                participant_name: a
                    .participant
                    .as_ref()
                    .map(|p| p.full_name())
                    .unwrap_or_default(),
                controls: controls(a.application.status),
                application: a.clone(),
            })
            .collect();

        let empty_message = applications.is_empty().then(|| match status_filter {
            StatusFilter::All => "No applications have been submitted to your events yet.".to_string(),
            StatusFilter::Pending => "No pending applications found.".to_string(),
            StatusFilter::Accepted => "No accepted applications found.".to_string(),
            StatusFilter::Rejected => "No rejected applications found.".to_string(),
        });

        ApplicationsSnapshot {
            applications,
            status_filter,
            counts,
            empty_message,
            load_error: listing.load_error.clone(),
        }
    }
}
