use connect_types::models::ParticipantApplication;
use connect_types::{Backend, BackendError};
use serde::Serialize;

use super::{Admission, admit};
use crate::context::AppContext;
use crate::error::ViewError;
use crate::queries;
use crate::routes::Route;
use crate::view::Listing;

const NO_APPLICATIONS: &str =
    "You haven't applied to any events yet. Start by browsing available events!";

#[derive(Debug, Clone, Serialize)]
pub struct MyApplicationsSnapshot {
    pub applications: Vec<ParticipantApplication>,
    pub empty_message: Option<&'static str>,
    pub load_error: Option<BackendError>,
}

/// A participant's own applications with their events.
pub struct MyApplicationsView {
    listing: Listing<ParticipantApplication>,
}

impl MyApplicationsView {
    pub async fn open<B: Backend>(ctx: &AppContext<B>) -> Result<Self, ViewError> {
        let Admission { identity, .. } = admit(ctx, Route::MyApplications).await?;
        let listing = Listing::from_result(
            "participant applications",
            queries::my_applications(ctx.backend(), identity.id).await,
        );
        Ok(Self { listing })
    }

    pub fn applications(&self) -> &[ParticipantApplication] {
        &self.listing.rows
    }

    pub fn load_error(&self) -> Option<&BackendError> {
        self.listing.load_error.as_ref()
    }

    pub fn snapshot(&self) -> MyApplicationsSnapshot {
        MyApplicationsSnapshot {
            applications: self.listing.rows.clone(),
            empty_message: self.listing.is_empty().then_some(NO_APPLICATIONS),
            load_error: self.listing.load_error.clone(),
        }
    }
}
