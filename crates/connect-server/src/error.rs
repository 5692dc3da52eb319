use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use connect_client::{Outcome, Route, ViewError};
use serde_json::json;
use tracing::debug;

/// Handler failures. Gate failures redirect rather than error.
#[derive(Debug)]
pub enum ApiError {
    View(ViewError),
    BadToken,
    NotFound,
}

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        Self::View(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let view = match self {
            Self::BadToken => return error_body(StatusCode::UNAUTHORIZED, "malformed bearer token"),
            Self::NotFound => return error_body(StatusCode::NOT_FOUND, "not found"),
            Self::View(view) => view,
        };

        match view {
            ViewError::AuthRequired => see_other(Route::Login, &view),
            ViewError::RoleMismatch { .. } => see_other(Route::Dashboard, &view),
            ViewError::ProfileIncomplete => error_body(
                StatusCode::CONFLICT,
                "Your account is not fully set up yet.",
            ),
            ViewError::NotFound => error_body(StatusCode::NOT_FOUND, "not found"),
        }
    }
}

/// 303 See Other
fn see_other(route: Route, view: &ViewError) -> Response {
    debug!("Redirecting to {}: {}", route, view);
    Redirect::to(&route.path()).into_response()
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// HTTP status for a mutation outcome.
pub fn outcome_status(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::Applied => StatusCode::OK,
        Outcome::Busy | Outcome::Discarded => StatusCode::CONFLICT,
        Outcome::Refused(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::Failed(_) => StatusCode::BAD_GATEWAY,
    }
}
