use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use connect_client::filter::{CategoryFilter, StatusFilter};
use connect_client::views::catalog::EventCriteria;
use connect_client::views::{
    ApplicationsView, CatalogView, DashboardView, EventDetailView, ManageEventsView,
    MyApplicationsView, Navbar, OrganizationsView, ProfileView,
};
use connect_client::{AppContext, Outcome};
use connect_types::api::{ApplyRequest, DecisionRequest, ProfileForm};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, outcome_status};
use crate::state::{AnyBackend, AppState};

type Auth = Option<TypedHeader<Authorization<Bearer>>>;
type ApiResult = Result<Response, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/nav", get(nav))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/events", get(catalog))
        .route("/api/events/manage", get(manage_events))
        .route("/api/events/{id}", get(event_detail).delete(delete_event))
        .route("/api/events/{id}/publish", post(toggle_publish))
        .route("/api/events/{id}/applications", post(apply))
        .route("/api/applications", get(review_applications))
        .route("/api/applications/{id}/decision", post(decide))
        .route("/api/my-applications", get(my_applications))
        .route("/api/organizations", get(organizations))
        .route("/api/dashboard", get(dashboard))
        .route("/api/profile", get(profile).put(update_profile))
        .with_state(state)
}

// ── Request/response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: CategoryFilter,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
struct MutationResponse<T: Serialize> {
    #[serde(flatten)]
    outcome: Outcome,
    view: T,
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn context(state: &AppState, auth: Auth) -> Result<AppContext<AnyBackend>, ApiError> {
    state.context(auth.as_ref().map(|TypedHeader(header)| header.token()))
}

fn json<T: Serialize>(body: T) -> ApiResult {
    Ok(Json(body).into_response())
}

fn mutation<T: Serialize>(outcome: Outcome, view: T) -> ApiResult {
    Ok((outcome_status(&outcome), Json(MutationResponse { outcome, view })).into_response())
}

// ── Public views ────────────────────────────────────────────────────────

async fn nav(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(Navbar::open(&ctx).await.snapshot())
}

async fn sign_out(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    match ctx.sign_out().await {
        Ok(route) => json(json!({ "redirect": route })),
        Err(e) => mutation(Outcome::Failed(e), ()),
    }
}

async fn catalog(
    State(state): State<AppState>,
    auth: Auth,
    Query(params): Query<CatalogParams>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = CatalogView::open(&ctx).await;
    view.set_criteria(EventCriteria {
        search: params.search,
        category: params.category,
    });
    json(view.snapshot())
}

async fn event_detail(State(state): State<AppState>, auth: Auth, Path(id): Path<Uuid>) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(EventDetailView::open(&ctx, id).await?.snapshot())
}

async fn apply(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = EventDetailView::open(&ctx, id).await?;
    let outcome = view.apply(&req.motivation_letter).await;
    mutation(outcome, view.snapshot())
}

async fn organizations(
    State(state): State<AppState>,
    auth: Auth,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = OrganizationsView::open(&ctx).await;
    view.set_search(&params.search);
    json(view.snapshot())
}

// ── Organization views ──────────────────────────────────────────────────

async fn manage_events(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(ManageEventsView::open(&ctx).await?.snapshot())
}

async fn toggle_publish(State(state): State<AppState>, auth: Auth, Path(id): Path<Uuid>) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = ManageEventsView::open(&ctx).await?;
    let outcome = view.toggle_publish(id).await;
    mutation(outcome, view.snapshot())
}

/// Without `?confirm=true` this only returns the confirmation prompt.
async fn delete_event(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = ManageEventsView::open(&ctx).await?;
    let confirmation = view.request_delete(id).ok_or(ApiError::NotFound)?;
    if !params.confirm {
        return json(json!({
            "confirm": confirmation.prompt(),
            "event": confirmation,
        }));
    }
    let outcome = view.confirm_delete(confirmation).await;
    mutation(outcome, view.snapshot())
}

async fn review_applications(
    State(state): State<AppState>,
    auth: Auth,
    Query(params): Query<StatusParams>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = ApplicationsView::open(&ctx).await?;
    view.set_status_filter(params.status);
    json(view.snapshot())
}

async fn decide(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = ApplicationsView::open(&ctx).await?;
    let outcome = view.decide(id, req.decision).await;
    mutation(outcome, view.snapshot())
}

// ── Participant and account views ───────────────────────────────────────

async fn my_applications(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(MyApplicationsView::open(&ctx).await?.snapshot())
}

async fn dashboard(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(DashboardView::open(&ctx).await?)
}

async fn profile(State(state): State<AppState>, auth: Auth) -> ApiResult {
    let ctx = context(&state, auth)?;
    json(ProfileView::open(&ctx).await?.snapshot())
}

async fn update_profile(State(state): State<AppState>, auth: Auth, Json(form): Json<ProfileForm>) -> ApiResult {
    let ctx = context(&state, auth)?;
    let view = ProfileView::open(&ctx).await?;
    view.set_form(form);
    let outcome = view.save().await;
    mutation(outcome, view.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use connect_client::SessionHub;
    use connect_db::Database;
    use connect_types::models::Role;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::{AppStateInner, SharedBackend};

    fn app() -> (Router, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = Arc::new(AppStateInner {
            backend: SharedBackend::Local(db.clone()),
            hub: SessionHub::new(),
        });
        (router(state), db)
    }

    fn get(uri: &str, token: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn gated_routes_redirect() {
        let (app, db) = app();
        let ada = db.register("ada@example.org", Role::Participant).unwrap();

        let response = app.clone().oneshot(get("/api/applications", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        let response = app
            .oneshot(get("/api/applications", Some(ada.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    }

    #[tokio::test]
    async fn incomplete_accounts_get_conflict() {
        let (app, db) = app();
        let half = db.register_without_profile("half@example.org").unwrap();

        let response = app.oneshot(get("/api/dashboard", Some(half.id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn public_catalog_and_nav_need_no_token() {
        let (app, _db) = app();

        let response = app.clone().oneshot(get("/api/events?search=robotics", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["criteria"]["search"], "robotics");
        assert_eq!(body["events"], Value::Array(Vec::new()));

        let response = app.oneshot(get("/api/nav", None)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["signed_in"], false);
        assert_eq!(body["items"][2]["route"], "/login");
    }

    #[tokio::test]
    async fn malformed_local_tokens_are_rejected() {
        let (app, _db) = app();
        let request = Request::builder()
            .uri("/api/nav")
            .header(header::AUTHORIZATION, "Bearer not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
