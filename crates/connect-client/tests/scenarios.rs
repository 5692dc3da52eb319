use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use connect_client::filter::{CategoryFilter, StatusFilter};
use connect_client::views::{
    ApplicationsView, CatalogView, DashboardView, EventDetailView, ManageEventsView,
    MyApplicationsView, Navbar, OrganizationsView, ProfileView,
};
use connect_client::{AppContext, Outcome, Route, SessionHub, ViewError, queries};
use connect_db::{Database, LocalBackend};
use connect_types::models::{ApplicationStatus, Decision, Identity, Role};
use connect_types::{Backend, BackendError, Query, Row, Table};
use serde_json::json;
use tokio::sync::Notify;
use uuid::Uuid;

// ── Fixtures ──

struct World {
    db: Arc<Database>,
    hub: SessionHub,
}

impl World {
    fn new() -> Self {
        Self {
            db: Arc::new(Database::open_in_memory().unwrap()),
            hub: SessionHub::new(),
        }
    }

    fn register(&self, email: &str, role: Role) -> Identity {
        self.db.register(email, role).unwrap()
    }

    fn backend(&self, user: Option<&Identity>) -> LocalBackend {
        match user {
            Some(user) => LocalBackend::signed_in(self.db.clone(), user.id),
            None => LocalBackend::new(self.db.clone()),
        }
    }

    fn ctx(&self, user: Option<&Identity>) -> AppContext<LocalBackend> {
        self.wrap(self.backend(user))
    }

    fn wrap<B: Backend>(&self, backend: B) -> AppContext<B> {
        AppContext::new(Arc::new(backend), self.hub.clone())
    }

    async fn event(&self, org: &Identity, title: &str, category: &str, published: bool) -> Uuid {
        self.event_starting(org, title, category, published, "2025-06-01T09:00:00Z")
            .await
    }

    async fn event_starting(
        &self,
        org: &Identity,
        title: &str,
        category: &str,
        published: bool,
        start: &str,
    ) -> Uuid {
        let row = json!({
            "title": title,
            "description": format!("About {}", title),
            "start_date": start,
            "end_date": "2025-06-03T17:00:00Z",
            "location": "Porto, PT",
            "max_participants": 30,
            "category": category,
            "organization_id": org.id.to_string(),
            "is_published": published,
        });
        let stored = self
            .backend(Some(org))
            .insert(Table::Events, object(row))
            .await
            .unwrap();
        id_of(&stored)
    }

    async fn apply(&self, participant: &Identity, event: Uuid) -> Uuid {
        let row = json!({
            "event_id": event.to_string(),
            "participant_id": participant.id.to_string(),
            "motivation_letter": "I would love to join.",
        });
        let stored = self
            .backend(Some(participant))
            .insert(Table::Applications, object(row))
            .await
            .unwrap();
        id_of(&stored)
    }

    async fn name_organization(&self, org: &Identity, name: &str) {
        self.backend(Some(org))
            .update(Table::Profiles, org.id, object(json!({ "organization_name": name })))
            .await
            .unwrap();
    }
}

fn object(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn id_of(row: &Row) -> Uuid {
    row["id"].as_str().unwrap().parse().unwrap()
}

/// Counts calls on the way through.
struct Counting<B> {
    inner: B,
    selects: AtomicUsize,
    writes: AtomicUsize,
}

impl<B> Counting<B> {
    fn new(inner: B) -> Self {
        Self {
            inner,
            selects: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }
}

impl<B: Backend> Backend for Counting<B> {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        self.inner.current_identity().await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.inner.sign_out().await
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.inner.select(query).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(table, id, patch).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(table, id).await
    }
}

/// Holds every update until released, so tests can act mid-flight.
struct Held<B> {
    inner: B,
    entered: Notify,
    release: Notify,
}

impl<B> Held<B> {
    fn new(inner: B) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

impl<B: Backend> Backend for Held<B> {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        self.inner.current_identity().await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.inner.sign_out().await
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        self.inner.select(query).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, BackendError> {
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, BackendError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.update(table, id, patch).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
        self.inner.delete(table, id).await
    }
}

/// Every read fails.
struct Unreachable;

impl Backend for Unreachable {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn select(&self, _query: &Query) -> Result<Vec<Row>, BackendError> {
        Err(BackendError::Transport("connection refused".into()))
    }

    async fn insert(&self, _table: Table, _row: Row) -> Result<Row, BackendError> {
        Err(BackendError::Transport("connection refused".into()))
    }

    async fn update(&self, _table: Table, _id: Uuid, _patch: Row) -> Result<Row, BackendError> {
        Err(BackendError::Transport("connection refused".into()))
    }

    async fn delete(&self, _table: Table, _id: Uuid) -> Result<(), BackendError> {
        Err(BackendError::Transport("connection refused".into()))
    }
}

// ── Access gate ──

#[tokio::test]
async fn wrong_role_never_loads_the_view() {
    let world = World::new();
    let ada = world.register("ada@example.org", Role::Participant);
    let backend = Arc::new(Counting::new(world.backend(Some(&ada))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());

    let err = ManageEventsView::open(&ctx).await.err().unwrap();
    assert_eq!(
        err,
        ViewError::RoleMismatch {
            required: Role::Organization,
            actual: Role::Participant,
        }
    );
    assert_eq!(err.redirect(), Some(Route::Dashboard));
    // Only the profile read behind the gate; the event list was never queried.
    assert_eq!(backend.selects.load(Ordering::SeqCst), 1);

    let org = world.register("org@example.org", Role::Organization);
    let err = MyApplicationsView::open(&world.ctx(Some(&org))).await.err().unwrap();
    assert!(matches!(err, ViewError::RoleMismatch { .. }));
}

#[tokio::test]
async fn signed_out_users_are_sent_to_login() {
    let world = World::new();
    let ctx = world.ctx(None);

    let err = ApplicationsView::open(&ctx).await.err().unwrap();
    assert_eq!(err, ViewError::AuthRequired);
    assert_eq!(err.redirect(), Some(Route::Login));
    assert_eq!(DashboardView::open(&ctx).await.err(), Some(ViewError::AuthRequired));
}

#[tokio::test]
async fn missing_profile_is_incomplete() {
    let world = World::new();
    let half = world.db.register_without_profile("half@example.org").unwrap();
    let ctx = world.ctx(Some(&half));

    let err = DashboardView::open(&ctx).await.err().unwrap();
    assert_eq!(err, ViewError::ProfileIncomplete);
    assert_eq!(err.redirect(), None);

    let navbar = Navbar::open(&ctx).await;
    assert_eq!(navbar.display_name().as_deref(), Some("half@example.org"));
    assert_eq!(navbar.items().len(), 2);
}

// ── Catalog and search ──

#[tokio::test]
async fn catalog_shows_only_published_events() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    world.event(&org, "Open Day", "Civic", true).await;
    world.event(&org, "Secret Draft", "Civic", false).await;

    for ctx in [world.ctx(None), world.ctx(Some(&ada)), world.ctx(Some(&org))] {
        let catalog = CatalogView::open(&ctx).await;
        let titles: Vec<_> = catalog.visible().into_iter().map(|e| e.event.title).collect();
        assert_eq!(titles, ["Open Day"]);
    }
}

#[tokio::test]
async fn catalog_orders_by_start_time_across_offsets() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    world
        .event_starting(&org, "Later", "Civic", true, "2025-06-01T09:00:00Z")
        .await;
    world
        .event_starting(&org, "Earlier", "Civic", true, "2025-06-01T10:00:00+02:00")
        .await;

    let catalog = CatalogView::open(&world.ctx(None)).await;
    let titles: Vec<_> = catalog.visible().into_iter().map(|e| e.event.title).collect();
    assert_eq!(titles, ["Earlier", "Later"]);
}

#[tokio::test]
async fn searching_robotics_finds_the_bootcamp() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    world.name_organization(&org, "Maker Guild").await;
    world.event(&org, "Robotics Bootcamp", "STEM", true).await;
    world.event(&org, "Youth Forum", "Civic", true).await;
    world.event(&org, "Art Lab", "Arts", true).await;

    let catalog = CatalogView::open(&world.ctx(None)).await;
    catalog.set_search("robotics");
    let hits = catalog.visible();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].event.title, "Robotics Bootcamp");
    assert_eq!(hits[0].organizer_name(), "Maker Guild");

    catalog.set_search("");
    catalog.set_category(CategoryFilter::from("Arts"));
    assert_eq!(catalog.visible()[0].event.title, "Art Lab");
    assert_eq!(catalog.categories().len(), 4);

    catalog.set_category(CategoryFilter::from("Sports"));
    assert_eq!(
        catalog.empty_message(),
        Some("Try adjusting your search or filter criteria.")
    );
}

#[tokio::test]
async fn failed_reads_render_empty_but_keep_the_error() {
    let world = World::new();
    let ctx = world.wrap(Unreachable);

    let catalog = CatalogView::open(&ctx).await;
    assert!(catalog.visible().is_empty());
    assert!(matches!(
        catalog.listing().load_error,
        Some(BackendError::Transport(_))
    ));
    assert_eq!(
        catalog.empty_message(),
        Some("No events are currently available. Check back later!")
    );

    let orgs = OrganizationsView::open(&ctx).await;
    assert!(orgs.visible().is_empty());
    assert!(orgs.listing().load_error.is_some());
}

#[tokio::test]
async fn organizations_directory_lists_named_organizations() {
    let world = World::new();
    let named = world.register("green@example.org", Role::Organization);
    world.name_organization(&named, "Green Steps").await;
    world.register("unnamed@example.org", Role::Organization);
    world.register("ada@example.org", Role::Participant);

    let view = OrganizationsView::open(&world.ctx(None)).await;
    let names: Vec<_> = view.visible().into_iter().map(|o| o.organization_name).collect();
    assert_eq!(names, ["Green Steps"]);

    view.set_search("nothing like it");
    assert_eq!(
        view.snapshot().empty_message,
        Some("Try adjusting your search criteria.")
    );
}

// ── Event detail and applying ──

#[tokio::test]
async fn drafts_are_not_found_except_for_their_owner() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    let draft = world.event(&org, "Draft", "Civic", false).await;

    let err = EventDetailView::open(&world.ctx(Some(&ada)), draft).await.err();
    assert_eq!(err, Some(ViewError::NotFound));
    assert!(EventDetailView::open(&world.ctx(Some(&org)), draft).await.is_ok());
    assert_eq!(
        EventDetailView::open(&world.ctx(None), Uuid::new_v4()).await.err(),
        Some(ViewError::NotFound)
    );
}

#[tokio::test]
async fn participants_apply_once_with_a_letter() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    let event = world.event(&org, "Open Day", "Civic", true).await;

    let view = EventDetailView::open(&world.ctx(Some(&ada)), event).await.unwrap();
    assert!(view.can_apply());
    assert_eq!(view.apply("   ").await, Outcome::Refused("motivation letter is required"));
    assert_eq!(view.apply("Count me in").await, Outcome::Applied);
    assert_eq!(view.application_status(), Some(ApplicationStatus::Pending));
    assert_eq!(view.apply("Again").await, Outcome::Refused("already applied"));

    // A fresh load remembers the application.
    let reopened = EventDetailView::open(&world.ctx(Some(&ada)), event).await.unwrap();
    assert!(!reopened.can_apply());

    let as_org = EventDetailView::open(&world.ctx(Some(&org)), event).await.unwrap();
    assert_eq!(as_org.apply("hi").await, Outcome::Refused("organizations cannot apply"));
}

// ── Review ──

#[tokio::test]
async fn accepting_updates_the_row_and_removes_controls() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let rival = world.register("rival@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    let event = world.event(&org, "Open Day", "Civic", true).await;
    let other = world.event(&rival, "Elsewhere", "Civic", true).await;
    let app_1 = world.apply(&ada, event).await;
    world.apply(&ada, other).await;

    let backend = Arc::new(Counting::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());
    let view = ApplicationsView::open(&ctx).await.unwrap();

    // Only applications on this organization's events.
    assert_eq!(view.applications().len(), 1);
    assert_eq!(view.controls_for(app_1), [Decision::Accept, Decision::Reject]);

    let selects = backend.selects.load(Ordering::SeqCst);
    assert_eq!(view.decide(app_1, Decision::Accept).await, Outcome::Applied);
    assert_eq!(backend.selects.load(Ordering::SeqCst), selects, "no re-fetch");

    let row = view.find(app_1).unwrap();
    assert_eq!(row.application.status, ApplicationStatus::Accepted);
    assert!(view.controls_for(app_1).is_empty());
    assert_eq!(
        view.decide(app_1, Decision::Reject).await,
        Outcome::Refused("application was already decided")
    );

    view.set_status_filter(StatusFilter::Pending);
    let snapshot = view.snapshot();
    assert!(snapshot.applications.is_empty());
    assert_eq!(snapshot.counts.accepted, 1);
    assert_eq!(
        snapshot.empty_message.as_deref(),
        Some("No pending applications found.")
    );

    let mine = MyApplicationsView::open(&world.ctx(Some(&ada))).await.unwrap();
    let accepted = mine
        .applications()
        .iter()
        .find(|a| a.application.id == app_1)
        .unwrap();
    assert_eq!(accepted.application.status, ApplicationStatus::Accepted);
    assert_eq!(accepted.event.as_ref().unwrap().title, "Open Day");
}

#[tokio::test]
async fn a_second_decision_in_flight_is_busy() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    let event = world.event(&org, "Open Day", "Civic", true).await;
    let app = world.apply(&ada, event).await;

    let backend = Arc::new(Held::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());
    let view = ApplicationsView::open(&ctx).await.unwrap();

    let (first, second) = tokio::join!(view.decide(app, Decision::Accept), async {
        backend.entered.notified().await;
        let second = view.decide(app, Decision::Accept).await;
        backend.release.notify_one();
        second
    });
    assert_eq!(first, Outcome::Applied);
    assert_eq!(second, Outcome::Busy);
}

// ── Managing events ──

#[tokio::test]
async fn publish_toggle_round_trips_locally() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let event = world.event(&org, "Open Day", "Civic", false).await;

    let backend = Arc::new(Counting::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());
    let view = ManageEventsView::open(&ctx).await.unwrap();
    let selects = backend.selects.load(Ordering::SeqCst);

    assert_eq!(view.toggle_publish(event).await, Outcome::Applied);
    assert!(view.events()[0].is_published);
    let catalog = CatalogView::open(&world.ctx(None)).await;
    assert_eq!(catalog.visible().len(), 1);

    assert_eq!(view.toggle_publish(event).await, Outcome::Applied);
    assert!(!view.events()[0].is_published);
    assert_eq!(backend.selects.load(Ordering::SeqCst), selects);
    assert_eq!(backend.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delete_needs_confirmation_and_sticks() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    world.event(&org, "Keep", "Civic", true).await;
    let ev_5 = world.event(&org, "Remove", "Civic", true).await;

    let backend = Arc::new(Counting::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());
    let view = ManageEventsView::open(&ctx).await.unwrap();

    let confirmation = view.request_delete(ev_5).unwrap();
    assert_eq!(
        confirmation.prompt(),
        "Are you sure you want to delete this event? This action cannot be undone."
    );
    assert!(view.request_delete(Uuid::new_v4()).is_none());
    // Asking is not deleting.
    assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    assert_eq!(view.events().len(), 2);

    assert_eq!(view.confirm_delete(confirmation).await, Outcome::Applied);
    assert!(view.events().iter().all(|e| e.id != ev_5));

    let refetched = queries::managed_events(ctx.backend(), org.id).await.unwrap();
    assert_eq!(refetched.len(), 1);
    assert!(refetched.iter().all(|e| e.id != ev_5));
}

#[tokio::test]
async fn results_after_close_are_discarded() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let event = world.event(&org, "Open Day", "Civic", false).await;

    let backend = Arc::new(Held::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());
    let view = ManageEventsView::open(&ctx).await.unwrap();

    let (outcome, ()) = tokio::join!(view.toggle_publish(event), async {
        backend.entered.notified().await;
        view.close();
        backend.release.notify_one();
    });
    assert_eq!(outcome, Outcome::Discarded);
    assert!(!view.events()[0].is_published);
    assert_eq!(view.toggle_publish(event).await, Outcome::Discarded);
}

// ── Profile ──

#[tokio::test]
async fn profile_edits_survive_a_reload() {
    let world = World::new();
    let ada = world.register("ada@example.org", Role::Participant);
    let ctx = world.ctx(Some(&ada));

    let view = ProfileView::open(&ctx).await.unwrap();
    assert_eq!(view.snapshot().display_name, "ada@example.org");

    let form = view.start_editing();
    assert_eq!(form.first_name, None);
    assert!(view.edit(|f| {
        f.first_name = Some("Ada".into());
        f.last_name = Some("Lovelace".into());
        f.age = Some(28);
    }));
    assert_eq!(view.save().await, Outcome::Applied);
    assert!(!view.is_editing());
    assert_eq!(view.snapshot().display_name, "Ada Lovelace");

    let reloaded = ProfileView::open(&ctx).await.unwrap();
    let form = reloaded.start_editing();
    assert_eq!(form.first_name.as_deref(), Some("Ada"));
    assert_eq!(form.age, Some(28));
    assert_eq!(reloaded.profile().role(), Role::Participant);
}

#[tokio::test]
async fn cancelling_an_edit_sends_nothing() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let backend = Arc::new(Counting::new(world.backend(Some(&org))));
    let ctx = AppContext::new(backend.clone(), world.hub.clone());

    let view = ProfileView::open(&ctx).await.unwrap();
    view.start_editing();
    view.edit(|f| f.organization_name = Some("Renamed".into()));
    view.cancel();

    assert_eq!(view.save().await, Outcome::Refused("profile is not being edited"));
    assert!(!view.edit(|f| f.website = None));
    assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    assert_eq!(view.snapshot().display_name, "Organization");
}

// ── Dashboard and navigation ──

#[tokio::test]
async fn dashboard_actions_follow_the_role() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let rival = world.register("rival@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    world.name_organization(&org, "Green Steps").await;
    let live = world.event(&org, "Live", "Civic", true).await;
    world.event(&org, "Draft", "Civic", false).await;
    let elsewhere = world.event(&rival, "Elsewhere", "Civic", true).await;
    world.apply(&ada, live).await;
    world.apply(&ada, elsewhere).await;

    let dashboard = DashboardView::open(&world.ctx(Some(&org))).await.unwrap();
    assert_eq!(dashboard.display_name, "Green Steps");
    assert_eq!(dashboard.tagline, "Manage your events and applications");
    assert!(dashboard.actions.iter().any(|a| a.route == Route::ManageEvents));
    let stats = dashboard.stats.unwrap();
    assert_eq!(
        (stats.total_events, stats.published_events, stats.total_applications),
        (2, 1, 1)
    );

    let dashboard = DashboardView::open(&world.ctx(Some(&ada))).await.unwrap();
    assert!(dashboard.actions.iter().any(|a| a.route == Route::MyApplications));
    assert_eq!(dashboard.stats, None);
}

#[tokio::test]
async fn sign_out_reaches_every_open_view() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let event = world.event(&org, "Open Day", "Civic", false).await;
    let ctx = world.ctx(Some(&org));

    let navbar = Navbar::open(&ctx).await;
    let manage = ManageEventsView::open(&ctx).await.unwrap();
    assert_eq!(world.hub.subscriber_count(), 2);
    assert!(navbar.items().iter().any(|i| i.route == Route::Applications));

    assert_eq!(navbar.sign_out().await.unwrap(), Route::Home);
    assert!(!navbar.snapshot().signed_in);
    assert_eq!(
        manage.toggle_publish(event).await,
        Outcome::Refused("no longer signed in")
    );

    drop(manage);
    drop(navbar);
    assert_eq!(world.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn another_user_signing_out_leaves_open_views_alone() {
    let world = World::new();
    let org = world.register("org@example.org", Role::Organization);
    let ada = world.register("ada@example.org", Role::Participant);
    let event = world.event(&org, "Open Day", "Civic", false).await;

    let org_ctx = world.ctx(Some(&org));
    let ada_ctx = world.ctx(Some(&ada));
    let manage = ManageEventsView::open(&org_ctx).await.unwrap();
    let navbar = Navbar::open(&org_ctx).await;

    assert_eq!(ada_ctx.sign_out().await.unwrap(), Route::Home);

    assert_eq!(manage.toggle_publish(event).await, Outcome::Applied);
    assert!(!navbar.sync().await);
    assert!(navbar.snapshot().signed_in);

    // Its own user's sign-out still reaches it.
    org_ctx.sign_out().await.unwrap();
    assert_eq!(
        manage.toggle_publish(event).await,
        Outcome::Refused("no longer signed in")
    );
    assert!(navbar.sync().await);
    assert!(!navbar.snapshot().signed_in);
}

#[tokio::test]
async fn navbar_follows_sign_in() {
    let world = World::new();
    let ada = world.register("ada@example.org", Role::Participant);
    let backend = world.backend(None);
    let ctx = world.wrap(backend);

    let navbar = Navbar::open(&ctx).await;
    assert_eq!(navbar.display_name(), None);
    assert!(!navbar.sync().await);

    world.hub.publish(connect_types::events::IdentityChange::SignedIn {
        identity: ada.clone(),
    });
    // The snapshot carries the identity; the profile load runs as the
    // context's backend, which can read any profile.
    assert!(navbar.sync().await);
    assert_eq!(navbar.display_name().as_deref(), Some("ada@example.org"));
    assert!(navbar.items().iter().any(|i| i.route == Route::MyApplications));
}
