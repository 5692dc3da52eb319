use std::fmt;

use connect_types::models::Role;
use serde::Serialize;
use uuid::Uuid;

use crate::gate::Requirement;
use crate::session::Session;

/// Every navigable page. Paths map 1:1 onto views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Events,
    EventDetail(Uuid),
    Organizations,
    Login,
    Register,
    Dashboard,
    Profile,
    ManageEvents,
    CreateEvent,
    Applications,
    MyApplications,
}

impl Route {
    pub fn path(self) -> String {
        match self {
            Self::EventDetail(id) => format!("/events/{}", id),
            other => other.static_path().to_string(),
        }
    }

    fn static_path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Events => "/events",
            Self::EventDetail(_) => "/events/{id}",
            Self::Organizations => "/organizations",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Profile => "/profile",
            Self::ManageEvents => "/events/manage",
            Self::CreateEvent => "/events/create",
            Self::Applications => "/applications",
            Self::MyApplications => "/my-applications",
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        let route = match path {
            "/" => Self::Home,
            "/events" => Self::Events,
            "/organizations" => Self::Organizations,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/profile" => Self::Profile,
            "/events/manage" => Self::ManageEvents,
            "/events/create" => Self::CreateEvent,
            "/applications" => Self::Applications,
            "/my-applications" => Self::MyApplications,
            other => {
                let id = other.strip_prefix("/events/")?;
                Self::EventDetail(Uuid::parse_str(id).ok()?)
            }
        };
        Some(route)
    }

    /// Who may open this page.
    pub fn requirement(self) -> Requirement {
        match self {
            Self::Home
            | Self::Events
            | Self::EventDetail(_)
            | Self::Organizations
            | Self::Login
            | Self::Register => Requirement::Public,
            Self::Dashboard | Self::Profile => Requirement::SignedIn,
            Self::ManageEvents | Self::CreateEvent | Self::Applications => {
                Requirement::Role(Role::Organization)
            }
            Self::MyApplications => Requirement::Role(Role::Participant),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

/// A labelled link in the navigation bar or a dashboard action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

impl NavItem {
    const fn new(label: &'static str, route: Route) -> Self {
        Self { label, route }
    }
}

/// Navigation links for this session.
///
/// A signed-in user without a loaded profile sees only the public links.
pub fn nav_items(session: &Session) -> Vec<NavItem> {
    let mut items = vec![
        NavItem::new("Events", Route::Events),
        NavItem::new("Organizations", Route::Organizations),
    ];

    if !session.is_signed_in() {
        items.push(NavItem::new("Login", Route::Login));
        items.push(NavItem::new("Register", Route::Register));
        return items;
    }

    match session.role() {
        Some(Role::Participant) => {
            items.push(NavItem::new("Dashboard", Route::Dashboard));
            items.push(NavItem::new("My Applications", Route::MyApplications));
        }
        Some(Role::Organization) => {
            items.push(NavItem::new("Dashboard", Route::Dashboard));
            items.push(NavItem::new("Create Event", Route::CreateEvent));
            items.push(NavItem::new("Manage Events", Route::ManageEvents));
            items.push(NavItem::new("Applications", Route::Applications));
        }
        None => {}
    }
    items
}
