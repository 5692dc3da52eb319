use connect_types::models::Role;
use serde::Serialize;
use tracing::debug;

use crate::error::ViewError;
use crate::routes::Route;
use crate::session::{ProfileState, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum Requirement {
    Public,
    /// Any signed-in user with a profile.
    SignedIn,
    Role(Role),
}

/// Where a protected view stands. Every state but `Loading` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    Loading,
    Denied,
    WrongRole { required: Role, actual: Role },
    Incomplete,
    Granted,
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    pub fn redirect(&self) -> Option<Route> {
        match self {
            Self::Denied => Some(Route::Login),
            Self::WrongRole { .. } => Some(Route::Dashboard),
            Self::Loading | Self::Incomplete | Self::Granted => None,
        }
    }

    /// `Ok` only when granted. An unresolved gate admits nobody.
    pub fn check(&self) -> Result<(), ViewError> {
        match self {
            Self::Granted => Ok(()),
            Self::Loading | Self::Denied => Err(ViewError::AuthRequired),
            Self::WrongRole { required, actual } => Err(ViewError::RoleMismatch {
                required: *required,
                actual: *actual,
            }),
            Self::Incomplete => Err(ViewError::ProfileIncomplete),
        }
    }
}

/// Decides once whether a session may see a view.
#[derive(Debug, Clone)]
pub struct AccessGate {
    requirement: Requirement,
    state: GateState,
}

impl AccessGate {
    pub fn new(requirement: Requirement) -> Self {
        Self {
            requirement,
            state: GateState::Loading,
        }
    }

    pub fn for_route(route: Route) -> Self {
        Self::new(route.requirement())
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Moves out of `Loading`. Later calls keep the first verdict: denial
    /// is never retried.
    pub fn resolve(&mut self, session: &Session) -> &GateState {
        if !self.state.is_terminal() {
            self.state = evaluate(self.requirement, session);
            debug!("Gate for {:?} resolved to {:?}", self.requirement, self.state);
        }
        &self.state
    }

    /// Resolves against `session` and converts the verdict into a result.
    pub fn admit(mut self, session: &Session) -> Result<(), ViewError> {
        self.resolve(session).check()
    }
}

pub fn evaluate(requirement: Requirement, session: &Session) -> GateState {
    let profile = match (requirement, session) {
        (Requirement::Public, _) => return GateState::Granted,
        (_, Session::Anonymous) => return GateState::Denied,
        (_, Session::SignedIn { profile, .. }) => profile,
    };

    let profile = match profile {
        ProfileState::Ready(profile) => profile,
        ProfileState::NotSetUp | ProfileState::Unavailable => return GateState::Incomplete,
    };

    match requirement {
        Requirement::Role(required) if profile.role() != required => GateState::WrongRole {
            required,
            actual: profile.role(),
        },
        _ => GateState::Granted,
    }
}
