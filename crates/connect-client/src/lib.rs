//! Client data layer: session resolution, route access gating, entity
//! queries, mutations and the per-page view models built on top of them.
//!
//! Everything is generic over [`connect_types::Backend`], so the same views
//! run against the hosted service or the local database.

pub mod context;
pub mod error;
pub mod filter;
pub mod gate;
pub mod mutations;
pub mod profile;
pub mod queries;
pub mod routes;
pub mod session;
pub mod view;
pub mod views;

pub use context::AppContext;
pub use error::ViewError;
pub use gate::{AccessGate, GateState, Requirement};
pub use routes::Route;
pub use session::{ProfileState, Session, SessionHub};
pub use view::{Listing, Outcome};
