pub mod api;
pub mod backend;
pub mod events;
pub mod models;
pub mod query;

pub use backend::{Backend, BackendError};
pub use query::{Query, Row, Table};
