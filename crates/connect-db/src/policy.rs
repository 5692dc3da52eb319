//! Row-level policy, matching what the hosted backend enforces.
//!
//! Reads see only permitted rows. Writes to rows the actor may not touch
//! behave as if the row did not exist; writes that target a permitted row
//! but break a check are refused outright.

use connect_types::models::ApplicationStatus;
use connect_types::{BackendError, Row, Table};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

use crate::storage_error;

/// SQL predicate (and its parameters) restricting reads to visible rows.
pub(crate) fn visible(table: Table, actor: Option<Uuid>) -> (&'static str, Vec<SqlValue>) {
    let me = || actor.map_or(SqlValue::Null, |id| SqlValue::Text(id.to_string()));
    match table {
        Table::Profiles => ("1 = 1", vec![]),
        Table::Events => ("(is_published = 1 OR organization_id = ?)", vec![me()]),
        Table::Applications => (
            "(participant_id = ? OR event_id IN (SELECT id FROM events WHERE organization_id = ?))",
            vec![me(), me()],
        ),
    }
}

pub(crate) fn role_of(conn: &Connection, id: Uuid) -> Result<Option<String>, BackendError> {
    conn.query_row(
        "SELECT user_type FROM profiles WHERE id = ?1",
        [id.to_string()],
        |r| r.get(0),
    )
    .optional()
    .map_err(storage_error)
}

fn event_owner(conn: &Connection, event_id: &str) -> Result<Option<(String, bool)>, BackendError> {
    conn.query_row(
        "SELECT organization_id, is_published FROM events WHERE id = ?1",
        [event_id],
        |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? != 0)),
    )
    .optional()
    .map_err(storage_error)
}

fn text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

fn refuse(reason: &str) -> BackendError {
    BackendError::PolicyViolation(reason.to_string())
}

/// Checks a new row before it is written.
pub(crate) fn check_insert(
    conn: &Connection,
    actor: Uuid,
    table: Table,
    row: &Row,
) -> Result<(), BackendError> {
    let me = actor.to_string();
    match table {
        Table::Profiles => {
            if text(row, "id") != Some(me.as_str()) {
                return Err(refuse("profiles can only be created for yourself"));
            }
        }
        Table::Events => {
            if text(row, "organization_id") != Some(me.as_str()) {
                return Err(refuse("events must be owned by the creating organization"));
            }
            if role_of(conn, actor)?.as_deref() != Some("organization") {
                return Err(refuse("only organizations can create events"));
            }
        }
        Table::Applications => {
            if text(row, "participant_id") != Some(me.as_str()) {
                return Err(refuse("applications must be submitted as yourself"));
            }
            if role_of(conn, actor)?.as_deref() != Some("participant") {
                return Err(refuse("only participants can apply"));
            }
            if text(row, "status") != Some(ApplicationStatus::Pending.as_str()) {
                return Err(refuse("new applications must be pending"));
            }
            let event_id = text(row, "event_id").unwrap_or_default();
            match event_owner(conn, event_id)? {
                Some((_, true)) => {}
                _ => return Err(refuse("applications require a published event")),
            }
        }
    }
    Ok(())
}

/// Whether `actor` may update `existing` at all. `false` hides the row.
pub(crate) fn may_update(
    conn: &Connection,
    actor: Uuid,
    table: Table,
    existing: &Row,
) -> Result<bool, BackendError> {
    let me = actor.to_string();
    Ok(match table {
        Table::Profiles => text(existing, "id") == Some(me.as_str()),
        Table::Events => text(existing, "organization_id") == Some(me.as_str()),
        Table::Applications => {
            let event_id = text(existing, "event_id").unwrap_or_default();
            matches!(event_owner(conn, event_id)?, Some((owner, _)) if owner == me)
        }
    })
}

/// Checks the columns an update is allowed to change.
pub(crate) fn check_update(table: Table, existing: &Row, patch: &Row) -> Result<(), BackendError> {
    match table {
        Table::Profiles => {
            if let Some(user_type) = patch.get("user_type") {
                if existing.get("user_type") != Some(user_type) {
                    return Err(refuse("a profile's role cannot change"));
                }
            }
        }
        Table::Events => {
            if let Some(owner) = patch.get("organization_id") {
                if existing.get("organization_id") != Some(owner) {
                    return Err(refuse("events cannot change owner"));
                }
            }
        }
        Table::Applications => {
            if patch.keys().any(|k| k != "status") {
                return Err(refuse("only an application's status can change"));
            }
            let current = status(existing.get("status"))?;
            let next = status(patch.get("status"))?;
            if !current.can_become(next) {
                return Err(refuse(&format!(
                    "status cannot move from {} to {}",
                    current, next
                )));
            }
        }
    }
    Ok(())
}

fn status(value: Option<&Value>) -> Result<ApplicationStatus, BackendError> {
    value
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(|| BackendError::InvalidRequest("invalid application status".into()))
}

/// Whether `actor` may delete `existing`. Applications are never deleted.
pub(crate) fn may_delete(actor: Uuid, table: Table, existing: &Row) -> bool {
    let me = actor.to_string();
    match table {
        Table::Events => text(existing, "organization_id") == Some(me.as_str()),
        Table::Profiles | Table::Applications => false,
    }
}
