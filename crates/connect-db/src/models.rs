//! Column layout of the stored tables and conversion between SQLite values
//! and the JSON values rows are exchanged in.

use chrono::{DateTime, SecondsFormat, Utc};
use connect_types::{BackendError, Table};
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Integer,
    /// Stored as 0/1, exchanged as JSON booleans.
    Bool,
    /// Stored as JSON text, exchanged as structured JSON.
    Json,
    /// RFC 3339 in, stored as fixed-width UTC text so ordering is by time.
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: Kind,
}

const fn col(name: &'static str, kind: Kind) -> Column {
    Column { name, kind }
}

const PROFILES: &[Column] = &[
    col("id", Kind::Text),
    col("user_type", Kind::Text),
    col("first_name", Kind::Text),
    col("last_name", Kind::Text),
    col("age", Kind::Integer),
    col("bio", Kind::Text),
    col("location", Kind::Text),
    col("organization_name", Kind::Text),
    col("website", Kind::Text),
    col("created_at", Kind::Timestamp),
    col("updated_at", Kind::Timestamp),
];

const EVENTS: &[Column] = &[
    col("id", Kind::Text),
    col("title", Kind::Text),
    col("description", Kind::Text),
    col("start_date", Kind::Timestamp),
    col("end_date", Kind::Timestamp),
    col("location", Kind::Text),
    col("max_participants", Kind::Integer),
    col("category", Kind::Text),
    col("organization_id", Kind::Text),
    col("is_published", Kind::Bool),
    col("image_url", Kind::Text),
    col("gallery_urls", Kind::Json),
    col("created_at", Kind::Timestamp),
    col("updated_at", Kind::Timestamp),
];

const APPLICATIONS: &[Column] = &[
    col("id", Kind::Text),
    col("event_id", Kind::Text),
    col("participant_id", Kind::Text),
    col("motivation_letter", Kind::Text),
    col("status", Kind::Text),
    col("created_at", Kind::Timestamp),
    col("updated_at", Kind::Timestamp),
];

/// Columns maintained by the store; writes may not set them.
pub const MANAGED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

pub fn columns(table: Table) -> &'static [Column] {
    match table {
        Table::Profiles => PROFILES,
        Table::Events => EVENTS,
        Table::Applications => APPLICATIONS,
    }
}

pub fn column(table: Table, name: &str) -> Result<&'static Column, BackendError> {
    columns(table)
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| BackendError::InvalidRequest(format!("unknown column {}.{}", table, name)))
}

/// Comma-separated column list in schema order, for `SELECT`.
pub fn column_list(table: Table) -> String {
    columns(table)
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn to_sql(column: &Column, value: &Value) -> Result<SqlValue, BackendError> {
    let mismatch = || {
        BackendError::InvalidRequest(format!("value {} does not fit column {}", value, column.name))
    };

    Ok(match (column.kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (Kind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
        (Kind::Integer, Value::Number(n)) => SqlValue::Integer(n.as_i64().ok_or_else(mismatch)?),
        (Kind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (Kind::Json, v) => SqlValue::Text(v.to_string()),
        (Kind::Timestamp, Value::String(s)) => SqlValue::Text(timestamp(s).ok_or_else(mismatch)?),
        _ => return Err(mismatch()),
    })
}

/// Normalizes an RFC 3339 timestamp to UTC with microsecond precision.
pub fn timestamp(value: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(value).ok()?;
    Some(canonical(parsed.with_timezone(&Utc)))
}

pub fn canonical(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_sql(column: &Column, value: ValueRef<'_>) -> Result<Value, BackendError> {
    let corrupt = |what: &str| {
        BackendError::Storage(format!("column {} holds {}", column.name, what))
    };

    Ok(match (column.kind, value) {
        (_, ValueRef::Null) => Value::Null,
        (Kind::Bool, ValueRef::Integer(i)) => Value::Bool(i != 0),
        (Kind::Integer, ValueRef::Integer(i)) => Value::Number(Number::from(i)),
        (Kind::Text | Kind::Timestamp, ValueRef::Text(t)) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
        (Kind::Json, ValueRef::Text(t)) => {
            serde_json::from_slice(t).map_err(|_| corrupt("invalid JSON"))?
        }
        (_, ValueRef::Real(_)) => return Err(corrupt("a real")),
        (_, ValueRef::Blob(_)) => return Err(corrupt("a blob")),
        _ => return Err(corrupt("a value of the wrong type")),
    })
}
