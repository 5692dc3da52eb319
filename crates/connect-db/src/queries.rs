use chrono::Utc;
use connect_types::models::{Identity, Role};
use connect_types::query::{Columns, Direction, Embed, Filter, FilterOp, Query, Shape};
use connect_types::{BackendError, Row, Table};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{self, MANAGED_COLUMNS};
use crate::{Database, policy, storage_error};

pub(crate) fn now() -> String {
    models::canonical(Utc::now())
}

impl Database {
    // -- Auth users --

    /// Registers a user and their profile, as the sign-up flow would.
    pub fn register(&self, email: &str, role: Role) -> Result<Identity, BackendError> {
        let id = Uuid::new_v4();
        let created = now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO auth_users (id, email, created_at) VALUES (?1, ?2, ?3)",
                (id.to_string(), email, &created),
            )
            .map_err(storage_error)?;
            conn.execute(
                "INSERT INTO profiles (id, user_type, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                (id.to_string(), role.as_str(), &created),
            )
            .map_err(storage_error)?;
            Ok(())
        })?;

        Ok(Identity {
            id,
            email: Some(email.to_string()),
        })
    }

    /// Registers an auth user without a profile (sign-up not finished).
    pub fn register_without_profile(&self, email: &str) -> Result<Identity, BackendError> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO auth_users (id, email, created_at) VALUES (?1, ?2, ?3)",
                (id.to_string(), email, now()),
            )
            .map_err(storage_error)?;
            Ok(())
        })?;

        Ok(Identity {
            id,
            email: Some(email.to_string()),
        })
    }

    pub fn get_identity(&self, id: Uuid) -> Result<Option<Identity>, BackendError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT email FROM auth_users WHERE id = ?1",
                [id.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map_err(storage_error)
            .map(|email| email.map(|email| Identity { id, email }))
        })
    }

    // -- Table access on behalf of an actor --

    pub fn select(&self, actor: Option<Uuid>, query: &Query) -> Result<Vec<Row>, BackendError> {
        self.with_conn(|conn| select(conn, actor, query))
    }

    pub fn insert(&self, actor: Option<Uuid>, table: Table, row: Row) -> Result<Row, BackendError> {
        self.with_conn(|conn| insert(conn, actor, table, row))
    }

    pub fn update(
        &self,
        actor: Option<Uuid>,
        table: Table,
        id: Uuid,
        patch: Row,
    ) -> Result<Row, BackendError> {
        self.with_conn(|conn| update(conn, actor, table, id, patch))
    }

    pub fn delete(&self, actor: Option<Uuid>, table: Table, id: Uuid) -> Result<(), BackendError> {
        self.with_conn(|conn| delete(conn, actor, table, id))
    }
}

fn select(conn: &Connection, actor: Option<Uuid>, query: &Query) -> Result<Vec<Row>, BackendError> {
    let table = query.table;
    let (visibility, mut params) = policy::visible(table, actor);
    let mut clauses = vec![visibility.to_string()];

    let mut embedded_filters: Vec<(&Embed, &str, &FilterOp)> = Vec::new();
    for filter in &query.filters {
        match filter.target() {
            (None, column) => clauses.push(filter_sql(table, column, &filter.op, &mut params)?),
            (Some(alias), column) => {
                let embed = query
                    .embeds
                    .iter()
                    .find(|e| e.alias == alias)
                    .ok_or_else(|| unknown_embed(filter))?;
                models::column(embed.table, column)?;
                embedded_filters.push((embed, column, &filter.op));
            }
        }
    }

    let mut sql = format!(
        "SELECT {} FROM {} WHERE {}",
        models::column_list(table),
        table.name(),
        clauses.join(" AND ")
    );
    match query.shape {
        Shape::Many(order) => {
            models::column(table, order.column)?;
            let dir = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}, rowid {}", order.column, dir, dir));
        }
        Shape::Single => sql.push_str(" LIMIT 1"),
    }

    debug!("select: {}", sql);
    let mut rows = fetch(conn, table, &sql, params)?;

    for embed in &query.embeds {
        models::column(table, embed.foreign_key)?;
        let filters: Vec<_> = embedded_filters
            .iter()
            .filter(|(e, _, _)| e.alias == embed.alias)
            .map(|(_, column, op)| (*column, *op))
            .collect();

        let mut kept = Vec::with_capacity(rows.len());
        for mut row in rows {
            let related = match row.get(embed.foreign_key).and_then(Value::as_str) {
                Some(key) => fetch_visible(conn, actor, embed.table, key)?,
                None => None,
            };
            let related = related.filter(|r| filters.iter().all(|(c, op)| matches(r.get(*c), op)));

            match related {
                Some(related) => {
                    row.insert(embed.alias.to_string(), Value::Object(project(related, &embed.columns)));
                    kept.push(row);
                }
                None if embed.inner => {}
                None => {
                    row.insert(embed.alias.to_string(), Value::Null);
                    kept.push(row);
                }
            }
        }
        rows = kept;
    }

    let aliases: Vec<&str> = query.embeds.iter().map(|e| e.alias).collect();
    Ok(rows
        .into_iter()
        .map(|row| project_with(row, &query.columns, &aliases))
        .collect())
}

fn unknown_embed(filter: &Filter) -> BackendError {
    BackendError::InvalidRequest(format!("filter on {} names no embedded relation", filter.column))
}

fn filter_sql(
    table: Table,
    column: &str,
    op: &FilterOp,
    params: &mut Vec<SqlValue>,
) -> Result<String, BackendError> {
    let col = models::column(table, column)?;
    Ok(match op {
        FilterOp::Eq(Value::Null) => format!("{} IS NULL", column),
        FilterOp::Eq(value) => {
            params.push(models::to_sql(col, value)?);
            format!("{} = ?", column)
        }
        FilterOp::In(values) if values.is_empty() => "0 = 1".to_string(),
        FilterOp::In(values) => {
            for value in values {
                params.push(models::to_sql(col, value)?);
            }
            let marks = vec!["?"; values.len()].join(", ");
            format!("{} IN ({})", column, marks)
        }
        FilterOp::NotNull => format!("{} IS NOT NULL", column),
    })
}

/// Evaluates a filter against an already-fetched JSON value.
fn matches(value: Option<&Value>, op: &FilterOp) -> bool {
    let value = value.unwrap_or(&Value::Null);
    match op {
        FilterOp::Eq(expected) => value == expected,
        FilterOp::In(options) => options.contains(value),
        FilterOp::NotNull => !value.is_null(),
    }
}

fn fetch(
    conn: &Connection,
    table: Table,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<Row>, BackendError> {
    let columns = models::columns(table);
    let mut stmt = conn.prepare(sql).map_err(storage_error)?;
    let mut cursor = stmt.query(params_from_iter(params)).map_err(storage_error)?;

    let mut rows = Vec::new();
    while let Some(sql_row) = cursor.next().map_err(storage_error)? {
        let mut row = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = sql_row.get_ref(idx).map_err(storage_error)?;
            row.insert(column.name.to_string(), models::from_sql(column, value)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn fetch_by_id(conn: &Connection, table: Table, id: &str) -> Result<Option<Row>, BackendError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        models::column_list(table),
        table.name()
    );
    Ok(fetch(conn, table, &sql, vec![SqlValue::Text(id.to_string())])?
        .into_iter()
        .next())
}

fn fetch_visible(
    conn: &Connection,
    actor: Option<Uuid>,
    table: Table,
    id: &str,
) -> Result<Option<Row>, BackendError> {
    let (visibility, mut params) = policy::visible(table, actor);
    params.push(SqlValue::Text(id.to_string()));
    let sql = format!(
        "SELECT {} FROM {} WHERE {} AND id = ?",
        models::column_list(table),
        table.name(),
        visibility
    );
    Ok(fetch(conn, table, &sql, params)?.into_iter().next())
}

fn project(row: Row, columns: &Columns) -> Row {
    project_with(row, columns, &[])
}

fn project_with(row: Row, columns: &Columns, keep: &[&str]) -> Row {
    match columns {
        Columns::All => row,
        Columns::Only(names) => row
            .into_iter()
            .filter(|(k, _)| names.contains(&k.as_str()) || keep.contains(&k.as_str()))
            .collect(),
    }
}

fn require_actor(actor: Option<Uuid>) -> Result<Uuid, BackendError> {
    actor.ok_or(BackendError::Unauthenticated)
}

fn reject_managed(row: &Row) -> Result<(), BackendError> {
    match row.keys().find(|k| MANAGED_COLUMNS.contains(&k.as_str()) && k.as_str() != "id") {
        Some(k) => Err(BackendError::InvalidRequest(format!("column {} is managed by the store", k))),
        None => Ok(()),
    }
}

fn insert(conn: &Connection, actor: Option<Uuid>, table: Table, mut row: Row) -> Result<Row, BackendError> {
    let actor = require_actor(actor)?;
    reject_managed(&row)?;

    let id = match row.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    let created = now();
    row.insert("id".into(), Value::String(id.clone()));
    row.insert("created_at".into(), Value::String(created.clone()));
    row.insert("updated_at".into(), Value::String(created));
    match table {
        Table::Applications => {
            row.entry("status")
                .or_insert_with(|| Value::String("pending".into()));
        }
        Table::Events => {
            row.entry("is_published").or_insert(Value::Bool(false));
        }
        Table::Profiles => {}
    }

    policy::check_insert(conn, actor, table, &row)?;

    let mut names = Vec::with_capacity(row.len());
    let mut params = Vec::with_capacity(row.len());
    for (name, value) in &row {
        let col = models::column(table, name)?;
        names.push(col.name);
        params.push(models::to_sql(col, value)?);
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        names.join(", "),
        vec!["?"; names.len()].join(", ")
    );
    conn.execute(&sql, params_from_iter(params))
        .map_err(storage_error)?;

    fetch_by_id(conn, table, &id)?
        .ok_or_else(|| BackendError::Storage(format!("inserted {} row {} vanished", table, id)))
}

fn update(
    conn: &Connection,
    actor: Option<Uuid>,
    table: Table,
    id: Uuid,
    patch: Row,
) -> Result<Row, BackendError> {
    let actor = require_actor(actor)?;
    if patch.is_empty() {
        return Err(BackendError::InvalidRequest("empty update".into()));
    }
    if patch.contains_key("id") {
        return Err(BackendError::InvalidRequest("primary keys cannot change".into()));
    }
    reject_managed(&patch)?;

    let key = id.to_string();
    let existing = match fetch_by_id(conn, table, &key)? {
        Some(row) if policy::may_update(conn, actor, table, &row)? => row,
        _ => return Err(BackendError::NoRowsAffected { table, id }),
    };
    policy::check_update(table, &existing, &patch)?;

    let mut sets = Vec::with_capacity(patch.len() + 1);
    let mut params = Vec::with_capacity(patch.len() + 2);
    for (name, value) in &patch {
        let col = models::column(table, name)?;
        sets.push(format!("{} = ?", col.name));
        params.push(models::to_sql(col, value)?);
    }
    sets.push("updated_at = ?".into());
    params.push(SqlValue::Text(now()));
    params.push(SqlValue::Text(key.clone()));

    let sql = format!("UPDATE {} SET {} WHERE id = ?", table.name(), sets.join(", "));
    conn.execute(&sql, params_from_iter(params))
        .map_err(storage_error)?;

    fetch_by_id(conn, table, &key)?.ok_or(BackendError::NoRowsAffected { table, id })
}

fn delete(conn: &Connection, actor: Option<Uuid>, table: Table, id: Uuid) -> Result<(), BackendError> {
    let actor = require_actor(actor)?;
    let key = id.to_string();
    match fetch_by_id(conn, table, &key)? {
        Some(row) if policy::may_delete(actor, table, &row) => {}
        _ => return Err(BackendError::NoRowsAffected { table, id }),
    }

    conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table.name()), [key])
        .map_err(storage_error)?;
    Ok(())
}
