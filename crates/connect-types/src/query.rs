use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::BackendError;

/// One row as exchanged with the backend: column name -> JSON value.
/// Embedded relations appear as nested objects under their alias.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Profiles,
    Events,
    Applications,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Events => "events",
            Self::Applications => "applications",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    All,
    Only(Vec<&'static str>),
}

/// A many-to-one relation pulled in alongside each base row, e.g.
/// `organization:organization_id(organization_name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub alias: &'static str,
    pub table: Table,
    /// Column on the base row holding the related row's id.
    pub foreign_key: &'static str,
    pub columns: Columns,
    /// Inner joins drop base rows whose related row is missing or filtered out.
    pub inner: bool,
}

impl Embed {
    pub fn new(alias: &'static str, table: Table, foreign_key: &'static str) -> Self {
        Self {
            alias,
            table,
            foreign_key,
            columns: Columns::All,
            inner: false,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = Columns::Only(columns.to_vec());
        self
    }

    pub fn inner(mut self) -> Self {
        self.inner = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    In(Vec<Value>),
    NotNull,
}

/// A predicate on a base column (`status`) or an embedded one (`event.organization_id`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    /// Splits `alias.column` into its parts; base columns have no alias.
    pub fn target(&self) -> (Option<&str>, &str) {
        match self.column.split_once('.') {
            Some((alias, column)) => (Some(alias), column),
            None => (None, self.column.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Descending,
        }
    }
}

/// List reads must name their order; single-row reads are keyed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Many(Order),
    Single,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub columns: Columns,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub shape: Shape,
}

impl Query {
    pub fn list(table: Table, order: Order) -> Self {
        Self {
            table,
            columns: Columns::All,
            embeds: Vec::new(),
            filters: Vec::new(),
            shape: Shape::Many(order),
        }
    }

    pub fn by_id(table: Table, id: Uuid) -> Self {
        Self {
            table,
            columns: Columns::All,
            embeds: Vec::new(),
            filters: Vec::new(),
            shape: Shape::Single,
        }
        .eq("id", id.to_string())
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = Columns::Only(columns.to_vec());
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: FilterOp::Eq(value.into()),
        });
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: FilterOp::NotNull,
        });
        self
    }

    pub fn is_single(&self) -> bool {
        matches!(self.shape, Shape::Single)
    }
}

/// Serializes a typed payload into a row for insert/update.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, BackendError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(BackendError::InvalidRequest(format!(
            "payload must be an object, got {}",
            other
        ))),
        Err(e) => Err(BackendError::InvalidRequest(e.to_string())),
    }
}

/// Deserializes a backend row into a typed model.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, BackendError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| BackendError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_id_is_a_single_keyed_read() {
        let id = Uuid::new_v4();
        let query = Query::by_id(Table::Events, id);
        assert!(query.is_single());
        assert_eq!(query.filters[0].column, "id");
        assert_eq!(query.filters[0].op, FilterOp::Eq(Value::String(id.to_string())));
    }

    #[test]
    fn filter_target_splits_embedded_columns() {
        let query = Query::list(Table::Applications, Order::desc("created_at"))
            .eq("event.organization_id", "x")
            .eq("status", "pending");
        assert_eq!(query.filters[0].target(), (Some("event"), "organization_id"));
        assert_eq!(query.filters[1].target(), (None, "status"));
    }

    #[test]
    fn to_row_rejects_non_objects() {
        assert!(to_row(&42).is_err());
        let row = to_row(&serde_json::json!({ "is_published": true })).unwrap();
        assert_eq!(row.get("is_published"), Some(&Value::Bool(true)));
    }
}
