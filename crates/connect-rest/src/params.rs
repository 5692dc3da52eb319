//! Encoding of [`Query`] into PostgREST query-string parameters.

use connect_types::Query;
use connect_types::query::{Columns, Direction, FilterOp, Shape};
use serde_json::Value;

/// `select=` value: base columns followed by embedded relations,
/// e.g. `*,organization:organization_id(organization_name)`.
pub fn select_clause(query: &Query) -> String {
    let mut parts = vec![columns_clause(&query.columns)];
    for embed in &query.embeds {
        parts.push(format!(
            "{}:{}{}({})",
            embed.alias,
            embed.foreign_key,
            if embed.inner { "!inner" } else { "" },
            columns_clause(&embed.columns)
        ));
    }
    parts.join(",")
}

fn columns_clause(columns: &Columns) -> String {
    match columns {
        Columns::All => "*".to_string(),
        Columns::Only(names) => names.join(","),
    }
}

pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), select_clause(query))];

    for filter in &query.filters {
        let value = match &filter.op {
            FilterOp::Eq(Value::Null) => "is.null".to_string(),
            FilterOp::Eq(value) => format!("eq.{}", literal(value)),
            FilterOp::In(values) => format!(
                "in.({})",
                values.iter().map(quoted).collect::<Vec<_>>().join(",")
            ),
            FilterOp::NotNull => "not.is.null".to_string(),
        };
        pairs.push((filter.column.clone(), value));
    }

    match query.shape {
        Shape::Many(order) => {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        Shape::Single => pairs.push(("limit".to_string(), "1".to_string())),
    }

    pairs
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// List members are double-quoted so commas and parentheses survive.
fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_types::Table;
    use connect_types::query::{Embed, Order};
    use uuid::Uuid;

    fn pair<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn catalog_query_encodes_filter_join_and_order() {
        let query = Query::list(Table::Events, Order::asc("start_date"))
            .embed(Embed::new("organization", Table::Profiles, "organization_id").columns(&["organization_name"]))
            .eq("is_published", true);
        let pairs = query_pairs(&query);

        assert_eq!(
            pair(&pairs, "select"),
            Some("*,organization:organization_id(organization_name)")
        );
        assert_eq!(pair(&pairs, "is_published"), Some("eq.true"));
        assert_eq!(pair(&pairs, "order"), Some("start_date.asc"));
        assert_eq!(pair(&pairs, "limit"), None);
    }

    #[test]
    fn inner_embeds_and_embedded_filters() {
        let me = Uuid::new_v4();
        let query = Query::list(Table::Applications, Order::desc("created_at"))
            .embed(Embed::new("event", Table::Events, "event_id").columns(&["id", "title"]).inner())
            .eq("event.organization_id", me.to_string());
        let pairs = query_pairs(&query);

        assert_eq!(pair(&pairs, "select"), Some("*,event:event_id!inner(id,title)"));
        assert_eq!(pair(&pairs, "event.organization_id"), Some(format!("eq.{}", me).as_str()));
        assert_eq!(pair(&pairs, "order"), Some("created_at.desc"));
    }

    #[test]
    fn single_reads_limit_and_special_operators() {
        let id = Uuid::new_v4();
        let query = Query::by_id(Table::Profiles, id)
            .columns(&["id", "user_type"])
            .not_null("organization_name")
            .eq("website", Value::Null)
            .is_in("location", ["Porto, PT", "Say \"hi\""]);
        let pairs = query_pairs(&query);

        assert_eq!(pair(&pairs, "select"), Some("id,user_type"));
        assert_eq!(pair(&pairs, "limit"), Some("1"));
        assert_eq!(pair(&pairs, "order"), None);
        assert_eq!(pair(&pairs, "organization_name"), Some("not.is.null"));
        assert_eq!(pair(&pairs, "website"), Some("is.null"));
        assert_eq!(
            pair(&pairs, "location"),
            Some(r#"in.("Porto, PT","Say \"hi\"")"#)
        );
    }
}
