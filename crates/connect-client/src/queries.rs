//! One function per read a view performs. Each builds an explicit [`Query`]
//! and decodes the rows into typed models.

use connect_types::models::{
    Application, CatalogEvent, Event, Organization, ParticipantApplication, Profile,
    ReviewApplication, Role,
};
use connect_types::query::{Embed, Order, from_row};
use connect_types::{Backend, BackendError, Query, Row, Table};
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

fn organizer() -> Embed {
    Embed::new("organization", Table::Profiles, "organization_id").columns(&["organization_name"])
}

pub fn catalog_query() -> Query {
    Query::list(Table::Events, Order::asc("start_date"))
        .embed(organizer())
        .eq("is_published", true)
}

pub fn event_detail_query(id: Uuid) -> Query {
    Query::by_id(Table::Events, id).embed(organizer())
}

pub fn managed_events_query(organization: Uuid) -> Query {
    Query::list(Table::Events, Order::desc("created_at")).eq("organization_id", organization.to_string())
}

/// Inner join on the event so other organizations' applications are
/// dropped rather than returned with a null event.
pub fn review_query(organization: Uuid) -> Query {
    Query::list(Table::Applications, Order::desc("created_at"))
        .embed(
            Embed::new("event", Table::Events, "event_id")
                .columns(&["id", "title", "start_date", "location", "organization_id"])
                .inner(),
        )
        .embed(
            Embed::new("participant", Table::Profiles, "participant_id")
                .columns(&["first_name", "last_name", "age", "bio"]),
        )
        .eq("event.organization_id", organization.to_string())
}

pub fn my_applications_query(participant: Uuid) -> Query {
    Query::list(Table::Applications, Order::desc("created_at"))
        .embed(Embed::new("event", Table::Events, "event_id"))
        .eq("participant_id", participant.to_string())
}

pub fn organizations_query() -> Query {
    Query::list(Table::Profiles, Order::desc("created_at"))
        .columns(&["id", "organization_name", "website", "location", "bio", "created_at"])
        .eq("user_type", Role::Organization.as_str())
        .not_null("organization_name")
}

/// Application ids for a set of events, for counting what an organization
/// has received without the review join.
pub fn received_applications_query(events: &[Uuid]) -> Query {
    Query::list(Table::Applications, Order::desc("created_at"))
        .columns(&["id", "event_id"])
        .is_in("event_id", events.iter().map(|id| id.to_string()))
}

pub fn profile_query(id: Uuid) -> Query {
    Query::by_id(Table::Profiles, id)
}

pub fn existing_application_query(event: Uuid, participant: Uuid) -> Query {
    Query::list(Table::Applications, Order::desc("created_at"))
        .eq("event_id", event.to_string())
        .eq("participant_id", participant.to_string())
}

/// Published events with organizer names, soonest first.
pub async fn catalog<B: Backend>(backend: &B) -> Result<Vec<CatalogEvent>, BackendError> {
    let mut events: Vec<CatalogEvent> = decode_all("catalog event", backend.select(&catalog_query()).await?);

    // The filter is part of the query; a backend that ignores it still must
    // not leak drafts into the catalog.
    let before = events.len();
    events.retain(|e| e.event.is_published);
    if events.len() != before {
        warn!("Catalog read returned {} unpublished events", before - events.len());
    }
    Ok(events)
}

pub async fn event_detail<B: Backend>(backend: &B, id: Uuid) -> Result<Option<CatalogEvent>, BackendError> {
    decode_first(backend.select(&event_detail_query(id)).await?)
}

pub async fn managed_events<B: Backend>(backend: &B, organization: Uuid) -> Result<Vec<Event>, BackendError> {
    Ok(decode_all("event", backend.select(&managed_events_query(organization)).await?))
}

pub async fn review_applications<B: Backend>(
    backend: &B,
    organization: Uuid,
) -> Result<Vec<ReviewApplication>, BackendError> {
    Ok(decode_all("application", backend.select(&review_query(organization)).await?))
}

pub async fn my_applications<B: Backend>(
    backend: &B,
    participant: Uuid,
) -> Result<Vec<ParticipantApplication>, BackendError> {
    Ok(decode_all(
        "application",
        backend.select(&my_applications_query(participant)).await?,
    ))
}

pub async fn organizations<B: Backend>(backend: &B) -> Result<Vec<Organization>, BackendError> {
    Ok(decode_all("organization", backend.select(&organizations_query()).await?))
}

pub async fn received_application_count<B: Backend>(
    backend: &B,
    events: &[Uuid],
) -> Result<usize, BackendError> {
    if events.is_empty() {
        return Ok(0);
    }
    Ok(backend.select(&received_applications_query(events)).await?.len())
}

pub async fn profile<B: Backend>(backend: &B, id: Uuid) -> Result<Option<Profile>, BackendError> {
    decode_first(backend.select(&profile_query(id)).await?)
}

/// This participant's application to the event, if they already applied.
pub async fn existing_application<B: Backend>(
    backend: &B,
    event: Uuid,
    participant: Uuid,
) -> Result<Option<Application>, BackendError> {
    decode_first(
        backend
            .select(&existing_application_query(event, participant))
            .await?,
    )
}

/// Rows that do not decode are logged and skipped so the rest still show.
fn decode_all<T: DeserializeOwned>(what: &str, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match from_row(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed {} row: {}", what, e);
                None
            }
        })
        .collect()
}

fn decode_first<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Option<T>, BackendError> {
    rows.into_iter().next().map(from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_types::query::{Direction, FilterOp, Shape};
    use serde_json::Value;

    #[test]
    fn every_list_read_is_ordered() {
        let id = Uuid::new_v4();
        let lists = [
            (catalog_query(), "start_date", Direction::Ascending),
            (managed_events_query(id), "created_at", Direction::Descending),
            (review_query(id), "created_at", Direction::Descending),
            (my_applications_query(id), "created_at", Direction::Descending),
            (organizations_query(), "created_at", Direction::Descending),
            (received_applications_query(&[id]), "created_at", Direction::Descending),
        ];
        for (query, column, direction) in lists {
            match query.shape {
                Shape::Many(order) => {
                    assert_eq!(order.column, column);
                    assert_eq!(order.direction, direction);
                }
                Shape::Single => panic!("{:?} should be a list read", query.table),
            }
        }
        assert!(profile_query(id).is_single());
        assert!(event_detail_query(id).is_single());
    }

    #[test]
    fn catalog_filters_on_published() {
        let query = catalog_query();
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].column, "is_published");
        assert_eq!(query.filters[0].op, FilterOp::Eq(Value::Bool(true)));
        assert_eq!(query.embeds[0].alias, "organization");
    }

    #[test]
    fn review_joins_events_inner_and_filters_through_them() {
        let me = Uuid::new_v4();
        let query = review_query(me);
        let event = &query.embeds[0];
        assert_eq!(event.alias, "event");
        assert!(event.inner);
        assert!(!query.embeds[1].inner);
        assert_eq!(query.filters[0].target(), (Some("event"), "organization_id"));
        assert_eq!(query.filters[0].op, FilterOp::Eq(Value::String(me.to_string())));
    }

    #[test]
    fn organizations_need_a_name() {
        let query = organizations_query();
        assert!(
            query
                .filters
                .iter()
                .any(|f| f.column == "organization_name" && f.op == FilterOp::NotNull)
        );
        assert!(
            query
                .filters
                .iter()
                .any(|f| f.column == "user_type" && f.op == FilterOp::Eq(Value::from("organization")))
        );
    }

    #[test]
    fn received_applications_match_any_of_the_events() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let query = received_applications_query(&[a, b]);
        assert!(query.embeds.is_empty());
        assert_eq!(query.filters[0].column, "event_id");
        assert_eq!(
            query.filters[0].op,
            FilterOp::In(vec![Value::from(a.to_string()), Value::from(b.to_string())])
        );
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let good = serde_json::json!({
            "id": Uuid::new_v4(),
            "event_id": Uuid::new_v4(),
            "participant_id": Uuid::new_v4(),
            "motivation_letter": "Count me in.",
            "status": "pending",
            "created_at": "2025-06-01T09:00:00Z",
            "updated_at": "2025-06-01T09:00:00Z",
        });
        let mut bad = good.clone();
        bad["id"] = Value::from("not-a-uuid");

        let rows = [good, bad]
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        let decoded: Vec<Application> = decode_all("application", rows);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].motivation_letter, "Count me in.");
    }
}
