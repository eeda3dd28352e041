use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::{ChangeEvent, PendingEvent};
use crate::domain::ports::ChangeFeed;
use crate::schema::change_feed;

use super::models::{ChangeEventRow, NewChangeEventRow};

/// Appends an event to the change feed. Call it on the connection of the
/// transaction that performs the change it describes.
pub(crate) fn record(conn: &mut PgConnection, event: PendingEvent) -> Result<(), DomainError> {
    diesel::insert_into(change_feed::table)
        .values(&NewChangeEventRow {
            id: Uuid::new_v4(),
            aggregate_type: event.aggregate_type.to_string(),
            aggregate_id: event.aggregate_id,
            event_type: event.event_type.to_string(),
            payload: event.payload,
        })
        .execute(conn)?;
    Ok(())
}

pub struct DieselChangeFeed {
    pool: DbPool,
}

impl DieselChangeFeed {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ChangeFeed for DieselChangeFeed {
    fn events_for(&self, aggregate_id: &str) -> Result<Vec<ChangeEvent>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = change_feed::table
            .filter(change_feed::aggregate_id.eq(aggregate_id))
            .select(ChangeEventRow::as_select())
            .order(change_feed::created_at.asc())
            .load::<ChangeEventRow>(&mut conn)?;
        Ok(rows.into_iter().map(ChangeEvent::from).collect())
    }
}
