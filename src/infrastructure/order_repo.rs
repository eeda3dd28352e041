use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::PendingEvent;
use crate::domain::order::{NewOrder, Order, OrderStatus, StatusChange};
use crate::domain::ports::{OrderCheck, OrderRepository, StatusDecision};
use crate::schema::orders;

use super::change_feed;
use super::models::{NewOrderRow, OrderRow};
use super::stats_repo::refresh_vendor_stats;

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    rows.into_iter().map(Order::try_from).collect()
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let row: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: Uuid::new_v4(),
                    customer_id: order.customer_id,
                    vendor_id: order.vendor_id,
                    service_id: order.service_id,
                    quantity: order.quantity,
                    status: OrderStatus::Pending.as_str().to_string(),
                    scheduled_time: order.scheduled_time,
                    total_price: order.total_price.clone(),
                    delivery_address: order.delivery_address.clone(),
                    notes: order.notes.clone(),
                })
                .get_result(conn)?;
            let created = Order::try_from(row)?;

            // 2. Keep the vendor aggregate in step with the new row
            refresh_vendor_stats(conn, created.vendor_id)?;

            // 3. Change-feed event in the same transaction
            change_feed::record(conn, PendingEvent::order_created(&created))?;

            Ok(created)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .optional()?;

        row.map(Order::try_from).transpose()
    }

    fn list_for_customer(
        &self,
        customer_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .select(OrderRow::as_select())
            .filter(orders::customer_id.eq(customer_id))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        let rows = query
            .order(orders::created_at.desc())
            .limit(limit)
            .load(&mut conn)?;
        decode(rows)
    }

    fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .select(OrderRow::as_select())
            .filter(orders::vendor_id.eq(vendor_id))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        let rows = query
            .order(orders::created_at.desc())
            .limit(limit)
            .load(&mut conn)?;
        decode(rows)
    }

    fn change_status(&self, id: Uuid, decide: StatusDecision<'_>) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock: a concurrent update waits here and then sees our result.
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .for_update()
                .get_result::<OrderRow>(conn)
                .optional()?;
            let Some(row) = row else {
                return Err(DomainError::NotFound("Order"));
            };
            let current = Order::try_from(row)?;

            let next = match decide(&current)? {
                StatusChange::Unchanged => return Ok(current),
                StatusChange::To(next) => next,
            };

            let row: OrderRow = diesel::update(orders::table.find(id))
                .set((
                    orders::status.eq(next.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .get_result(conn)?;
            let updated = Order::try_from(row)?;

            refresh_vendor_stats(conn, updated.vendor_id)?;
            change_feed::record(
                conn,
                PendingEvent::order_status_changed(&updated, current.status),
            )?;

            Ok(updated)
        })
    }

    fn mark_paid(&self, id: Uuid, check: OrderCheck<'_>) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .for_update()
                .get_result::<OrderRow>(conn)
                .optional()?;
            let Some(row) = row else {
                return Err(DomainError::NotFound("Order"));
            };
            let current = Order::try_from(row)?;
            check(&current)?;
            if current.is_paid {
                return Ok(current);
            }

            let row: OrderRow = diesel::update(orders::table.find(id))
                .set((orders::is_paid.eq(true), orders::updated_at.eq(Utc::now())))
                .get_result(conn)?;
            let paid = Order::try_from(row)?;
            change_feed::record(conn, PendingEvent::order_paid(&paid))?;
            Ok(paid)
        })
    }
}
