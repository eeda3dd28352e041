use bigdecimal::BigDecimal;
use diesel::dsl::{count_star, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::StatsRepository;
use crate::domain::stats::{StatsBuilder, VendorStats};
use crate::schema::{order_stats, orders, reviews};

use super::models::OrderStatsRow;

/// Recomputes the vendor's `order_stats` row from its orders and reviews.
///
/// Must run inside the transaction of the write that affects the aggregate.
/// The stats row is locked first so concurrent refreshes for one vendor
/// serialize instead of overwriting each other with stale counts.
pub(crate) fn refresh_vendor_stats(
    conn: &mut PgConnection,
    vendor_id: Uuid,
) -> Result<VendorStats, DomainError> {
    diesel::insert_into(order_stats::table)
        .values(&OrderStatsRow::from(&VendorStats::empty(vendor_id)))
        .on_conflict(order_stats::vendor_id)
        .do_nothing()
        .execute(conn)?;
    order_stats::table
        .find(vendor_id)
        .select(order_stats::vendor_id)
        .for_update()
        .get_result::<Uuid>(conn)?;

    let counts: Vec<(String, i64)> = orders::table
        .filter(orders::vendor_id.eq(vendor_id))
        .group_by(orders::status)
        .select((orders::status, count_star()))
        .load(conn)?;

    let earnings: Option<BigDecimal> = orders::table
        .filter(orders::vendor_id.eq(vendor_id))
        .filter(orders::status.eq(OrderStatus::Completed.as_str()))
        .select(sum(orders::total_price))
        .get_result(conn)?;

    let (rating_count, rating_sum): (i64, Option<i64>) = reviews::table
        .filter(reviews::vendor_id.eq(vendor_id))
        .select((count_star(), sum(reviews::rating)))
        .get_result(conn)?;

    let mut builder = StatsBuilder::new(vendor_id);
    for (status, count) in counts {
        let status = OrderStatus::from_stored(&status).ok_or_else(|| {
            DomainError::Internal(format!("malformed orders row: unknown status '{status}'"))
        })?;
        builder.add_orders(status, count);
    }
    if let Some(earnings) = earnings {
        builder.add_earnings(&earnings);
    }
    builder.add_ratings(rating_sum.unwrap_or(0), rating_count);
    let stats = builder.build();

    diesel::update(order_stats::table.find(vendor_id))
        .set(&OrderStatsRow::from(&stats))
        .execute(conn)?;

    Ok(stats)
}

pub struct DieselStatsRepository {
    pool: DbPool,
}

impl DieselStatsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl StatsRepository for DieselStatsRepository {
    fn get(&self, vendor_id: Uuid) -> Result<Option<VendorStats>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = order_stats::table
            .find(vendor_id)
            .select(OrderStatsRow::as_select())
            .first::<OrderStatsRow>(&mut conn)
            .optional()?;
        Ok(row.map(VendorStats::from))
    }

    fn recompute(&self, vendor_id: Uuid) -> Result<VendorStats, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| refresh_vendor_stats(conn, vendor_id))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use bigdecimal::Zero;
    use uuid::Uuid;

    use super::DieselStatsRepository;
    use crate::domain::offering::OfferingInput;
    use crate::domain::order::{NewOrder, OrderStatus, StatusChange};
    use crate::domain::ports::{
        OfferingRepository, OrderRepository, ProfileRepository, StatsRepository,
    };
    use crate::infrastructure::offering_repo::DieselOfferingRepository;
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::profile_repo::DieselProfileRepository;
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn completed_orders_count_toward_earnings() {
        let (_container, pool) = setup_db().await;
        let profiles = DieselProfileRepository::new(pool.clone());
        let offerings = DieselOfferingRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool.clone());
        let stats = DieselStatsRepository::new(pool);

        let vendor = profiles
            .get_or_create_vendor_profile(Uuid::new_v4(), "Blue Flame")
            .expect("vendor")
            .vendor;
        let offering = offerings
            .create(
                vendor.id,
                OfferingInput {
                    name: "Refill".into(),
                    description: None,
                    price: BigDecimal::from_str("20.00").unwrap(),
                    estimated_time: None,
                    unit: "cylinder".into(),
                    discount: BigDecimal::zero(),
                    tags: vec![],
                    payment_methods: vec![],
                    max_quantity: 3,
                },
            )
            .expect("offering");

        let mut ids = Vec::new();
        for _ in 0..2 {
            let order = orders
                .create(NewOrder {
                    customer_id: Uuid::new_v4(),
                    vendor_id: vendor.id,
                    service_id: offering.id,
                    quantity: 1,
                    scheduled_time: None,
                    total_price: BigDecimal::from_str("20.00").unwrap(),
                    delivery_address: "1 Main St".into(),
                    notes: None,
                })
                .expect("create order");
            ids.push(order.id);
        }
        for next in [OrderStatus::Accepted, OrderStatus::Completed] {
            orders
                .change_status(ids[0], &|_| Ok(StatusChange::To(next)))
                .expect("transition");
        }

        let current = stats.get(vendor.id).expect("get").expect("row exists");
        assert_eq!(current.total_orders, 2);
        assert_eq!(current.completed_orders, 1);
        assert_eq!(current.pending_orders, 1);
        assert_eq!(current.total_earnings, BigDecimal::from(20));

        let rebuilt = stats.recompute(vendor.id).expect("recompute");
        assert_eq!(rebuilt.total_orders, current.total_orders);
        assert_eq!(rebuilt.total_earnings, current.total_earnings);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn unknown_vendor_has_no_stats_row() {
        let (_container, pool) = setup_db().await;
        let stats = DieselStatsRepository::new(pool);
        assert!(stats.get(Uuid::new_v4()).expect("get").is_none());
    }
}
