use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::PendingEvent;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{NewReview, Review};
use crate::schema::reviews;

use super::change_feed;
use super::models::{NewReviewRow, ReviewRow};
use super::stats_repo::refresh_vendor_stats;

pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ReviewRepository for DieselReviewRepository {
    fn create(&self, review: NewReview) -> Result<Review, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: ReviewRow = diesel::insert_into(reviews::table)
                .values(&NewReviewRow {
                    id: Uuid::new_v4(),
                    order_id: review.order_id,
                    vendor_id: review.vendor_id,
                    customer_id: review.customer_id,
                    rating: review.rating,
                    comment: review.comment.clone(),
                })
                .get_result(conn)
                .map_err(|e| match DomainError::from(e) {
                    DomainError::Conflict(_) => {
                        DomainError::Conflict("order has already been reviewed".into())
                    }
                    other => other,
                })?;
            let created = Review::try_from(row)?;

            refresh_vendor_stats(conn, created.vendor_id)?;
            change_feed::record(conn, PendingEvent::review_submitted(&created))?;

            Ok(created)
        })
    }

    fn find_by_order(&self, order_id: Uuid) -> Result<Option<Review>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = reviews::table
            .filter(reviews::order_id.eq(order_id))
            .select(ReviewRow::as_select())
            .first::<ReviewRow>(&mut conn)
            .optional()?;
        row.map(Review::try_from).transpose()
    }

    fn list_for_vendor(&self, vendor_id: Uuid, limit: Option<i64>) -> Result<Vec<Review>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = reviews::table
            .select(ReviewRow::as_select())
            .filter(reviews::vendor_id.eq(vendor_id))
            .order(reviews::created_at.desc())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query.load::<ReviewRow>(&mut conn)?;
        rows.into_iter().map(Review::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::{BigDecimal, Zero};
    use uuid::Uuid;

    use super::DieselReviewRepository;
    use crate::db::DbPool;
    use crate::domain::errors::DomainError;
    use crate::domain::offering::OfferingInput;
    use crate::domain::order::NewOrder;
    use crate::domain::ports::{
        OfferingRepository, OrderRepository, ProfileRepository, ReviewRepository, StatsRepository,
    };
    use crate::domain::review::NewReview;
    use crate::infrastructure::offering_repo::DieselOfferingRepository;
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::profile_repo::DieselProfileRepository;
    use crate::infrastructure::stats_repo::DieselStatsRepository;
    use crate::infrastructure::test_support::setup_db;

    fn seed_orders(pool: &DbPool, count: usize) -> (Uuid, Vec<(Uuid, Uuid)>) {
        let vendor = DieselProfileRepository::new(pool.clone())
            .get_or_create_vendor_profile(Uuid::new_v4(), "Blue Flame")
            .expect("vendor")
            .vendor;
        let offering = DieselOfferingRepository::new(pool.clone())
            .create(
                vendor.id,
                OfferingInput {
                    name: "Refill".into(),
                    description: None,
                    price: BigDecimal::from_str("10.00").unwrap(),
                    estimated_time: None,
                    unit: "cylinder".into(),
                    discount: BigDecimal::zero(),
                    tags: vec![],
                    payment_methods: vec![],
                    max_quantity: 1,
                },
            )
            .expect("offering");
        let orders = DieselOrderRepository::new(pool.clone());
        let placed = (0..count)
            .map(|_| {
                let order = orders
                    .create(NewOrder {
                        customer_id: Uuid::new_v4(),
                        vendor_id: vendor.id,
                        service_id: offering.id,
                        quantity: 1,
                        scheduled_time: None,
                        total_price: BigDecimal::from_str("10.00").unwrap(),
                        delivery_address: "1 Main St".into(),
                        notes: None,
                    })
                    .expect("order");
                (order.id, order.customer_id)
            })
            .collect();
        (vendor.id, placed)
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn reviews_feed_the_vendor_average() {
        let (_container, pool) = setup_db().await;
        let (vendor_id, placed) = seed_orders(&pool, 3);
        let repo = DieselReviewRepository::new(pool.clone());

        for ((order_id, customer_id), rating) in placed.into_iter().zip([5, 4, 3]) {
            repo.create(NewReview {
                order_id,
                vendor_id,
                customer_id,
                rating,
                comment: None,
            })
            .expect("review");
        }

        let stats = DieselStatsRepository::new(pool)
            .get(vendor_id)
            .expect("stats")
            .expect("row");
        assert_eq!(stats.rating_count, 3);
        assert_eq!(stats.average_rating(), Some(4.0));
        assert_eq!(repo.list_for_vendor(vendor_id, Some(2)).expect("list").len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn second_review_for_an_order_conflicts() {
        let (_container, pool) = setup_db().await;
        let (vendor_id, placed) = seed_orders(&pool, 1);
        let (order_id, customer_id) = placed[0];
        let repo = DieselReviewRepository::new(pool);

        let review = || NewReview {
            order_id,
            vendor_id,
            customer_id,
            rating: 4,
            comment: Some("quick delivery".into()),
        };
        repo.create(review()).expect("first review");
        let err = repo.create(review()).expect_err("duplicate");
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(repo.find_by_order(order_id).expect("find").is_some());
    }
}
