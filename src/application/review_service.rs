use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::{OrderRepository, ReviewRepository, StatsRepository};
use crate::domain::review::{validate_rating, NewReview, Review};
use crate::domain::session::{Principal, Role};

const MAX_COMMENT_LEN: usize = 1000;

/// A vendor's reviews together with the average over all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorReviews {
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    orders: Arc<dyn OrderRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        orders: Arc<dyn OrderRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            reviews,
            orders,
            stats,
        }
    }

    pub fn submit(
        &self,
        principal: &Principal,
        order_id: Uuid,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Review, DomainError> {
        principal.require_role(Role::Customer)?;
        let rating = validate_rating(rating)?;
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
            return Err(DomainError::InvalidInput(format!(
                "comment must be at most {MAX_COMMENT_LEN} characters"
            )));
        }

        let order = self
            .orders
            .find_by_id(order_id)?
            .filter(|o| o.customer_id == principal.id)
            .ok_or(DomainError::NotFound("Order"))?;
        if order.status != OrderStatus::Completed {
            return Err(DomainError::InvalidInput(format!(
                "only completed orders can be reviewed, this one is {}",
                order.status
            )));
        }

        // The unique index still settles two submissions racing past this.
        if self.reviews.find_by_order(order.id)?.is_some() {
            return Err(DomainError::Conflict(
                "order has already been reviewed".into(),
            ));
        }

        let review = self.reviews.create(NewReview {
            order_id: order.id,
            vendor_id: order.vendor_id,
            customer_id: principal.id,
            rating,
            comment,
        })?;
        log::info!(
            "Review {} ({} stars) left for vendor {}",
            review.id,
            review.rating,
            review.vendor_id
        );
        Ok(review)
    }

    /// The average comes from the materialized aggregate, so it covers every
    /// review even when the listing is limited.
    pub fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        limit: Option<i64>,
    ) -> Result<VendorReviews, DomainError> {
        let reviews = self.reviews.list_for_vendor(vendor_id, limit)?;
        let (average_rating, rating_count) = match self.stats.get(vendor_id)? {
            Some(stats) => (stats.average_rating(), stats.rating_count),
            None => (None, 0),
        };
        Ok(VendorReviews {
            reviews,
            average_rating,
            rating_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::{NewOrder, Order, StatusChange};
    use crate::domain::review::format_average;
    use crate::infrastructure::memory::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>) -> ReviewService {
        ReviewService::new(store.clone(), store.clone(), store.clone())
    }

    fn order_for(store: &InMemoryStore, customer: &Principal, vendor_id: Uuid) -> Order {
        OrderRepository::create(
            store,
            NewOrder {
                customer_id: customer.id,
                vendor_id,
                service_id: Uuid::new_v4(),
                quantity: 1,
                scheduled_time: None,
                total_price: BigDecimal::from_str("20.00").unwrap(),
                delivery_address: "Plot 7".into(),
                notes: None,
            },
        )
        .unwrap()
    }

    fn complete(store: &InMemoryStore, order: &Order) {
        for next in [OrderStatus::Accepted, OrderStatus::Completed] {
            store
                .change_status(order.id, &|_: &Order| {
                    Ok(StatusChange::To(next))
                })
                .unwrap();
        }
    }

    #[test]
    fn completed_orders_can_be_reviewed_once() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service(&store);
        let customer = Principal::customer(Uuid::new_v4());
        let order = order_for(&store, &customer, Uuid::new_v4());
        complete(&store, &order);

        let review = svc
            .submit(&customer, order.id, 5, Some("  fast  ".into()))
            .unwrap();
        assert_eq!(review.comment.as_deref(), Some("fast"));
        assert_eq!(review.vendor_id, order.vendor_id);

        assert!(matches!(
            svc.submit(&customer, order.id, 4, None),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn pending_orders_cannot_be_reviewed() {
        let store = Arc::new(InMemoryStore::new());
        let customer = Principal::customer(Uuid::new_v4());
        let order = order_for(&store, &customer, Uuid::new_v4());

        assert!(matches!(
            service(&store).submit(&customer, order.id, 5, None),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn someone_elses_order_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let order = order_for(&store, &Principal::customer(Uuid::new_v4()), Uuid::new_v4());
        complete(&store, &order);

        let stranger = Principal::customer(Uuid::new_v4());
        assert!(matches!(
            service(&store).submit(&stranger, order.id, 5, None),
            Err(DomainError::NotFound("Order"))
        ));
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let customer = Principal::customer(Uuid::new_v4());
        for rating in [0, 6] {
            assert!(matches!(
                service(&store).submit(&customer, Uuid::new_v4(), rating, None),
                Err(DomainError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn listing_reports_average_over_all_reviews() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service(&store);
        let vendor_id = Uuid::new_v4();
        for rating in [5, 4, 3] {
            let customer = Principal::customer(Uuid::new_v4());
            let order = order_for(&store, &customer, vendor_id);
            complete(&store, &order);
            svc.submit(&customer, order.id, rating, None).unwrap();
        }

        let listed = svc.list_for_vendor(vendor_id, Some(1)).unwrap();
        assert_eq!(listed.reviews.len(), 1);
        assert_eq!(listed.rating_count, 3);
        assert_eq!(format_average(listed.average_rating), "4.0");
    }

    #[test]
    fn unreviewed_vendor_shows_not_available() {
        let store = Arc::new(InMemoryStore::new());
        let listed = service(&store).list_for_vendor(Uuid::new_v4(), None).unwrap();
        assert!(listed.reviews.is_empty());
        assert_eq!(format_average(listed.average_rating), "N/A");
    }
}
