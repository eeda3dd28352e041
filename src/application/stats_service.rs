use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::{OrderRepository, ReviewRepository, StatsRepository};
use crate::domain::profile::Vendor;
use crate::domain::review::Review;
use crate::domain::session::Principal;
use crate::domain::stats::VendorStats;

use super::profile_service::ProfileService;

const DASHBOARD_RECENT_ORDERS: i64 = 10;
const DASHBOARD_RECENT_REVIEWS: i64 = 5;

/// Everything a vendor's home screen shows. Parts that could not be loaded
/// carry their empty default and are listed in `degraded`.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub vendor: Vendor,
    pub stats: VendorStats,
    pub recent_orders: Vec<Order>,
    pub recent_reviews: Vec<Review>,
    pub degraded: Vec<&'static str>,
}

#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn StatsRepository>,
    orders: Arc<dyn OrderRepository>,
    reviews: Arc<dyn ReviewRepository>,
    profiles: ProfileService,
}

fn or_degraded<T>(
    part: &'static str,
    result: Result<T, DomainError>,
    fallback: impl FnOnce() -> T,
    degraded: &mut Vec<&'static str>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Dashboard part '{}' unavailable: {}", part, e);
            degraded.push(part);
            fallback()
        }
    }
}

impl StatsService {
    pub fn new(
        stats: Arc<dyn StatsRepository>,
        orders: Arc<dyn OrderRepository>,
        reviews: Arc<dyn ReviewRepository>,
        profiles: ProfileService,
    ) -> Self {
        Self {
            stats,
            orders,
            reviews,
            profiles,
        }
    }

    /// A vendor without a stats row yet reads as all zeros.
    pub fn vendor_stats(&self, vendor_id: Uuid) -> Result<VendorStats, DomainError> {
        self.profiles.vendor(vendor_id)?;
        Ok(self
            .stats
            .get(vendor_id)?
            .unwrap_or_else(|| VendorStats::empty(vendor_id)))
    }

    pub fn recompute(
        &self,
        principal: &Principal,
        vendor_id: Uuid,
    ) -> Result<VendorStats, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        if vendor.id != vendor_id {
            return Err(DomainError::Forbidden(
                "only the vendor's owner can recompute its stats".into(),
            ));
        }
        let stats = self.stats.recompute(vendor_id)?;
        log::info!(
            "Stats recomputed for vendor {}: {} orders",
            vendor_id,
            stats.total_orders
        );
        Ok(stats)
    }

    pub fn dashboard(&self, principal: &Principal) -> Result<Dashboard, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        let mut degraded = Vec::new();

        let stats = or_degraded(
            "stats",
            self.stats
                .get(vendor.id)
                .map(|s| s.unwrap_or_else(|| VendorStats::empty(vendor.id))),
            || VendorStats::empty(vendor.id),
            &mut degraded,
        );
        let recent_orders = or_degraded(
            "recent_orders",
            self.orders
                .list_for_vendor(vendor.id, None, DASHBOARD_RECENT_ORDERS),
            Vec::new,
            &mut degraded,
        );
        let recent_reviews = or_degraded(
            "recent_reviews",
            self.reviews
                .list_for_vendor(vendor.id, Some(DASHBOARD_RECENT_REVIEWS)),
            Vec::new,
            &mut degraded,
        );

        Ok(Dashboard {
            vendor,
            stats,
            recent_orders,
            recent_reviews,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::NewOrder;
    use crate::infrastructure::memory::InMemoryStore;

    struct BrokenStats;

    impl StatsRepository for BrokenStats {
        fn get(&self, _vendor_id: Uuid) -> Result<Option<VendorStats>, DomainError> {
            Err(DomainError::Internal("stats table unavailable".into()))
        }

        fn recompute(&self, _vendor_id: Uuid) -> Result<VendorStats, DomainError> {
            Err(DomainError::Internal("stats table unavailable".into()))
        }
    }

    fn place_order(store: &InMemoryStore, vendor_id: Uuid) {
        OrderRepository::create(
            store,
            NewOrder {
                customer_id: Uuid::new_v4(),
                vendor_id,
                service_id: Uuid::new_v4(),
                quantity: 1,
                scheduled_time: None,
                total_price: BigDecimal::from_str("15.50").unwrap(),
                delivery_address: "Block C".into(),
                notes: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn fresh_vendor_reads_as_zeros() {
        let store = Arc::new(InMemoryStore::new());
        let profiles = ProfileService::new(store.clone());
        let vendor = profiles.own_vendor(&Principal::vendor(Uuid::new_v4())).unwrap();
        let svc = StatsService::new(store.clone(), store.clone(), store, profiles);

        let stats = svc.vendor_stats(vendor.id).unwrap();
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.average_rating(), None);
    }

    #[test]
    fn unknown_vendor_stats_are_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let svc = StatsService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ProfileService::new(store),
        );
        assert!(matches!(
            svc.vendor_stats(Uuid::new_v4()),
            Err(DomainError::NotFound("Vendor"))
        ));
    }

    #[test]
    fn only_the_owner_recomputes() {
        let store = Arc::new(InMemoryStore::new());
        let profiles = ProfileService::new(store.clone());
        let owner = Principal::vendor(Uuid::new_v4());
        let vendor = profiles.own_vendor(&owner).unwrap();
        place_order(&store, vendor.id);
        let svc = StatsService::new(store.clone(), store.clone(), store, profiles);

        assert_eq!(svc.recompute(&owner, vendor.id).unwrap().pending_orders, 1);
        assert!(matches!(
            svc.recompute(&Principal::vendor(Uuid::new_v4()), vendor.id),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn dashboard_collects_every_part() {
        let store = Arc::new(InMemoryStore::new());
        let profiles = ProfileService::new(store.clone());
        let owner = Principal::vendor(Uuid::new_v4());
        let vendor = profiles.own_vendor(&owner).unwrap();
        place_order(&store, vendor.id);
        place_order(&store, vendor.id);
        let svc = StatsService::new(store.clone(), store.clone(), store, profiles);

        let dashboard = svc.dashboard(&owner).unwrap();
        assert!(dashboard.degraded.is_empty());
        assert_eq!(dashboard.stats.total_orders, 2);
        assert_eq!(dashboard.recent_orders.len(), 2);
        assert!(dashboard.recent_reviews.is_empty());
    }

    #[test]
    fn dashboard_degrades_instead_of_failing() {
        let store = Arc::new(InMemoryStore::new());
        let profiles = ProfileService::new(store.clone());
        let owner = Principal::vendor(Uuid::new_v4());
        let vendor = profiles.own_vendor(&owner).unwrap();
        place_order(&store, vendor.id);
        let svc = StatsService::new(Arc::new(BrokenStats), store.clone(), store, profiles);

        let dashboard = svc.dashboard(&owner).unwrap();
        assert_eq!(dashboard.degraded, vec!["stats"]);
        assert_eq!(dashboard.stats, VendorStats {
            updated_at: dashboard.stats.updated_at,
            ..VendorStats::empty(vendor.id)
        });
        assert_eq!(dashboard.recent_orders.len(), 1);
    }

    #[test]
    fn customers_have_no_dashboard() {
        let store = Arc::new(InMemoryStore::new());
        let svc = StatsService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ProfileService::new(store),
        );
        assert!(matches!(
            svc.dashboard(&Principal::customer(Uuid::new_v4())),
            Err(DomainError::Forbidden(_))
        ));
    }
}
