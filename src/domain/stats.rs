use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::order::OrderStatus;
use super::review::average_from_totals;

/// Materialized per-vendor aggregate kept in the `order_stats` table.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorStats {
    pub vendor_id: Uuid,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub accepted_orders: i64,
    pub in_progress_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of `total_price` over completed orders.
    pub total_earnings: BigDecimal,
    pub rating_sum: i64,
    pub rating_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl VendorStats {
    pub fn empty(vendor_id: Uuid) -> Self {
        Self {
            vendor_id,
            total_orders: 0,
            pending_orders: 0,
            accepted_orders: 0,
            in_progress_orders: 0,
            completed_orders: 0,
            cancelled_orders: 0,
            total_earnings: BigDecimal::zero(),
            rating_sum: 0,
            rating_count: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn average_rating(&self) -> Option<f64> {
        average_from_totals(self.rating_sum, self.rating_count)
    }
}

/// Accumulates a vendor's aggregate from scratch, one row at a time.
#[derive(Debug)]
pub struct StatsBuilder {
    stats: VendorStats,
}

impl StatsBuilder {
    pub fn new(vendor_id: Uuid) -> Self {
        Self {
            stats: VendorStats::empty(vendor_id),
        }
    }

    pub fn add_orders(&mut self, status: OrderStatus, count: i64) -> &mut Self {
        let slot = match status {
            OrderStatus::Pending => &mut self.stats.pending_orders,
            OrderStatus::Accepted => &mut self.stats.accepted_orders,
            OrderStatus::InProgress => &mut self.stats.in_progress_orders,
            OrderStatus::Completed => &mut self.stats.completed_orders,
            OrderStatus::Cancelled => &mut self.stats.cancelled_orders,
        };
        *slot += count;
        self.stats.total_orders += count;
        self
    }

    pub fn add_earnings(&mut self, amount: &BigDecimal) -> &mut Self {
        self.stats.total_earnings += amount.clone();
        self
    }

    pub fn add_ratings(&mut self, sum: i64, count: i64) -> &mut Self {
        self.stats.rating_sum += sum;
        self.stats.rating_count += count;
        self
    }

    pub fn build(self) -> VendorStats {
        VendorStats {
            updated_at: Utc::now(),
            ..self.stats
        }
    }
}
