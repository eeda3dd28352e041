use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::ChangeEvent;
use crate::domain::message::{ConversationKey, Message};
use crate::domain::offering::ServiceOffering;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::profile::{UserProfile, Vendor, VendorOwner};
use crate::domain::review::{validate_rating, Review};
use crate::domain::session::Role;
use crate::domain::stats::VendorStats;
use crate::schema::{
    change_feed, messages, order_stats, orders, reviews, services, user_profiles, vendor_owners,
    vendors,
};

fn malformed(table: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(format!("malformed {table} row: {detail}"))
}

// ── Profiles ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserProfileRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(r: UserProfileRow) -> Self {
        UserProfile {
            id: r.id,
            full_name: r.full_name,
            phone: r.phone,
            avatar_url: r.avatar_url,
            address: r.address,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_profiles)]
pub struct NewUserProfileRow {
    pub id: Uuid,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = user_profiles)]
pub struct UserProfileChangeset {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vendor_owners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorOwnerRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VendorOwnerRow> for VendorOwner {
    fn from(r: VendorOwnerRow) -> Self {
        VendorOwner {
            id: r.id,
            full_name: r.full_name,
            phone: r.phone,
            avatar_url: r.avatar_url,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vendor_owners)]
pub struct NewVendorOwnerRow {
    pub id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vendors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(r: VendorRow) -> Self {
        Vendor {
            id: r.id,
            owner_id: r.owner_id,
            business_name: r.business_name,
            description: r.description,
            address: r.address,
            logo_url: r.logo_url,
            is_open: r.is_open,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vendors)]
pub struct NewVendorRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = vendors)]
pub struct VendorChangeset {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

// ── Services ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceRow {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: BigDecimal,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for ServiceOffering {
    fn from(r: ServiceRow) -> Self {
        ServiceOffering {
            id: r.id,
            vendor_id: r.vendor_id,
            name: r.name,
            description: r.description,
            price: r.price,
            estimated_time: r.estimated_time,
            unit: r.unit,
            discount: r.discount,
            tags: r.tags,
            payment_methods: r.payment_methods,
            max_quantity: r.max_quantity,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = services)]
pub struct NewServiceRow {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: BigDecimal,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = services)]
#[diesel(treat_none_as_null = true)]
pub struct ServiceChangeset {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: BigDecimal,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
    pub updated_at: DateTime<Utc>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub status: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub order_time: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub is_paid: bool,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_stored(&r.status)
            .ok_or_else(|| malformed("orders", format!("unknown status '{}'", r.status)))?;
        Ok(Order {
            id: r.id,
            customer_id: r.customer_id,
            vendor_id: r.vendor_id,
            service_id: r.service_id,
            quantity: r.quantity,
            status,
            scheduled_time: r.scheduled_time,
            order_time: r.order_time,
            total_price: r.total_price,
            is_paid: r.is_paid,
            delivery_address: r.delivery_address,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub status: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub total_price: BigDecimal,
    pub delivery_address: String,
    pub notes: Option<String>,
}

// ── Reviews ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = DomainError;

    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let rating = validate_rating(r.rating).map_err(|e| malformed("reviews", e))?;
        Ok(Review {
            id: r.id,
            order_id: r.order_id,
            vendor_id: r.vendor_id,
            customer_id: r.customer_id,
            rating,
            comment: r.comment,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = order_stats)]
#[diesel(primary_key(vendor_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderStatsRow {
    pub vendor_id: Uuid,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub accepted_orders: i64,
    pub in_progress_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub total_earnings: BigDecimal,
    pub rating_sum: i64,
    pub rating_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderStatsRow> for VendorStats {
    fn from(r: OrderStatsRow) -> Self {
        VendorStats {
            vendor_id: r.vendor_id,
            total_orders: r.total_orders,
            pending_orders: r.pending_orders,
            accepted_orders: r.accepted_orders,
            in_progress_orders: r.in_progress_orders,
            completed_orders: r.completed_orders,
            cancelled_orders: r.cancelled_orders,
            total_earnings: r.total_earnings,
            rating_sum: r.rating_sum,
            rating_count: r.rating_count,
            updated_at: r.updated_at,
        }
    }
}

impl From<&VendorStats> for OrderStatsRow {
    fn from(s: &VendorStats) -> Self {
        OrderStatsRow {
            vendor_id: s.vendor_id,
            total_orders: s.total_orders,
            pending_orders: s.pending_orders,
            accepted_orders: s.accepted_orders,
            in_progress_orders: s.in_progress_orders,
            completed_orders: s.completed_orders,
            cancelled_orders: s.cancelled_orders,
            total_earnings: s.total_earnings.clone(),
            rating_sum: s.rating_sum,
            rating_count: s.rating_count,
            updated_at: s.updated_at,
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_key: String,
    pub sender_id: Uuid,
    pub sender_role: String,
    pub receiver_id: Uuid,
    pub receiver_role: String,
    pub order_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(r: MessageRow) -> Result<Self, Self::Error> {
        let sender_role = r.sender_role.parse::<Role>().map_err(|e| malformed("messages", e))?;
        let receiver_role = r
            .receiver_role
            .parse::<Role>()
            .map_err(|e| malformed("messages", e))?;
        Ok(Message {
            id: r.id,
            conversation_key: ConversationKey::from_stored(r.conversation_key),
            sender_id: r.sender_id,
            sender_role,
            receiver_id: r.receiver_id,
            receiver_role,
            order_id: r.order_id,
            content: r.content,
            is_read: r.is_read,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    pub id: Uuid,
    pub conversation_key: String,
    pub sender_id: Uuid,
    pub sender_role: String,
    pub receiver_id: Uuid,
    pub receiver_role: String,
    pub order_id: Option<Uuid>,
    pub content: String,
}

// ── Change feed ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = change_feed)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChangeEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl From<ChangeEventRow> for ChangeEvent {
    fn from(r: ChangeEventRow) -> Self {
        ChangeEvent {
            id: r.id,
            aggregate_type: r.aggregate_type,
            aggregate_id: r.aggregate_id,
            event_type: r.event_type,
            payload: r.payload,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = change_feed)]
pub struct NewChangeEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn order_row(status: &str) -> OrderRow {
        let now = Utc::now();
        OrderRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            quantity: 1,
            status: status.to_string(),
            scheduled_time: None,
            order_time: now,
            total_price: BigDecimal::from_str("12.00").unwrap(),
            is_paid: false,
            delivery_address: "4 Mombasa Rd".into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stored_status_decodes() {
        let order = Order::try_from(order_row("In Progress")).unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
    }

    #[test]
    fn loosely_spelled_status_row_is_rejected() {
        for status in ["in_progress", "pending", "Shipped"] {
            assert!(
                matches!(Order::try_from(order_row(status)), Err(DomainError::Internal(_))),
                "{status:?} should not decode"
            );
        }
    }
}
