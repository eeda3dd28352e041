use uuid::Uuid;

use super::errors::DomainError;
use super::events::ChangeEvent;
use super::message::{ConversationKey, Message, NewMessage};
use super::offering::{OfferingInput, ServiceOffering};
use super::order::{NewOrder, Order, OrderStatus, StatusChange};
use super::profile::{UserProfile, UserProfileUpdate, Vendor, VendorProfile, VendorUpdate};
use super::review::{NewReview, Review};
use super::stats::VendorStats;

/// Decides the status change for an order, given its current (locked) state.
pub type StatusDecision<'a> = &'a dyn Fn(&Order) -> Result<StatusChange, DomainError>;

/// Guard evaluated against the locked order before a write goes ahead.
pub type OrderCheck<'a> = &'a dyn Fn(&Order) -> Result<(), DomainError>;

pub trait ProfileRepository: Send + Sync + 'static {
    /// Insert-if-absent then read; repeated calls never create a second row.
    fn get_or_create_user_profile(&self, principal_id: Uuid) -> Result<UserProfile, DomainError>;
    fn update_user_profile(
        &self,
        principal_id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, DomainError>;
    /// Creates the owner and its business record in one transaction.
    fn get_or_create_vendor_profile(
        &self,
        principal_id: Uuid,
        default_business_name: &str,
    ) -> Result<VendorProfile, DomainError>;
    fn find_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, DomainError>;
    fn find_vendor_by_owner(&self, owner_id: Uuid) -> Result<Option<Vendor>, DomainError>;
    fn update_vendor(&self, vendor_id: Uuid, update: VendorUpdate) -> Result<Vendor, DomainError>;
}

pub trait OfferingRepository: Send + Sync + 'static {
    fn create(&self, vendor_id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError>;
    fn update(&self, id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError>;
    fn deactivate(&self, id: Uuid) -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOffering>, DomainError>;
    fn list_active_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ServiceOffering>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order, refreshes the vendor's stats and records an event.
    fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list_for_customer(
        &self,
        customer_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError>;
    fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError>;
    /// Locks the order, asks `decide` what to do with it and applies the
    /// result atomically. `StatusChange::Unchanged` writes nothing.
    fn change_status(&self, id: Uuid, decide: StatusDecision<'_>) -> Result<Order, DomainError>;
    /// Locks the order, runs `check` on it, then sets the paid flag. A no-op
    /// when already paid.
    fn mark_paid(&self, id: Uuid, check: OrderCheck<'_>) -> Result<Order, DomainError>;
}

pub trait ReviewRepository: Send + Sync + 'static {
    /// Fails with `Conflict` if the order already has a review.
    fn create(&self, review: NewReview) -> Result<Review, DomainError>;
    fn find_by_order(&self, order_id: Uuid) -> Result<Option<Review>, DomainError>;
    fn list_for_vendor(&self, vendor_id: Uuid, limit: Option<i64>) -> Result<Vec<Review>, DomainError>;
}

pub trait StatsRepository: Send + Sync + 'static {
    fn get(&self, vendor_id: Uuid) -> Result<Option<VendorStats>, DomainError>;
    /// Rebuilds the aggregate from the order and review rows.
    fn recompute(&self, vendor_id: Uuid) -> Result<VendorStats, DomainError>;
}

pub trait MessageRepository: Send + Sync + 'static {
    fn insert(&self, message: NewMessage) -> Result<Message, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, DomainError>;
    /// Oldest first.
    fn list_conversation(&self, key: &ConversationKey) -> Result<Vec<Message>, DomainError>;
    /// Returns whether the flag changed.
    fn mark_read(&self, id: Uuid) -> Result<bool, DomainError>;
    fn unread_count(&self, receiver_id: Uuid) -> Result<i64, DomainError>;
}

pub trait ChangeFeed: Send + Sync + 'static {
    fn events_for(&self, aggregate_id: &str) -> Result<Vec<ChangeEvent>, DomainError>;
}
