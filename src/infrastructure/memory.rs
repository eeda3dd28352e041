//! A process-local store implementing every repository port.
//!
//! It honours the same atomicity rules as the Diesel repositories (one lock
//! held across each multi-row write) and backs the service and HTTP tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::{ChangeEvent, PendingEvent};
use crate::domain::message::{ConversationKey, Message, NewMessage};
use crate::domain::offering::{OfferingInput, ServiceOffering};
use crate::domain::order::{NewOrder, Order, OrderStatus, StatusChange};
use crate::domain::ports::{
    ChangeFeed, MessageRepository, OfferingRepository, OrderCheck, OrderRepository,
    ProfileRepository, ReviewRepository, StatsRepository, StatusDecision,
};
use crate::domain::profile::{
    UserProfile, UserProfileUpdate, Vendor, VendorOwner, VendorProfile, VendorUpdate,
};
use crate::domain::review::{NewReview, Review};
use crate::domain::stats::{StatsBuilder, VendorStats};

#[derive(Default)]
struct State {
    user_profiles: HashMap<Uuid, UserProfile>,
    vendor_owners: HashMap<Uuid, VendorOwner>,
    vendors: HashMap<Uuid, Vendor>,
    services: HashMap<Uuid, ServiceOffering>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    stats: HashMap<Uuid, VendorStats>,
    messages: Vec<Message>,
    events: Vec<ChangeEvent>,
}

impl State {
    fn record(&mut self, event: PendingEvent) {
        self.events.push(ChangeEvent {
            id: Uuid::new_v4(),
            aggregate_type: event.aggregate_type.to_string(),
            aggregate_id: event.aggregate_id,
            event_type: event.event_type.to_string(),
            payload: event.payload,
            created_at: Utc::now(),
        });
    }

    fn refresh_stats(&mut self, vendor_id: Uuid) -> VendorStats {
        let mut builder = StatsBuilder::new(vendor_id);
        for order in self.orders.iter().filter(|o| o.vendor_id == vendor_id) {
            builder.add_orders(order.status, 1);
            if order.status == OrderStatus::Completed {
                builder.add_earnings(&order.total_price);
            }
        }
        for review in self.reviews.iter().filter(|r| r.vendor_id == vendor_id) {
            builder.add_ratings(i64::from(review.rating), 1);
        }
        let stats = builder.build();
        self.stats.insert(vendor_id, stats.clone());
        stats
    }

    fn order_mut(&mut self, id: Uuid) -> Result<&mut Order, DomainError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound("Order"))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store poisoned".into()))
    }
}

impl ProfileRepository for InMemoryStore {
    fn get_or_create_user_profile(&self, principal_id: Uuid) -> Result<UserProfile, DomainError> {
        let mut state = self.lock()?;
        let profile = state
            .user_profiles
            .entry(principal_id)
            .or_insert_with(|| {
                let now = Utc::now();
                UserProfile {
                    id: principal_id,
                    full_name: None,
                    phone: None,
                    avatar_url: None,
                    address: None,
                    created_at: now,
                    updated_at: now,
                }
            });
        Ok(profile.clone())
    }

    fn update_user_profile(
        &self,
        principal_id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, DomainError> {
        let mut state = self.lock()?;
        let profile = state
            .user_profiles
            .get_mut(&principal_id)
            .ok_or(DomainError::NotFound("Profile"))?;
        if update.full_name.is_some() {
            profile.full_name = update.full_name;
        }
        if update.phone.is_some() {
            profile.phone = update.phone;
        }
        if update.avatar_url.is_some() {
            profile.avatar_url = update.avatar_url;
        }
        if update.address.is_some() {
            profile.address = update.address;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    fn get_or_create_vendor_profile(
        &self,
        principal_id: Uuid,
        default_business_name: &str,
    ) -> Result<VendorProfile, DomainError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let owner = state
            .vendor_owners
            .entry(principal_id)
            .or_insert_with(|| VendorOwner {
                id: principal_id,
                full_name: None,
                phone: None,
                avatar_url: None,
                created_at: now,
            })
            .clone();

        let existing = state
            .vendors
            .values()
            .find(|v| v.owner_id == principal_id)
            .cloned();
        let vendor = match existing {
            Some(vendor) => vendor,
            None => {
                let vendor = Vendor {
                    id: Uuid::new_v4(),
                    owner_id: principal_id,
                    business_name: default_business_name.to_string(),
                    description: None,
                    address: None,
                    logo_url: None,
                    is_open: true,
                    created_at: now,
                    updated_at: now,
                };
                state.vendors.insert(vendor.id, vendor.clone());
                vendor
            }
        };
        Ok(VendorProfile { owner, vendor })
    }

    fn find_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, DomainError> {
        Ok(self.lock()?.vendors.get(&vendor_id).cloned())
    }

    fn find_vendor_by_owner(&self, owner_id: Uuid) -> Result<Option<Vendor>, DomainError> {
        Ok(self
            .lock()?
            .vendors
            .values()
            .find(|v| v.owner_id == owner_id)
            .cloned())
    }

    fn update_vendor(&self, vendor_id: Uuid, update: VendorUpdate) -> Result<Vendor, DomainError> {
        let mut state = self.lock()?;
        let vendor = state
            .vendors
            .get_mut(&vendor_id)
            .ok_or(DomainError::NotFound("Vendor"))?;
        if let Some(name) = update.business_name {
            vendor.business_name = name;
        }
        if update.description.is_some() {
            vendor.description = update.description;
        }
        if update.address.is_some() {
            vendor.address = update.address;
        }
        if update.logo_url.is_some() {
            vendor.logo_url = update.logo_url;
        }
        if let Some(open) = update.is_open {
            vendor.is_open = open;
        }
        vendor.updated_at = Utc::now();
        Ok(vendor.clone())
    }
}

impl OfferingRepository for InMemoryStore {
    fn create(&self, vendor_id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let offering = ServiceOffering {
            id: Uuid::new_v4(),
            vendor_id,
            name: input.name,
            description: input.description,
            price: input.price,
            estimated_time: input.estimated_time,
            unit: input.unit,
            discount: input.discount,
            tags: input.tags,
            payment_methods: input.payment_methods,
            max_quantity: input.max_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.services.insert(offering.id, offering.clone());
        Ok(offering)
    }

    fn update(&self, id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError> {
        let mut state = self.lock()?;
        let offering = state
            .services
            .get_mut(&id)
            .ok_or(DomainError::NotFound("Service"))?;
        offering.name = input.name;
        offering.description = input.description;
        offering.price = input.price;
        offering.estimated_time = input.estimated_time;
        offering.unit = input.unit;
        offering.discount = input.discount;
        offering.tags = input.tags;
        offering.payment_methods = input.payment_methods;
        offering.max_quantity = input.max_quantity;
        offering.updated_at = Utc::now();
        Ok(offering.clone())
    }

    fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        let offering = state
            .services
            .get_mut(&id)
            .ok_or(DomainError::NotFound("Service"))?;
        offering.is_active = false;
        offering.updated_at = Utc::now();
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOffering>, DomainError> {
        Ok(self.lock()?.services.get(&id).cloned())
    }

    fn list_active_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ServiceOffering>, DomainError> {
        let mut offerings: Vec<ServiceOffering> = self
            .lock()?
            .services
            .values()
            .filter(|s| s.vendor_id == vendor_id && s.is_active)
            .cloned()
            .collect();
        offerings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(offerings)
    }
}

fn newest_first(mut orders: Vec<Order>, limit: i64) -> Vec<Order> {
    orders.reverse();
    orders.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    orders
}

impl OrderRepository for InMemoryStore {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let created = Order {
            id: Uuid::new_v4(),
            customer_id: order.customer_id,
            vendor_id: order.vendor_id,
            service_id: order.service_id,
            quantity: order.quantity,
            status: OrderStatus::Pending,
            scheduled_time: order.scheduled_time,
            order_time: now,
            total_price: order.total_price,
            is_paid: false,
            delivery_address: order.delivery_address,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(created.clone());
        state.refresh_stats(created.vendor_id);
        state.record(PendingEvent::order_created(&created));
        Ok(created)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.lock()?.orders.iter().find(|o| o.id == id).cloned())
    }

    fn list_for_customer(
        &self,
        customer_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let orders = self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, limit))
    }

    fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let orders = self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.vendor_id == vendor_id && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, limit))
    }

    fn change_status(&self, id: Uuid, decide: StatusDecision<'_>) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let order = state.order_mut(id)?;
        let previous = order.status;
        let next = match decide(order)? {
            StatusChange::Unchanged => return Ok(order.clone()),
            StatusChange::To(next) => next,
        };
        order.status = next;
        order.updated_at = Utc::now();
        let updated = order.clone();

        state.refresh_stats(updated.vendor_id);
        state.record(PendingEvent::order_status_changed(&updated, previous));
        Ok(updated)
    }

    fn mark_paid(&self, id: Uuid, check: OrderCheck<'_>) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let order = state.order_mut(id)?;
        check(order)?;
        if order.is_paid {
            return Ok(order.clone());
        }
        order.is_paid = true;
        order.updated_at = Utc::now();
        let paid = order.clone();
        state.record(PendingEvent::order_paid(&paid));
        Ok(paid)
    }
}

impl ReviewRepository for InMemoryStore {
    fn create(&self, review: NewReview) -> Result<Review, DomainError> {
        let mut state = self.lock()?;
        if state.reviews.iter().any(|r| r.order_id == review.order_id) {
            return Err(DomainError::Conflict(
                "order has already been reviewed".into(),
            ));
        }
        let created = Review {
            id: Uuid::new_v4(),
            order_id: review.order_id,
            vendor_id: review.vendor_id,
            customer_id: review.customer_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        state.reviews.push(created.clone());
        state.refresh_stats(created.vendor_id);
        state.record(PendingEvent::review_submitted(&created));
        Ok(created)
    }

    fn find_by_order(&self, order_id: Uuid) -> Result<Option<Review>, DomainError> {
        Ok(self
            .lock()?
            .reviews
            .iter()
            .find(|r| r.order_id == order_id)
            .cloned())
    }

    fn list_for_vendor(&self, vendor_id: Uuid, limit: Option<i64>) -> Result<Vec<Review>, DomainError> {
        let mut reviews: Vec<Review> = self
            .lock()?
            .reviews
            .iter()
            .rev()
            .filter(|r| r.vendor_id == vendor_id)
            .cloned()
            .collect();
        if let Some(limit) = limit {
            reviews.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(reviews)
    }
}

impl StatsRepository for InMemoryStore {
    fn get(&self, vendor_id: Uuid) -> Result<Option<VendorStats>, DomainError> {
        Ok(self.lock()?.stats.get(&vendor_id).cloned())
    }

    fn recompute(&self, vendor_id: Uuid) -> Result<VendorStats, DomainError> {
        Ok(self.lock()?.refresh_stats(vendor_id))
    }
}

impl MessageRepository for InMemoryStore {
    fn insert(&self, message: NewMessage) -> Result<Message, DomainError> {
        let mut state = self.lock()?;
        if let Some(order_id) = message.order_id {
            if !state.orders.iter().any(|o| o.id == order_id) {
                return Err(DomainError::InvalidInput(
                    "referenced record does not exist".into(),
                ));
            }
        }
        let sent = Message {
            id: Uuid::new_v4(),
            conversation_key: message.conversation_key,
            sender_id: message.sender_id,
            sender_role: message.sender_role,
            receiver_id: message.receiver_id,
            receiver_role: message.receiver_role,
            order_id: message.order_id,
            content: message.content,
            is_read: false,
            created_at: Utc::now(),
        };
        state.messages.push(sent.clone());
        state.record(PendingEvent::message_sent(&sent));
        Ok(sent)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, DomainError> {
        Ok(self.lock()?.messages.iter().find(|m| m.id == id).cloned())
    }

    fn list_conversation(&self, key: &ConversationKey) -> Result<Vec<Message>, DomainError> {
        Ok(self
            .lock()?
            .messages
            .iter()
            .filter(|m| &m.conversation_key == key)
            .cloned()
            .collect())
    }

    fn mark_read(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::NotFound("Message"))?;
        let changed = !message.is_read;
        message.is_read = true;
        Ok(changed)
    }

    fn unread_count(&self, receiver_id: Uuid) -> Result<i64, DomainError> {
        let count = self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.receiver_id == receiver_id && !m.is_read)
            .count();
        Ok(count as i64)
    }
}

impl ChangeFeed for InMemoryStore {
    fn events_for(&self, aggregate_id: &str) -> Result<Vec<ChangeEvent>, DomainError> {
        Ok(self
            .lock()?
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}
