use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_total, plan_cancellation, plan_status_update, NewOrder, Order, OrderRequest, OrderStatus,
};
use crate::domain::ports::{OfferingRepository, OrderRepository};
use crate::domain::session::{Principal, Role};

use super::profile_service::ProfileService;

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    offerings: Arc<dyn OfferingRepository>,
    profiles: ProfileService,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        offerings: Arc<dyn OfferingRepository>,
        profiles: ProfileService,
    ) -> Self {
        Self {
            orders,
            offerings,
            profiles,
        }
    }

    /// Prices the request against the offering as it is now and stores a
    /// Pending order.
    pub fn create_order(
        &self,
        principal: &Principal,
        request: OrderRequest,
    ) -> Result<Order, DomainError> {
        principal.require_role(Role::Customer)?;

        let delivery_address = request.delivery_address.trim().to_string();
        if delivery_address.is_empty() {
            return Err(DomainError::InvalidInput(
                "delivery_address must not be empty".into(),
            ));
        }

        let vendor = self.profiles.vendor(request.vendor_id)?;
        if !vendor.is_open {
            return Err(DomainError::InvalidInput(format!(
                "{} is not accepting orders",
                vendor.business_name
            )));
        }

        let offering = self
            .offerings
            .find_by_id(request.service_id)?
            .filter(|s| s.vendor_id == vendor.id && s.is_active)
            .ok_or(DomainError::NotFound("Service"))?;
        if request.quantity < 1 || request.quantity > offering.max_quantity {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be between 1 and {}",
                offering.max_quantity
            )));
        }

        self.profiles.my_profile(principal)?;

        let order = self.orders.create(NewOrder {
            customer_id: principal.id,
            vendor_id: vendor.id,
            service_id: offering.id,
            quantity: request.quantity,
            scheduled_time: request.scheduled_time,
            total_price: order_total(&offering.price, request.quantity, &offering.discount),
            delivery_address,
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })?;
        log::info!(
            "Order {} placed by {} with vendor {} for {}",
            order.id,
            order.customer_id,
            order.vendor_id,
            order.total_price
        );
        Ok(order)
    }

    /// Orders are visible to their customer and to the vendor that owns them.
    pub fn get_order(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        let order = self
            .orders
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Order"))?;
        let visible = match principal.role {
            Role::Customer => order.customer_id == principal.id,
            Role::Vendor => order.vendor_id == self.profiles.own_vendor(principal)?.id,
        };
        if !visible {
            // Same answer as a missing order, so ids cannot be probed.
            return Err(DomainError::NotFound("Order"));
        }
        Ok(order)
    }

    pub fn list_orders(
        &self,
        principal: &Principal,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, DomainError> {
        match principal.role {
            Role::Customer => self.orders.list_for_customer(principal.id, status, limit),
            Role::Vendor => {
                let vendor = self.profiles.own_vendor(principal)?;
                self.orders.list_for_vendor(vendor.id, status, limit)
            }
        }
    }

    pub fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        requested: OrderStatus,
    ) -> Result<Order, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        let order = self.orders.change_status(id, &|current: &Order| {
            if current.vendor_id != vendor.id {
                return Err(DomainError::NotFound("Order"));
            }
            plan_status_update(current.status, requested)
        })?;
        log::info!("Order {} is now {}", order.id, order.status);
        Ok(order)
    }

    pub fn cancel_order(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        principal.require_role(Role::Customer)?;
        let order = self.orders.change_status(id, &|current: &Order| {
            if current.customer_id != principal.id {
                return Err(DomainError::NotFound("Order"));
            }
            plan_cancellation(current.status)
        })?;
        log::info!("Order {} cancelled by customer {}", order.id, principal.id);
        Ok(order)
    }

    /// Both checks run against the locked row, so a cancel that commits
    /// first is always seen.
    pub fn mark_paid(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        let order = self.orders.mark_paid(id, &|current: &Order| {
            if current.vendor_id != vendor.id {
                return Err(DomainError::NotFound("Order"));
            }
            if current.status == OrderStatus::Cancelled {
                return Err(DomainError::InvalidInput(
                    "a cancelled order cannot be marked paid".into(),
                ));
            }
            Ok(())
        })?;
        log::info!("Order {} marked paid by vendor {}", order.id, vendor.id);
        Ok(order)
    }
}
