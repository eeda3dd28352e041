use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// The closed set of states an order can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The exact string stored in the `orders.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Decodes a stored column value. Only the exact spellings written by
    /// `as_str` are accepted; request input goes through `FromStr` instead.
    pub fn from_stored(value: &str) -> Option<OrderStatus> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "inprogress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                s.trim()
            ))),
        }
    }
}

/// Outcome of validating a requested status change against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    To(OrderStatus),
}

/// Vendor-initiated status update. Requesting the current status is a no-op.
pub fn plan_status_update(
    current: OrderStatus,
    requested: OrderStatus,
) -> Result<StatusChange, DomainError> {
    if current == requested {
        return Ok(StatusChange::Unchanged);
    }
    if current.can_transition_to(requested) {
        Ok(StatusChange::To(requested))
    } else {
        Err(DomainError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

/// Customer-initiated cancellation, only allowed while the order is pending.
pub fn plan_cancellation(current: OrderStatus) -> Result<StatusChange, DomainError> {
    if current == OrderStatus::Pending {
        Ok(StatusChange::To(OrderStatus::Cancelled))
    } else {
        Err(DomainError::InvalidTransition {
            from: current,
            to: OrderStatus::Cancelled,
        })
    }
}

/// `price * quantity`, less a percentage discount, rounded to cents and always
/// carrying two decimal places.
pub fn order_total(price: &BigDecimal, quantity: i32, discount_percent: &BigDecimal) -> BigDecimal {
    let gross = price.clone() * BigDecimal::from(quantity);
    let discount = if discount_percent.is_zero() {
        BigDecimal::zero()
    } else {
        gross.clone() * discount_percent.clone() / BigDecimal::from(100)
    };
    (gross - discount).round(2).with_scale(2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub status: OrderStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub order_time: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub is_paid: bool,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a customer supplies when placing an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub delivery_address: String,
    pub notes: Option<String>,
}

/// A validated, priced order ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub total_price: BigDecimal,
    pub delivery_address: String,
    pub notes: Option<String>,
}
