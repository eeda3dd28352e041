use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use super::message::Message;
use super::order::{Order, OrderStatus};
use super::review::Review;

/// A row of the `change_feed` table, written in the same transaction as the
/// change it describes. `aggregate_type` is the routing key for consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// An event before it has been assigned an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub aggregate_type: &'static str,
    pub aggregate_id: String,
    pub event_type: &'static str,
    pub payload: Value,
}

impl PendingEvent {
    pub fn order_created(order: &Order) -> Self {
        Self {
            aggregate_type: "Order",
            aggregate_id: order.id.to_string(),
            event_type: "OrderCreated",
            payload: json!({
                "order_id": order.id,
                "customer_id": order.customer_id,
                "vendor_id": order.vendor_id,
                "service_id": order.service_id,
                "quantity": order.quantity,
                "status": order.status.as_str(),
                "total_price": order.total_price.to_string(),
            }),
        }
    }

    pub fn order_status_changed(order: &Order, previous: OrderStatus) -> Self {
        Self {
            aggregate_type: "Order",
            aggregate_id: order.id.to_string(),
            event_type: "OrderStatusChanged",
            payload: json!({
                "order_id": order.id,
                "vendor_id": order.vendor_id,
                "from": previous.as_str(),
                "to": order.status.as_str(),
            }),
        }
    }

    pub fn order_paid(order: &Order) -> Self {
        Self {
            aggregate_type: "Order",
            aggregate_id: order.id.to_string(),
            event_type: "OrderPaid",
            payload: json!({
                "order_id": order.id,
                "total_price": order.total_price.to_string(),
            }),
        }
    }

    pub fn review_submitted(review: &Review) -> Self {
        Self {
            aggregate_type: "Review",
            aggregate_id: review.vendor_id.to_string(),
            event_type: "ReviewSubmitted",
            payload: json!({
                "review_id": review.id,
                "order_id": review.order_id,
                "vendor_id": review.vendor_id,
                "rating": review.rating,
            }),
        }
    }

    pub fn message_sent(message: &Message) -> Self {
        Self {
            aggregate_type: "Message",
            aggregate_id: message.conversation_key.to_string(),
            event_type: "MessageSent",
            payload: json!({
                "message_id": message.id,
                "sender_id": message.sender_id,
                "receiver_id": message.receiver_id,
                "order_id": message.order_id,
            }),
        }
    }
}
