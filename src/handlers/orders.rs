use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderRequest, OrderStatus};
use crate::errors::AppError;
use crate::handlers::principal::CurrentPrincipal;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub delivery_address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of "Pending", "Accepted", "In Progress", "Completed", "Cancelled".
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub status: String,
    /// Statuses the vendor may move this order to next.
    pub next_statuses: Vec<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub order_time: DateTime<Utc>,
    /// Decimal total as a string, e.g. "54.00"
    pub total_price: String,
    pub is_paid: bool,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        let next_statuses = OrderStatus::ALL
            .into_iter()
            .filter(|next| o.status.can_transition_to(*next))
            .map(|next| next.as_str().to_string())
            .collect();
        Self {
            id: o.id,
            customer_id: o.customer_id,
            vendor_id: o.vendor_id,
            service_id: o.service_id,
            quantity: o.quantity,
            status: o.status.as_str().to_string(),
            next_statuses,
            scheduled_time: o.scheduled_time,
            order_time: o.order_time,
            total_price: o.total_price.to_string(),
            is_paid: o.is_paid,
            delivery_address: o.delivery_address,
            notes: o.notes,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Only orders currently in this status.
    pub status: Option<String>,
    /// Number of orders to return. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places a Pending order for one of a vendor's active offerings. The total
/// is computed server-side from the offering's price and discount.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request body"),
        (status = 404, description = "Vendor or offering not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let body = body.into_inner();
    let request = OrderRequest {
        vendor_id: body.vendor_id,
        service_id: body.service_id,
        quantity: body.quantity,
        scheduled_time: body.scheduled_time,
        delivery_address: body.delivery_address,
        notes: body.notes,
    };

    let order = web::block(move || state.orders.create_order(&principal, request)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.get_order(&principal, order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Lists the caller's orders, newest first: placed orders for a customer,
/// received orders for a vendor.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("limit" = Option<i64>, Query, description = "Items to return (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "List of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let params = query.into_inner();
    let limit = params.limit.clamp(1, 100);
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let orders =
        web::block(move || state.orders.list_orders(&principal, status, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: orders.into_iter().map(OrderResponse::from).collect(),
        limit,
    }))
}

/// PUT /orders/{id}/status
///
/// Vendor moves an order along its lifecycle. Requesting the current status
/// is accepted and changes nothing.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order after the update", body = OrderResponse),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 403, description = "Caller is not a vendor"),
        (status = 404, description = "Order not found or owned by another vendor"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let order_id = path.into_inner();
    let requested: OrderStatus = body.status.parse()?;

    let order =
        web::block(move || state.orders.update_status(&principal, order_id, requested)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/cancel
///
/// Customer cancels one of its orders while it is still Pending.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Cancelled order", body = OrderResponse),
        (status = 400, description = "Order is no longer pending"),
        (status = 403, description = "Caller is not a customer"),
        (status = 404, description = "Order not found or placed by another customer"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.cancel_order(&principal, order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/paid
#[utoipa::path(
    post,
    path = "/orders/{id}/paid",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order marked paid", body = OrderResponse),
        (status = 403, description = "Caller is not a vendor"),
        (status = 404, description = "Order not found or owned by another vendor"),
    ),
    tag = "orders"
)]
pub async fn mark_paid(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.mark_paid(&principal, order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
