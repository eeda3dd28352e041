use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::offering::{OfferingInput, ServiceOffering};
use crate::errors::AppError;
use crate::handlers::principal::CurrentPrincipal;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OfferingRequest {
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "28.50"
    pub price: String,
    pub estimated_time: Option<String>,
    /// Defaults to "unit".
    pub unit: Option<String>,
    /// Percentage off, 0 to 100, as a decimal string. Defaults to "0".
    pub discount: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payment_methods: Vec<String>,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: i32,
}

fn default_max_quantity() -> i32 {
    1
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {field}: {raw}")))
}

impl OfferingRequest {
    fn into_input(self) -> Result<OfferingInput, AppError> {
        let price = parse_decimal("price", &self.price)?;
        let discount = match self.discount.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_decimal("discount", raw)?,
            _ => BigDecimal::zero(),
        };
        Ok(OfferingInput {
            name: self.name,
            description: self.description,
            price,
            estimated_time: self.estimated_time,
            unit: self.unit.unwrap_or_default(),
            discount,
            tags: self.tags,
            payment_methods: self.payment_methods,
            max_quantity: self.max_quantity,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfferingResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: String,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceOffering> for OfferingResponse {
    fn from(s: ServiceOffering) -> Self {
        Self {
            id: s.id,
            vendor_id: s.vendor_id,
            name: s.name,
            description: s.description,
            price: s.price.to_string(),
            estimated_time: s.estimated_time,
            unit: s.unit,
            discount: s.discount.to_string(),
            tags: s.tags,
            payment_methods: s.payment_methods,
            max_quantity: s.max_quantity,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /services
#[utoipa::path(
    post,
    path = "/services",
    request_body = OfferingRequest,
    responses(
        (status = 201, description = "Offering created", body = OfferingResponse),
        (status = 400, description = "Invalid offering"),
        (status = 403, description = "Caller is not acting as a vendor"),
    ),
    tag = "services"
)]
pub async fn create_offering(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    body: web::Json<OfferingRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let input = body.into_inner().into_input()?;
    let created = web::block(move || state.offerings.create(&principal, input)).await??;
    Ok(HttpResponse::Created().json(OfferingResponse::from(created)))
}

/// PUT /services/{id}
///
/// Replaces every editable field of the offering.
#[utoipa::path(
    put,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service UUID")),
    request_body = OfferingRequest,
    responses(
        (status = 200, description = "Offering updated", body = OfferingResponse),
        (status = 403, description = "Offering belongs to another vendor"),
        (status = 404, description = "Offering not found"),
    ),
    tag = "services"
)]
pub async fn update_offering(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
    body: web::Json<OfferingRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let id = path.into_inner();
    let input = body.into_inner().into_input()?;
    let updated = web::block(move || state.offerings.update(&principal, id, input)).await??;
    Ok(HttpResponse::Ok().json(OfferingResponse::from(updated)))
}

/// DELETE /services/{id}
///
/// Deactivates the offering. Existing orders keep referring to it.
#[utoipa::path(
    delete,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service UUID")),
    responses(
        (status = 204, description = "Offering deactivated"),
        (status = 403, description = "Offering belongs to another vendor"),
        (status = 404, description = "Offering not found"),
    ),
    tag = "services"
)]
pub async fn deactivate_offering(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let id = path.into_inner();
    web::block(move || state.offerings.deactivate(&principal, id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /vendors/{id}/services
#[utoipa::path(
    get,
    path = "/vendors/{id}/services",
    params(("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 200, description = "Active offerings, by name", body = [OfferingResponse]),
        (status = 404, description = "Vendor not found"),
    ),
    tag = "services"
)]
pub async fn list_vendor_offerings(
    state: web::Data<AppState>,
    _principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let vendor_id = path.into_inner();
    let offerings = web::block(move || state.offerings.list_for_vendor(vendor_id)).await??;
    let body: Vec<OfferingResponse> = offerings.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}
