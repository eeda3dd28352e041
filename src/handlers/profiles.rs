use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::profile_service::Profile;
use crate::domain::profile::{UserProfile, UserProfileUpdate, Vendor, VendorOwner, VendorUpdate};
use crate::errors::AppError;
use crate::handlers::principal::CurrentPrincipal;
use crate::handlers::stats::StatsResponse;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            phone: p.phone,
            avatar_url: p.avatar_url,
            address: p.address,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorOwnerResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VendorOwner> for VendorOwnerResponse {
    fn from(o: VendorOwner) -> Self {
        Self {
            id: o.id,
            full_name: o.full_name,
            phone: o.phone,
            avatar_url: o.avatar_url,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorResponse {
    pub id: Uuid,
    /// Principal id of the owner; the counterpart id for messaging.
    pub owner_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vendor> for VendorResponse {
    fn from(v: Vendor) -> Self {
        Self {
            id: v.id,
            owner_id: v.owner_id,
            business_name: v.business_name,
            description: v.description,
            address: v.address,
            logo_url: v.logo_url,
            is_open: v.is_open,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ProfileResponse {
    Customer {
        profile: UserProfileResponse,
    },
    Vendor {
        owner: VendorOwnerResponse,
        vendor: VendorResponse,
    },
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Customer(p) => ProfileResponse::Customer { profile: p.into() },
            Profile::Vendor(v) => ProfileResponse::Vendor {
                owner: v.owner.into(),
                vendor: v.vendor.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVendorRequest {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorPublicResponse {
    pub vendor: VendorResponse,
    pub stats: StatsResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /profiles/me
///
/// Returns the caller's profile for its current role, creating it on first
/// access.
#[utoipa::path(
    get,
    path = "/profiles/me",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid principal headers"),
    ),
    tag = "profiles"
)]
pub async fn get_my_profile(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let profile = web::block(move || state.profiles.my_profile(&principal)).await??;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

/// PUT /profiles/me
#[utoipa::path(
    put,
    path = "/profiles/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfileResponse),
        (status = 403, description = "Caller is not acting as a customer"),
    ),
    tag = "profiles"
)]
pub async fn update_my_profile(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let body = body.into_inner();
    let update = UserProfileUpdate {
        full_name: body.full_name,
        phone: body.phone,
        avatar_url: body.avatar_url,
        address: body.address,
    };
    let profile =
        web::block(move || state.profiles.update_customer_profile(&principal, update)).await??;
    Ok(HttpResponse::Ok().json(UserProfileResponse::from(profile)))
}

/// PUT /vendors/me
#[utoipa::path(
    put,
    path = "/vendors/me",
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Updated business record", body = VendorResponse),
        (status = 400, description = "Invalid business name"),
        (status = 403, description = "Caller is not acting as a vendor"),
    ),
    tag = "vendors"
)]
pub async fn update_my_vendor(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    body: web::Json<UpdateVendorRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let body = body.into_inner();
    let update = VendorUpdate {
        business_name: body.business_name,
        description: body.description,
        address: body.address,
        logo_url: body.logo_url,
        is_open: body.is_open,
    };
    let vendor = web::block(move || state.profiles.update_vendor(&principal, update)).await??;
    Ok(HttpResponse::Ok().json(VendorResponse::from(vendor)))
}

/// GET /vendors/{id}
///
/// Public view of a vendor: its business record and headline stats.
#[utoipa::path(
    get,
    path = "/vendors/{id}",
    params(("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 200, description = "Vendor found", body = VendorPublicResponse),
        (status = 404, description = "Vendor not found"),
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    state: web::Data<AppState>,
    _principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let vendor_id = path.into_inner();
    let (vendor, stats) = web::block(move || {
        let vendor = state.profiles.vendor(vendor_id)?;
        let stats = state.stats.vendor_stats(vendor_id)?;
        Ok::<_, crate::domain::errors::DomainError>((vendor, stats))
    })
    .await??;
    Ok(HttpResponse::Ok().json(VendorPublicResponse {
        vendor: vendor.into(),
        stats: stats.into(),
    }))
}
