use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::stats_service::Dashboard;
use crate::domain::review::format_average;
use crate::domain::stats::VendorStats;
use crate::errors::AppError;
use crate::handlers::orders::OrderResponse;
use crate::handlers::principal::CurrentPrincipal;
use crate::handlers::profiles::VendorResponse;
use crate::handlers::reviews::ReviewResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub vendor_id: Uuid,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub accepted_orders: i64,
    pub in_progress_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of completed order totals, as a decimal string.
    pub total_earnings: String,
    pub average_rating: Option<f64>,
    pub average_rating_display: String,
    pub rating_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<VendorStats> for StatsResponse {
    fn from(s: VendorStats) -> Self {
        let average = s.average_rating();
        Self {
            vendor_id: s.vendor_id,
            total_orders: s.total_orders,
            pending_orders: s.pending_orders,
            accepted_orders: s.accepted_orders,
            in_progress_orders: s.in_progress_orders,
            completed_orders: s.completed_orders,
            cancelled_orders: s.cancelled_orders,
            total_earnings: s.total_earnings.to_string(),
            average_rating: average,
            average_rating_display: format_average(average),
            rating_count: s.rating_count,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub vendor: VendorResponse,
    pub stats: StatsResponse,
    pub recent_orders: Vec<OrderResponse>,
    pub recent_reviews: Vec<ReviewResponse>,
    /// Parts that could not be loaded and are shown with empty defaults.
    pub degraded: Vec<String>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            vendor: d.vendor.into(),
            stats: d.stats.into(),
            recent_orders: d.recent_orders.into_iter().map(Into::into).collect(),
            recent_reviews: d.recent_reviews.into_iter().map(Into::into).collect(),
            degraded: d.degraded.into_iter().map(str::to_string).collect(),
        }
    }
}

/// GET /vendors/{id}/stats
#[utoipa::path(
    get,
    path = "/vendors/{id}/stats",
    params(("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 200, description = "Vendor statistics", body = StatsResponse),
        (status = 404, description = "Vendor not found"),
    ),
    tag = "stats"
)]
pub async fn get_vendor_stats(
    state: web::Data<AppState>,
    _principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let vendor_id = path.into_inner();
    let stats = web::block(move || state.stats.vendor_stats(vendor_id)).await??;
    Ok(HttpResponse::Ok().json(StatsResponse::from(stats)))
}

/// POST /vendors/{id}/stats/recompute
///
/// Rebuilds the stored aggregate from the order and review rows.
#[utoipa::path(
    post,
    path = "/vendors/{id}/stats/recompute",
    params(("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 200, description = "Recomputed statistics", body = StatsResponse),
        (status = 403, description = "Caller does not own this vendor"),
    ),
    tag = "stats"
)]
pub async fn recompute_vendor_stats(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let vendor_id = path.into_inner();
    let stats = web::block(move || state.stats.recompute(&principal, vendor_id)).await??;
    Ok(HttpResponse::Ok().json(StatsResponse::from(stats)))
}

/// GET /dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Vendor dashboard", body = DashboardResponse),
        (status = 403, description = "Caller is not acting as a vendor"),
    ),
    tag = "stats"
)]
pub async fn vendor_dashboard(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let dashboard = web::block(move || state.stats.dashboard(&principal)).await??;
    Ok(HttpResponse::Ok().json(DashboardResponse::from(dashboard)))
}
