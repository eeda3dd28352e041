use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::review_service::VendorReviews;
use crate::domain::review::{format_average, Review};
use crate::errors::AppError;
use crate::handlers::principal::CurrentPrincipal;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    /// 1 to 5
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            order_id: r.order_id,
            vendor_id: r.vendor_id,
            customer_id: r.customer_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    /// Mean rating to one decimal, null when there are no reviews.
    pub average_rating: Option<f64>,
    /// Same value for display: "4.0", or "N/A" when unrated.
    pub average_rating_display: String,
    pub rating_count: i64,
}

impl From<VendorReviews> for VendorReviewsResponse {
    fn from(v: VendorReviews) -> Self {
        Self {
            reviews: v.reviews.into_iter().map(Into::into).collect(),
            average_rating: v.average_rating,
            average_rating_display: format_average(v.average_rating),
            rating_count: v.rating_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListReviewsParams {
    pub limit: Option<i64>,
}

/// POST /orders/{id}/review
#[utoipa::path(
    post,
    path = "/orders/{id}/review",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Rating out of range or order not completed"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already reviewed"),
    ),
    tag = "reviews"
)]
pub async fn submit_review(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
    body: web::Json<SubmitReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let order_id = path.into_inner();
    let SubmitReviewRequest { rating, comment } = body.into_inner();

    let review =
        web::block(move || state.reviews.submit(&principal, order_id, rating, comment)).await??;

    Ok(HttpResponse::Created().json(ReviewResponse::from(review)))
}

/// GET /vendors/{id}/reviews
#[utoipa::path(
    get,
    path = "/vendors/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Vendor UUID"),
        ("limit" = Option<i64>, Query, description = "Most recent reviews to return"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first, with the average", body = VendorReviewsResponse),
    ),
    tag = "reviews"
)]
pub async fn list_vendor_reviews(
    state: web::Data<AppState>,
    _principal: CurrentPrincipal,
    path: web::Path<Uuid>,
    query: web::Query<ListReviewsParams>,
) -> Result<HttpResponse, AppError> {
    let vendor_id = path.into_inner();
    let limit = query.into_inner().limit.map(|l| l.clamp(1, 100));

    let reviews = web::block(move || state.reviews.list_for_vendor(vendor_id, limit)).await??;

    Ok(HttpResponse::Ok().json(VendorReviewsResponse::from(reviews)))
}
