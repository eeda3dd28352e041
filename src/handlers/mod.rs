pub mod messages;
pub mod offerings;
pub mod orders;
pub mod principal;
pub mod profiles;
pub mod reviews;
pub mod stats;

use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Gas delivery marketplace"),
    paths(
        health,
        profiles::get_my_profile,
        profiles::update_my_profile,
        profiles::update_my_vendor,
        profiles::get_vendor,
        offerings::create_offering,
        offerings::update_offering,
        offerings::deactivate_offering,
        offerings::list_vendor_offerings,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::cancel_order,
        orders::mark_paid,
        reviews::submit_review,
        reviews::list_vendor_reviews,
        stats::get_vendor_stats,
        stats::recompute_vendor_stats,
        stats::vendor_dashboard,
        messages::send_message,
        messages::list_conversation,
        messages::stream_conversation,
        messages::mark_read,
        messages::unread_count,
    )
)]
pub struct ApiDoc;

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Registers every API route. `/vendors/me` must come before `/vendors/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::resource("/profiles/me")
                .route(web::get().to(profiles::get_my_profile))
                .route(web::put().to(profiles::update_my_profile)),
        )
        .route("/dashboard", web::get().to(stats::vendor_dashboard))
        .service(
            web::scope("/vendors")
                .route("/me", web::put().to(profiles::update_my_vendor))
                .route("/{id}", web::get().to(profiles::get_vendor))
                .route(
                    "/{id}/services",
                    web::get().to(offerings::list_vendor_offerings),
                )
                .route("/{id}/reviews", web::get().to(reviews::list_vendor_reviews))
                .route("/{id}/stats", web::get().to(stats::get_vendor_stats))
                .route(
                    "/{id}/stats/recompute",
                    web::post().to(stats::recompute_vendor_stats),
                ),
        )
        .service(
            web::scope("/services")
                .route("", web::post().to(offerings::create_offering))
                .route("/{id}", web::put().to(offerings::update_offering))
                .route("/{id}", web::delete().to(offerings::deactivate_offering)),
        )
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::list_orders))
                .route("/{id}", web::get().to(orders::get_order))
                .route("/{id}/status", web::put().to(orders::update_status))
                .route("/{id}/cancel", web::post().to(orders::cancel_order))
                .route("/{id}/paid", web::post().to(orders::mark_paid))
                .route("/{id}/review", web::post().to(reviews::submit_review)),
        )
        .service(
            web::scope("/messages")
                .route("", web::post().to(messages::send_message))
                .route("/unread/count", web::get().to(messages::unread_count))
                .route("/{id}/read", web::post().to(messages::mark_read))
                .route(
                    "/{counterpart_id}/stream",
                    web::get().to(messages::stream_conversation),
                )
                .route(
                    "/{counterpart_id}",
                    web::get().to(messages::list_conversation),
                ),
        );
}
