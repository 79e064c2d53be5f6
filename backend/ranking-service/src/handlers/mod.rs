pub mod feed;
pub mod scoring;
pub mod trending;

pub use feed::get_feed;
pub use scoring::get_post_score;
pub use trending::get_trending_comments;

use actix_web::{web, HttpResponse};

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Register every route; shared with the integration tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/v1/health/live", web::get().to(health))
        .route("/api/v1/health/ready", web::get().to(health))
        .service(get_feed)
        .service(get_trending_comments)
        .service(get_post_score);
}
