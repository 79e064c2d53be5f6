use actix_web::{get, web, HttpResponse};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::services::FeedService;

/// GET /api/v1/posts/{post_id}/score
///
/// Engagement score of one post with its per-term breakdown
#[get("/api/v1/posts/{post_id}/score")]
pub async fn get_post_score(
    path: web::Path<Uuid>,
    service: web::Data<FeedService>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    debug!("Score request: post={}", post_id);

    let result = service.score_post(post_id).await?;
    Ok(HttpResponse::Ok().json(result))
}
