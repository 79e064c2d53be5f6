/// Trending API Handlers
///
/// HTTP endpoints for trending comments
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{TrendingQuery, TrendingResult};
use crate::services::TrendingService;

/// Query parameters for GET /api/v1/posts/{post_id}/comments/trending
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQueryParams {
    /// Limit (default: 20, max: 100)
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub min_score: f64,

    /// Window in hours (default: 24, range 1..=168)
    #[serde(default = "default_time_window", alias = "timeWindowHours")]
    pub time_window: i64,
}

fn default_limit() -> i64 {
    20
}

fn default_time_window() -> i64 {
    24
}

impl TrendingQueryParams {
    pub fn to_query(&self) -> TrendingQuery {
        TrendingQuery {
            limit: self.limit.max(1) as usize,
            min_score: self.min_score,
            time_window_hours: self.time_window,
        }
        .clamped()
    }
}

/// GET /api/v1/posts/{post_id}/comments/trending
///
/// Storage failures return an empty result rather than an error
#[get("/api/v1/posts/{post_id}/comments/trending")]
pub async fn get_trending_comments(
    path: web::Path<Uuid>,
    query: web::Query<TrendingQueryParams>,
    service: web::Data<TrendingService>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let trending_query = query.to_query();

    debug!(
        "Trending comments request: post={} limit={} min_score={} window={}h",
        post_id, trending_query.limit, trending_query.min_score, trending_query.time_window_hours
    );

    let result = match service.trending_comments(post_id, trending_query).await {
        Ok(result) => result,
        Err(e) => {
            error!(
                "Failed to load trending comments for post {}, returning empty result: {}",
                post_id, e
            );
            TrendingResult::empty(&trending_query)
        }
    };

    Ok(HttpResponse::Ok().json(result))
}
