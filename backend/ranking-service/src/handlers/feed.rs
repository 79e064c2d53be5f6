use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::FeedAlgorithm;
use crate::services::{FeedService, FeedWeightsOverride};

const MAX_FEED_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    pub user_id: Uuid,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// JSON object of per-pool weight overrides
    pub weights: Option<String>,
    #[serde(default = "default_algo")]
    pub algo: String,
}

fn default_limit() -> i64 {
    20
}

fn default_algo() -> String {
    "probability".to_string()
}

impl FeedQueryParams {
    fn limit(&self) -> usize {
        self.limit.clamp(0, MAX_FEED_LIMIT) as usize
    }

    /// Malformed weights are ignored so the feed still renders with defaults
    fn weight_overrides(&self) -> Option<FeedWeightsOverride> {
        let raw = self.weights.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        match FeedWeightsOverride::parse(raw) {
            Ok(overrides) => Some(overrides),
            Err(e) => {
                warn!("Ignoring malformed feed weights {:?}: {}", raw, e);
                None
            }
        }
    }
}

/// GET /api/v1/feed
///
/// Personalized feed sampled from the probability cloud (or ranked top-N)
#[get("/api/v1/feed")]
pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    service: web::Data<FeedService>,
) -> Result<HttpResponse> {
    let algorithm = FeedAlgorithm::parse(&query.algo).ok_or_else(|| {
        AppError::BadRequest(
            "Invalid algo parameter. Must be 'probability' or 'ranked'".to_string(),
        )
    })?;

    let limit = query.limit();
    let overrides = query.weight_overrides();

    debug!(
        "Feed request: user={} algo={:?} limit={} overrides={:?}",
        query.user_id, algorithm, limit, overrides
    );

    let response = service
        .generate_feed(query.user_id, limit, overrides.as_ref(), algorithm)
        .await;

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: i64, weights: Option<&str>) -> FeedQueryParams {
        FeedQueryParams {
            user_id: Uuid::nil(),
            limit,
            weights: weights.map(String::from),
            algo: default_algo(),
        }
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(-5, None).limit(), 0);
        assert_eq!(params(0, None).limit(), 0);
        assert_eq!(params(30, None).limit(), 30);
        assert_eq!(params(5000, None).limit(), 100);
    }

    #[test]
    fn test_weight_overrides_parsing() {
        assert_eq!(params(10, None).weight_overrides(), None);
        assert_eq!(params(10, Some("  ")).weight_overrides(), None);
        assert_eq!(params(10, Some("not json")).weight_overrides(), None);

        let overrides = params(10, Some(r#"{"recent": 0.7}"#))
            .weight_overrides()
            .unwrap();
        assert_eq!(overrides.recent, Some(0.7));
        assert_eq!(overrides.following, None);
    }
}
