use chrono::Duration;
use serde::Deserialize;
use std::env;

use crate::error::{AppError, Result};
use crate::services::feed::{FeedWeights, FeedWeightsOverride};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub scoring: ScoringConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Scoring constants, read from `SCORING_*` variables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub half_life_hours: f64,
    pub decay_floor: f64,

    pub neutral_reputation: f64,
    pub reputation_sensitivity: f64,
    pub min_reputation_multiplier: f64,
    pub max_reputation_multiplier: f64,

    pub weight_likes: f64,
    pub weight_agrees: f64,
    pub weight_disagrees: f64,
    pub weight_comments: f64,
    pub weight_shares: f64,
    pub weight_views: f64,
    pub weight_community_notes: f64,
    pub weight_comment_engagement: f64,
    pub weight_dislikes: f64,
    pub weight_reports: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 24.0,
            decay_floor: 0.05,
            neutral_reputation: 70.0,
            reputation_sensitivity: 1.0 / 60.0,
            min_reputation_multiplier: 0.5,
            max_reputation_multiplier: 1.5,
            weight_likes: 1.0,
            weight_agrees: 1.0,
            weight_disagrees: 0.5,
            weight_comments: 2.0,
            weight_shares: 3.0,
            weight_views: 0.1,
            weight_community_notes: 1.5,
            weight_comment_engagement: 0.5,
            weight_dislikes: -0.5,
            weight_reports: -3.0,
        }
    }
}

/// Feed assembly settings, read from `FEED_*` variables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Candidates fetched per pool
    pub pool_candidate_limit: i64,
    pub candidate_window_hours: i64,
    /// Comments fetched per trending request
    pub trending_fetch_limit: i64,
    pub sampling_smoothing: f64,

    pub weight_following: f64,
    pub weight_topical: f64,
    pub weight_popular: f64,
    pub weight_recent: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let weights = FeedWeights::default();
        Self {
            pool_candidate_limit: 200,
            candidate_window_hours: 168,
            trending_fetch_limit: 500,
            sampling_smoothing: 0.1,
            weight_following: weights.following,
            weight_topical: weights.topical,
            weight_popular: weights.popular,
            weight_recent: weights.recent,
        }
    }
}

/// Upper bounds applied to `FeedConfig` values before use
pub const MAX_CANDIDATE_WINDOW_HOURS: i64 = 24 * 365;
pub const MAX_POOL_CANDIDATE_LIMIT: i64 = 2_000;
pub const MAX_TRENDING_FETCH_LIMIT: i64 = 5_000;

impl FeedConfig {
    /// Candidate look-back window, clamped to `[1h, MAX_CANDIDATE_WINDOW_HOURS]`
    pub fn candidate_window(&self) -> Duration {
        let hours = self
            .candidate_window_hours
            .clamp(1, MAX_CANDIDATE_WINDOW_HOURS);
        Duration::try_hours(hours).unwrap_or_else(|| Duration::days(7))
    }

    pub fn pool_limit(&self) -> i64 {
        self.pool_candidate_limit.clamp(1, MAX_POOL_CANDIDATE_LIMIT)
    }

    pub fn trending_limit(&self) -> i64 {
        self.trending_fetch_limit.clamp(1, MAX_TRENDING_FETCH_LIMIT)
    }

    /// Configured default weights; invalid entries fall back to the built-in defaults
    pub fn default_weights(&self) -> FeedWeights {
        FeedWeights::default().merge(&FeedWeightsOverride {
            following: Some(self.weight_following),
            topical: Some(self.weight_topical),
            popular: Some(self.weight_popular),
            recent: Some(self.weight_recent),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: env::var("APP_PORT")
                    .unwrap_or_else(|_| "8012".to_string())
                    .parse()
                    .map_err(|e| AppError::Config(format!("APP_PORT must be a valid u16: {}", e)))?,
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .map_err(|e| {
                        AppError::Config(format!(
                            "DATABASE_MAX_CONNECTIONS must be a valid u32: {}",
                            e
                        ))
                    })?,
            },
            scoring: envy::prefixed("SCORING_").from_env::<ScoringConfig>()?,
            feed: envy::prefixed("FEED_").from_env::<FeedConfig>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_config_reads_prefixed_values() {
        let vars = vec![
            ("SCORING_HALF_LIFE_HOURS".to_string(), "12".to_string()),
            ("SCORING_WEIGHT_REPORTS".to_string(), "-5".to_string()),
        ];
        let config: ScoringConfig = envy::prefixed("SCORING_").from_iter(vars).unwrap();

        assert_eq!(config.half_life_hours, 12.0);
        assert_eq!(config.weight_reports, -5.0);
        // Unset values keep their defaults
        assert_eq!(config.neutral_reputation, 70.0);
    }

    #[test]
    fn test_feed_config_defaults() {
        let config: FeedConfig = envy::prefixed("FEED_")
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();

        assert_eq!(config.pool_candidate_limit, 200);
        assert_eq!(config.default_weights(), FeedWeights::default());
    }

    #[test]
    fn test_feed_config_invalid_weight_falls_back() {
        let config = FeedConfig {
            weight_popular: -2.0,
            weight_recent: 0.0,
            ..Default::default()
        };
        let weights = config.default_weights();

        assert_eq!(weights.popular, FeedWeights::default().popular);
        // Zero is a valid weight: it disables the pool
        assert_eq!(weights.recent, 0.0);
    }

    #[test]
    fn test_feed_limits_are_clamped_both_ways() {
        let huge = FeedConfig {
            candidate_window_hours: i64::MAX / 2,
            pool_candidate_limit: i64::MAX,
            trending_fetch_limit: i64::MAX,
            ..Default::default()
        };
        assert_eq!(
            huge.candidate_window(),
            Duration::hours(MAX_CANDIDATE_WINDOW_HOURS)
        );
        assert_eq!(huge.pool_limit(), MAX_POOL_CANDIDATE_LIMIT);
        assert_eq!(huge.trending_limit(), MAX_TRENDING_FETCH_LIMIT);

        let tiny = FeedConfig {
            candidate_window_hours: i64::MIN,
            pool_candidate_limit: -4,
            trending_fetch_limit: 0,
            ..Default::default()
        };
        assert_eq!(tiny.candidate_window(), Duration::hours(1));
        assert_eq!(tiny.pool_limit(), 1);
        assert_eq!(tiny.trending_limit(), 1);

        let defaults = FeedConfig::default();
        assert_eq!(defaults.candidate_window(), Duration::hours(168));
        assert_eq!(defaults.pool_limit(), 200);
        assert_eq!(defaults.trending_limit(), 500);
    }
}
