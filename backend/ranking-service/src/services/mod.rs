pub mod engagement;
pub mod fallback_ranking;
pub mod feed;
pub mod scoring;
pub mod trending;

pub use feed::{FeedResponse, FeedService, FeedWeights, FeedWeightsOverride};
pub use scoring::EngagementScorer;
pub use trending::TrendingService;
