/// Trending/Discovery Service
///
/// Trending comments of a post, ranked by engagement score with time decay
pub mod selector;
pub mod service;

pub use selector::find_trending_comments;
pub use service::TrendingService;
