/// Engagement Scoring
///
/// Pure scoring functions used by both trending selection and the feed.
///
/// `score = max(0, Σ weight_i · ln(1 + metric_i)) · decay(age) · reputation(author)`
pub mod compositor;
pub mod decay;
pub mod reputation;

pub use compositor::{EngagementScorer, MetricWeights};
pub use decay::{age_hours, TimeDecay};
pub use reputation::ReputationWeighting;
