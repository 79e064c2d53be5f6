use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Raw reaction counters for a single comment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentCounts {
    pub likes: u64,
    pub dislikes: u64,
    pub agrees: u64,
    pub disagrees: u64,
    pub replies: u64,
}

/// Comment-level engagement aggregated over all comments of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentEngagement {
    pub comment_count: u64,
    /// Sum of per-comment engagement values. This is the figure that is scored.
    pub total: f64,
    pub average: f64,
}

/// Engagement counters for a content item, rebuilt on every request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub dislikes: u64,
    pub agrees: u64,
    pub disagrees: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub community_notes: u64,
    pub reports: u64,
    pub comment_engagement: CommentEngagement,
}

impl From<CommentCounts> for EngagementMetrics {
    /// A comment is scored like a post whose replies play the role of comments.
    fn from(counts: CommentCounts) -> Self {
        Self {
            likes: counts.likes,
            dislikes: counts.dislikes,
            agrees: counts.agrees,
            disagrees: counts.disagrees,
            comments: counts.replies,
            ..Default::default()
        }
    }
}

/// Score plus the per-term contributions that produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Signed contribution of each weighted metric term
    pub terms: BTreeMap<String, f64>,
    pub raw_engagement: f64,
    pub decay_factor: f64,
    pub reputation_multiplier: f64,
    pub age_hours: f64,
}

/// Candidate post as fetched from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metrics: EngagementMetrics,
    pub author_reputation: Option<f64>,
}

/// Candidate comment as fetched from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub counts: CommentCounts,
    pub author_reputation: Option<f64>,
}

/// Candidate pool a feed post was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSource {
    Following, // posts by followed authors
    Topical,   // posts tagged with the user's topics
    Popular,   // high-engagement posts
    Recent,    // newest posts
}

impl PoolSource {
    pub const ALL: [PoolSource; 4] = [
        PoolSource::Following,
        PoolSource::Topical,
        PoolSource::Popular,
        PoolSource::Recent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolSource::Following => "following",
            PoolSource::Topical => "topical",
            PoolSource::Popular => "popular",
            PoolSource::Recent => "recent",
        }
    }
}

impl std::fmt::Display for PoolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scored feed post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPost {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub score: f64,
    pub source: PoolSource,
    pub metrics: EngagementMetrics,
}

impl RankedPost {
    pub fn new(post: CandidatePost, score: f64, source: PoolSource) -> Self {
        Self {
            post_id: post.id,
            author_id: post.author_id,
            created_at: post.created_at,
            score,
            source,
            metrics: post.metrics,
        }
    }
}

/// Feed generation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAlgorithm {
    /// Weighted random sampling across candidate pools
    #[default]
    ProbabilityCloud,
    /// Deterministic top-N by score
    Ranked,
}

impl FeedAlgorithm {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "probability" | "probability_cloud" => Some(Self::ProbabilityCloud),
            "ranked" => Some(Self::Ranked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub candidates_per_pool: HashMap<PoolSource, usize>,
    pub sampled_per_pool: HashMap<PoolSource, usize>,
    pub total_candidates: usize,
    pub returned: usize,
    pub average_score: f64,
}

/// Trending query, clamped before use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuery {
    pub limit: usize,
    pub min_score: f64,
    pub time_window_hours: i64,
}

impl TrendingQuery {
    pub const MAX_LIMIT: usize = 100;
    pub const MIN_WINDOW_HOURS: i64 = 1;
    pub const MAX_WINDOW_HOURS: i64 = 168;

    /// Clamp every field into its valid range instead of rejecting the query
    pub fn clamped(self) -> Self {
        let min_score = if self.min_score.is_finite() && self.min_score > 0.0 {
            self.min_score
        } else {
            0.0
        };

        Self {
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            min_score,
            time_window_hours: self
                .time_window_hours
                .clamp(Self::MIN_WINDOW_HOURS, Self::MAX_WINDOW_HOURS),
        }
    }
}

impl Default for TrendingQuery {
    fn default() -> Self {
        Self {
            limit: 20,
            min_score: 0.0,
            time_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredComment {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingStats {
    pub total_considered: usize,
    pub within_window: usize,
    pub above_threshold: usize,
    pub returned: usize,
    pub min_score: f64,
    pub max_score: f64,
    pub average_score: f64,
    pub time_window_hours: i64,
    pub min_score_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResult {
    pub trending_comments: Vec<ScoredComment>,
    pub stats: TrendingStats,
}

impl TrendingResult {
    /// Empty result echoing the query that was applied
    pub fn empty(query: &TrendingQuery) -> Self {
        Self {
            trending_comments: Vec::new(),
            stats: TrendingStats {
                time_window_hours: query.time_window_hours,
                min_score_threshold: query.min_score,
                ..Default::default()
            },
        }
    }
}
