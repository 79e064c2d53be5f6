//! Probability-cloud feed
//!
//! Candidates come from four pools (following, topical, popular, recent).
//! Every candidate is scored with the engagement scorer, then the sampler
//! draws the feed pool-by-pool according to the request's weights.
//!
//! Candidates get the same comment aggregation as the score endpoint before
//! scoring, so a post's feed score matches `score_post`.
//!
//! A pool whose fetch fails is logged and treated as empty, so a storage
//! problem degrades the feed instead of failing the request.

pub mod sampler;
pub mod weights;

pub use sampler::{CandidatePool, ProbabilityCloudSampler, SampledFeed};
pub use weights::{FeedWeights, FeedWeightsOverride};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::models::{
    CandidatePost, CommentCounts, EngagementMetrics, FeedAlgorithm, FeedStats, PoolSource,
    RankedPost, ScoreResult,
};
use crate::services::fallback_ranking::rank_pools;
use crate::services::scoring::EngagementScorer;

/// Newest comments per post folded into its score
const SCORE_COMMENT_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub posts: Vec<RankedPost>,
    pub algorithm: FeedAlgorithm,
    /// Weights actually applied after merging overrides
    pub weights: FeedWeights,
    pub stats: FeedStats,
}

impl FeedResponse {
    pub fn empty(algorithm: FeedAlgorithm, weights: FeedWeights) -> Self {
        Self {
            posts: Vec::new(),
            algorithm,
            weights,
            stats: FeedStats::default(),
        }
    }
}

pub struct FeedService {
    repo: Arc<dyn ContentRepository>,
    scorer: EngagementScorer,
    sampler: ProbabilityCloudSampler,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(repo: Arc<dyn ContentRepository>, scorer: EngagementScorer, config: FeedConfig) -> Self {
        Self {
            repo,
            scorer,
            sampler: ProbabilityCloudSampler::new(config.sampling_smoothing),
            config,
        }
    }

    pub fn default_weights(&self) -> FeedWeights {
        self.config.default_weights()
    }

    /// Generate a feed for `user_id`
    ///
    /// Returns at most `limit` unique posts, fewer only when the pools run dry.
    pub async fn generate_feed(
        &self,
        user_id: Uuid,
        limit: usize,
        overrides: Option<&FeedWeightsOverride>,
        algorithm: FeedAlgorithm,
    ) -> FeedResponse {
        let defaults = self.default_weights();
        let weights = match overrides {
            Some(o) => defaults.merge(o),
            None => defaults,
        };

        if limit == 0 {
            return FeedResponse::empty(algorithm, weights);
        }

        let now = Utc::now();
        let since = now
            .checked_sub_signed(self.config.candidate_window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let raw_pools = self.fetch_pools(user_id, since, &weights).await;
        let comments = self.fetch_comment_counts(&raw_pools).await;
        let pools: Vec<CandidatePool> = raw_pools
            .into_iter()
            .map(|(source, candidates)| self.score_pool(source, candidates, &comments, now))
            .collect();

        let candidates_per_pool: HashMap<PoolSource, usize> =
            pools.iter().map(|p| (p.source, p.posts.len())).collect();
        debug!(user_id = %user_id, pools = ?candidates_per_pool, "Candidate pools fetched");

        let mut stats = FeedStats {
            total_candidates: candidates_per_pool.values().sum(),
            candidates_per_pool,
            ..Default::default()
        };

        let sampled = match algorithm {
            FeedAlgorithm::ProbabilityCloud => {
                // Fresh entropy per request: no RNG state shared between users
                let mut rng = StdRng::from_entropy();
                self.sampler.sample(pools, limit, &weights, &mut rng)
            }
            FeedAlgorithm::Ranked => rank_pools(pools, limit, &weights),
        };

        stats.returned = sampled.posts.len();
        stats.sampled_per_pool = sampled.sampled_per_pool;
        if !sampled.posts.is_empty() {
            stats.average_score =
                sampled.posts.iter().map(|p| p.score).sum::<f64>() / sampled.posts.len() as f64;
        }

        info!(
            user_id = %user_id,
            algorithm = ?algorithm,
            candidates = stats.total_candidates,
            returned = stats.returned,
            "Feed generated"
        );

        FeedResponse {
            posts: sampled.posts,
            algorithm,
            weights,
            stats,
        }
    }

    /// Score one post, aggregating engagement from its comments
    pub async fn score_post(&self, post_id: Uuid) -> Result<ScoreResult> {
        let post = self
            .repo
            .post_with_metrics(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        let comments = self
            .repo
            .comment_counts_for_posts(&[post_id], SCORE_COMMENT_LIMIT)
            .await?;
        let metrics = self.metrics_with_comments(&post, &comments);

        Ok(self
            .scorer
            .calculate_score(&metrics, post.created_at, post.author_reputation))
    }

    async fn fetch_pools(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        weights: &FeedWeights,
    ) -> Vec<(PoolSource, Vec<CandidatePost>)> {
        let mut pools = Vec::with_capacity(PoolSource::ALL.len());

        for source in PoolSource::ALL {
            if !weights.is_active(source) {
                debug!("Skipping {} pool: weight is zero", source);
                continue;
            }

            let candidates = match self.fetch_pool(source, user_id, since).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Candidate pool {} unavailable, continuing without it: {}", source, e);
                    Vec::new()
                }
            };

            pools.push((source, candidates));
        }

        pools
    }

    /// One batched lookup for every distinct candidate
    ///
    /// On failure candidates are scored without comment engagement.
    async fn fetch_comment_counts(
        &self,
        pools: &[(PoolSource, Vec<CandidatePost>)],
    ) -> HashMap<Uuid, Vec<CommentCounts>> {
        let mut seen = HashSet::new();
        let post_ids: Vec<Uuid> = pools
            .iter()
            .flat_map(|(_, candidates)| candidates.iter().map(|p| p.id))
            .filter(|id| seen.insert(*id))
            .collect();

        if post_ids.is_empty() {
            return HashMap::new();
        }

        match self
            .repo
            .comment_counts_for_posts(&post_ids, SCORE_COMMENT_LIMIT)
            .await
        {
            Ok(counts) => counts,
            Err(e) => {
                warn!(
                    "Comment engagement unavailable for {} candidates: {}",
                    post_ids.len(),
                    e
                );
                HashMap::new()
            }
        }
    }

    fn metrics_with_comments(
        &self,
        post: &CandidatePost,
        comments: &HashMap<Uuid, Vec<CommentCounts>>,
    ) -> EngagementMetrics {
        let counts = comments.get(&post.id).map(Vec::as_slice).unwrap_or(&[]);
        post.metrics
            .with_comments(counts, self.scorer.comment_weights())
    }

    async fn fetch_pool(
        &self,
        source: PoolSource,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CandidatePost>> {
        let limit = self.config.pool_limit();
        match source {
            PoolSource::Following => self.repo.following_posts(user_id, since, limit).await,
            PoolSource::Topical => self.repo.topical_posts(user_id, since, limit).await,
            PoolSource::Popular => self.repo.popular_posts(user_id, since, limit).await,
            PoolSource::Recent => self.repo.recent_posts(user_id, since, limit).await,
        }
    }

    fn score_pool(
        &self,
        source: PoolSource,
        candidates: Vec<CandidatePost>,
        comments: &HashMap<Uuid, Vec<CommentCounts>>,
        now: DateTime<Utc>,
    ) -> CandidatePool {
        let posts = candidates
            .into_iter()
            .map(|post| {
                let metrics = self.metrics_with_comments(&post, comments);
                let score = self
                    .scorer
                    .calculate_score_at(&metrics, post.created_at, post.author_reputation, now)
                    .score;
                RankedPost::new(CandidatePost { metrics, ..post }, score, source)
            })
            .collect();

        CandidatePool::new(source, posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_CANDIDATE_WINDOW_HOURS, MAX_POOL_CANDIDATE_LIMIT};
    use crate::db::MockContentRepository;
    use chrono::Duration;

    fn candidate(likes: u64) -> CandidatePost {
        CandidatePost {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::hours(2),
            metrics: EngagementMetrics {
                likes,
                ..Default::default()
            },
            author_reputation: Some(70.0),
        }
    }

    fn candidates(n: u64) -> Vec<CandidatePost> {
        (0..n).map(candidate).collect()
    }

    fn mock_with_pools(n: u64) -> MockContentRepository {
        let mut repo = MockContentRepository::new();
        let following = candidates(n);
        let topical = candidates(n);
        let popular = candidates(n);
        let recent = candidates(n);
        repo.expect_following_posts()
            .returning(move |_, _, _| Ok(following.clone()));
        repo.expect_topical_posts()
            .returning(move |_, _, _| Ok(topical.clone()));
        repo.expect_popular_posts()
            .returning(move |_, _, _| Ok(popular.clone()));
        repo.expect_recent_posts()
            .returning(move |_, _, _| Ok(recent.clone()));
        repo.expect_comment_counts_for_posts()
            .returning(|_, _| Ok(HashMap::new()));
        repo
    }

    fn for_each_pool(repo: &mut MockContentRepository, posts: Vec<CandidatePost>) {
        let (a, b, c, d) = (posts.clone(), posts.clone(), posts.clone(), posts);
        repo.expect_following_posts()
            .returning(move |_, _, _| Ok(a.clone()));
        repo.expect_topical_posts()
            .returning(move |_, _, _| Ok(b.clone()));
        repo.expect_popular_posts()
            .returning(move |_, _, _| Ok(c.clone()));
        repo.expect_recent_posts()
            .returning(move |_, _, _| Ok(d.clone()));
    }

    fn service(repo: MockContentRepository) -> FeedService {
        FeedService::new(Arc::new(repo), EngagementScorer::default(), FeedConfig::default())
    }

    #[tokio::test]
    async fn test_generate_feed_respects_limit_without_duplicates() {
        let service = service(mock_with_pools(10));
        let feed = service
            .generate_feed(Uuid::new_v4(), 15, None, FeedAlgorithm::ProbabilityCloud)
            .await;

        let ids: HashSet<Uuid> = feed.posts.iter().map(|p| p.post_id).collect();
        assert_eq!(feed.posts.len(), 15);
        assert_eq!(ids.len(), 15);
        assert_eq!(feed.stats.total_candidates, 40);
        assert_eq!(feed.stats.returned, 15);
        assert_eq!(feed.weights, FeedWeights::default());
        assert_eq!(feed.algorithm, FeedAlgorithm::ProbabilityCloud);
    }

    #[tokio::test]
    async fn test_generate_feed_limit_zero_skips_storage() {
        // No expectations: any repository call would panic
        let service = service(MockContentRepository::new());
        let feed = service
            .generate_feed(Uuid::new_v4(), 0, None, FeedAlgorithm::ProbabilityCloud)
            .await;

        assert!(feed.posts.is_empty());
        assert_eq!(feed.stats.total_candidates, 0);
    }

    #[tokio::test]
    async fn test_zero_weight_pool_is_not_fetched() {
        let mut repo = MockContentRepository::new();
        let topical = candidates(5);
        repo.expect_following_posts().times(0);
        repo.expect_topical_posts()
            .returning(move |_, _, _| Ok(topical.clone()));
        repo.expect_popular_posts().returning(|_, _, _| Ok(vec![]));
        repo.expect_recent_posts().returning(|_, _, _| Ok(vec![]));
        repo.expect_comment_counts_for_posts()
            .returning(|_, _| Ok(HashMap::new()));

        let overrides = FeedWeightsOverride {
            following: Some(0.0),
            ..Default::default()
        };
        let feed = service(repo)
            .generate_feed(
                Uuid::new_v4(),
                10,
                Some(&overrides),
                FeedAlgorithm::ProbabilityCloud,
            )
            .await;

        assert_eq!(feed.weights.following, 0.0);
        assert_eq!(feed.weights.topical, FeedWeights::default().topical);
        assert_eq!(feed.posts.len(), 5);
        assert!(feed.posts.iter().all(|p| p.source == PoolSource::Topical));
        assert!(!feed.stats.candidates_per_pool.contains_key(&PoolSource::Following));
    }

    #[tokio::test]
    async fn test_failing_pool_degrades_gracefully() {
        let mut repo = MockContentRepository::new();
        let recent = candidates(4);
        repo.expect_following_posts()
            .returning(|_, _, _| Err(AppError::Database("timeout".into())));
        repo.expect_topical_posts()
            .returning(|_, _, _| Err(AppError::Database("timeout".into())));
        repo.expect_popular_posts()
            .returning(|_, _, _| Err(AppError::Database("timeout".into())));
        repo.expect_recent_posts()
            .returning(move |_, _, _| Ok(recent.clone()));
        repo.expect_comment_counts_for_posts()
            .returning(|_, _| Err(AppError::Database("timeout".into())));

        let feed = service(repo)
            .generate_feed(Uuid::new_v4(), 10, None, FeedAlgorithm::ProbabilityCloud)
            .await;

        assert_eq!(feed.posts.len(), 4);
        assert_eq!(feed.stats.candidates_per_pool[&PoolSource::Following], 0);
        assert_eq!(feed.stats.sampled_per_pool[&PoolSource::Recent], 4);
    }

    #[tokio::test]
    async fn test_ranked_algorithm_is_sorted() {
        let service = service(mock_with_pools(6));
        let feed = service
            .generate_feed(Uuid::new_v4(), 10, None, FeedAlgorithm::Ranked)
            .await;

        assert_eq!(feed.posts.len(), 10);
        assert!(feed.posts.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(feed.algorithm, FeedAlgorithm::Ranked);
    }

    #[tokio::test]
    async fn test_score_post_includes_comment_engagement() {
        let post = candidate(10);
        let post_id = post.id;
        let comments = vec![
            CommentCounts {
                likes: 2,
                replies: 1,
                ..Default::default()
            },
            CommentCounts {
                agrees: 4,
                dislikes: 2,
                ..Default::default()
            },
        ];

        let mut repo = MockContentRepository::new();
        repo.expect_post_with_metrics()
            .returning(move |_| Ok(Some(post.clone())));
        repo.expect_comment_counts_for_posts()
            .withf(move |ids, limit| {
                ids.len() == 1 && ids[0] == post_id && *limit == SCORE_COMMENT_LIMIT
            })
            .returning(move |_, _| Ok(HashMap::from([(post_id, comments.clone())])));

        let result = service(repo).score_post(post_id).await.unwrap();

        assert!(result.score > 0.0);
        // ln(1 + 7) * 0.5
        let expected = 0.5 * 8.0_f64.ln();
        assert!((result.breakdown.terms["commentEngagement"] - expected).abs() < 1e-9);
        // comments counter raised from 0 to the two fetched comments
        assert!((result.breakdown.terms["comments"] - 2.0 * 3.0_f64.ln()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feed_score_matches_score_endpoint() {
        let post = candidate(5);
        let post_id = post.id;
        let busy_comment = CommentCounts {
            likes: 20,
            replies: 5,
            ..Default::default()
        };
        let comments = HashMap::from([(post_id, vec![busy_comment; 2])]);

        let mut repo = MockContentRepository::new();
        for_each_pool(&mut repo, vec![post.clone()]);
        repo.expect_post_with_metrics()
            .returning(move |_| Ok(Some(post.clone())));
        repo.expect_comment_counts_for_posts()
            .returning(move |_, _| Ok(comments.clone()));
        let service = service(repo);

        let feed = service
            .generate_feed(Uuid::new_v4(), 10, None, FeedAlgorithm::Ranked)
            .await;
        let scored = service.score_post(post_id).await.unwrap();

        assert_eq!(feed.posts.len(), 1);
        let item = &feed.posts[0];
        assert_eq!(item.metrics.comment_engagement.total, 60.0);
        assert_eq!(item.metrics.comments, 2);
        // Only the clock moves between the two calls
        assert!((item.score - scored.score).abs() < 1e-6 * scored.score);
    }

    #[tokio::test]
    async fn test_comment_lookup_failure_scores_without_comments() {
        let post = candidate(5);

        let mut repo = MockContentRepository::new();
        for_each_pool(&mut repo, vec![post]);
        repo.expect_comment_counts_for_posts()
            .times(1)
            .returning(|_, _| Err(AppError::Database("timeout".into())));

        let feed = service(repo)
            .generate_feed(Uuid::new_v4(), 10, None, FeedAlgorithm::Ranked)
            .await;

        assert_eq!(feed.posts.len(), 1);
        assert!(feed.posts[0].score > 0.0);
        assert_eq!(feed.posts[0].metrics.comment_engagement.total, 0.0);
    }

    #[tokio::test]
    async fn test_oversized_feed_config_is_clamped() {
        let mut repo = MockContentRepository::new();
        let posts = candidates(3);
        repo.expect_following_posts()
            .withf(|_, since, limit| {
                *limit == MAX_POOL_CANDIDATE_LIMIT
                    && *since >= Utc::now() - Duration::hours(MAX_CANDIDATE_WINDOW_HOURS + 1)
            })
            .returning(move |_, _, _| Ok(posts.clone()));
        repo.expect_topical_posts().returning(|_, _, _| Ok(vec![]));
        repo.expect_popular_posts().returning(|_, _, _| Ok(vec![]));
        repo.expect_recent_posts().returning(|_, _, _| Ok(vec![]));
        repo.expect_comment_counts_for_posts()
            .returning(|_, _| Ok(HashMap::new()));

        let config = FeedConfig {
            candidate_window_hours: i64::MAX / 2,
            pool_candidate_limit: i64::MAX,
            ..Default::default()
        };
        let service = FeedService::new(Arc::new(repo), EngagementScorer::default(), config);
        let feed = service
            .generate_feed(Uuid::new_v4(), 10, None, FeedAlgorithm::ProbabilityCloud)
            .await;

        assert_eq!(feed.posts.len(), 3);
    }

    #[tokio::test]
    async fn test_score_post_not_found() {
        let mut repo = MockContentRepository::new();
        repo.expect_post_with_metrics().returning(|_| Ok(None));

        let result = service(repo).score_post(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
