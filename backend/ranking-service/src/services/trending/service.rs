/// Trending Service
///
/// Fetches a post's comments and runs the trending selector over them
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::selector::find_trending_comments;
use crate::config::MAX_TRENDING_FETCH_LIMIT;
use crate::db::ContentRepository;
use crate::error::Result;
use crate::models::{TrendingQuery, TrendingResult};
use crate::services::scoring::EngagementScorer;

pub struct TrendingService {
    repo: Arc<dyn ContentRepository>,
    scorer: EngagementScorer,
    fetch_limit: i64,
}

impl TrendingService {
    pub fn new(repo: Arc<dyn ContentRepository>, scorer: EngagementScorer, fetch_limit: i64) -> Self {
        Self {
            repo,
            scorer,
            fetch_limit: fetch_limit.clamp(1, MAX_TRENDING_FETCH_LIMIT),
        }
    }

    /// Trending comments of a post; storage errors are returned to the caller
    pub async fn trending_comments(
        &self,
        post_id: Uuid,
        query: TrendingQuery,
    ) -> Result<TrendingResult> {
        let query = query.clamped();
        let now = Utc::now();
        let since = now - Duration::hours(query.time_window_hours);

        let comments = self
            .repo
            .comments_for_post(post_id, Some(since), self.fetch_limit)
            .await?;

        debug!(
            post_id = %post_id,
            fetched = comments.len(),
            "Selecting trending comments"
        );

        Ok(find_trending_comments(&self.scorer, &comments, &query, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockContentRepository;
    use crate::error::AppError;
    use crate::models::{CandidateComment, CommentCounts};

    fn comment(post_id: Uuid, likes: u64) -> CandidateComment {
        CandidateComment {
            id: Uuid::new_v4(),
            post_id,
            author_id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::minutes(30),
            counts: CommentCounts {
                likes,
                ..Default::default()
            },
            author_reputation: Some(70.0),
        }
    }

    #[tokio::test]
    async fn test_trending_comments_uses_window_and_fetch_limit() {
        let post_id = Uuid::new_v4();
        let comments = vec![comment(post_id, 1), comment(post_id, 8), comment(post_id, 3)];

        let mut repo = MockContentRepository::new();
        repo.expect_comments_for_post()
            .withf(move |id, since, limit| *id == post_id && since.is_some() && *limit == 50)
            .times(1)
            .returning(move |_, _, _| Ok(comments.clone()));

        let service = TrendingService::new(Arc::new(repo), EngagementScorer::default(), 50);
        let result = service
            .trending_comments(
                post_id,
                TrendingQuery {
                    limit: 2,
                    min_score: 0.0,
                    time_window_hours: 24,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.trending_comments.len(), 2);
        assert_eq!(result.stats.total_considered, 3);
        assert!(result.trending_comments[0].score >= result.trending_comments[1].score);
    }

    #[tokio::test]
    async fn test_oversized_fetch_limit_is_capped() {
        let mut repo = MockContentRepository::new();
        repo.expect_comments_for_post()
            .withf(|_, _, limit| *limit == MAX_TRENDING_FETCH_LIMIT)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let service = TrendingService::new(Arc::new(repo), EngagementScorer::default(), i64::MAX);
        let result = service
            .trending_comments(Uuid::new_v4(), TrendingQuery::default())
            .await
            .unwrap();

        assert!(result.trending_comments.is_empty());
    }

    #[tokio::test]
    async fn test_trending_comments_propagates_storage_errors() {
        let mut repo = MockContentRepository::new();
        repo.expect_comments_for_post()
            .returning(|_, _, _| Err(AppError::Database("connection refused".into())));

        let service = TrendingService::new(Arc::new(repo), EngagementScorer::default(), 50);
        let result = service
            .trending_comments(Uuid::new_v4(), TrendingQuery::default())
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
