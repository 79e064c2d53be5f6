pub mod content_repo;

pub use content_repo::PgContentRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CandidateComment, CandidatePost, CommentCounts};

/// Candidate rows and author reputation for scoring
///
/// Every pool query returns posts created at or after `since`, excluding the
/// viewer's own posts, capped at `limit`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Posts by authors the user follows
    async fn following_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>>;

    /// Posts tagged with topics the user subscribes to
    async fn topical_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>>;

    /// Posts with the most raw engagement
    async fn popular_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>>;

    /// Newest posts
    async fn recent_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>>;

    async fn post_with_metrics(&self, post_id: Uuid) -> Result<Option<CandidatePost>>;

    /// Comments on a post, newest first; `since = None` means all of them
    async fn comments_for_post(
        &self,
        post_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<CandidateComment>>;

    /// Reaction counters of the newest `per_post_limit` comments of each post
    ///
    /// Posts without comments are absent from the map.
    async fn comment_counts_for_posts(
        &self,
        post_ids: &[Uuid],
        per_post_limit: i64,
    ) -> Result<HashMap<Uuid, Vec<CommentCounts>>>;
}
