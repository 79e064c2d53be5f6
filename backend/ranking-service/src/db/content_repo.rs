/// Content Repository
///
/// PostgreSQL queries for feed candidates and comments. Reaction counters are
/// denormalized on `posts` and `comments`; reputation lives on `users`.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

use super::ContentRepository;
use crate::error::{AppError, Result};
use crate::models::{CandidateComment, CandidatePost, CommentCounts, EngagementMetrics};

const POST_COLUMNS: &str = r#"
    p.id, p.user_id, p.created_at,
    p.likes_count::BIGINT AS likes_count,
    p.dislikes_count::BIGINT AS dislikes_count,
    p.agrees_count::BIGINT AS agrees_count,
    p.disagrees_count::BIGINT AS disagrees_count,
    p.comments_count::BIGINT AS comments_count,
    p.shares_count::BIGINT AS shares_count,
    p.views_count::BIGINT AS views_count,
    p.community_notes_count::BIGINT AS community_notes_count,
    p.reports_count::BIGINT AS reports_count,
    u.reputation::DOUBLE PRECISION AS author_reputation
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    likes_count: i64,
    dislikes_count: i64,
    agrees_count: i64,
    disagrees_count: i64,
    comments_count: i64,
    shares_count: i64,
    views_count: i64,
    community_notes_count: i64,
    reports_count: i64,
    author_reputation: Option<f64>,
}

impl From<PostRow> for CandidatePost {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.user_id,
            created_at: row.created_at,
            metrics: EngagementMetrics {
                likes: count(row.likes_count),
                dislikes: count(row.dislikes_count),
                agrees: count(row.agrees_count),
                disagrees: count(row.disagrees_count),
                comments: count(row.comments_count),
                shares: count(row.shares_count),
                views: count(row.views_count),
                community_notes: count(row.community_notes_count),
                reports: count(row.reports_count),
                ..Default::default()
            },
            author_reputation: row.author_reputation,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    likes_count: i64,
    dislikes_count: i64,
    agrees_count: i64,
    disagrees_count: i64,
    replies_count: i64,
    author_reputation: Option<f64>,
}

impl From<CommentRow> for CandidateComment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.user_id,
            created_at: row.created_at,
            counts: CommentCounts {
                likes: count(row.likes_count),
                dislikes: count(row.dislikes_count),
                agrees: count(row.agrees_count),
                disagrees: count(row.disagrees_count),
                replies: count(row.replies_count),
            },
            author_reputation: row.author_reputation,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentCountsRow {
    post_id: Uuid,
    likes_count: i64,
    dislikes_count: i64,
    agrees_count: i64,
    disagrees_count: i64,
    replies_count: i64,
}

impl From<&CommentCountsRow> for CommentCounts {
    fn from(row: &CommentCountsRow) -> Self {
        Self {
            likes: count(row.likes_count),
            dislikes: count(row.dislikes_count),
            agrees: count(row.agrees_count),
            disagrees: count(row.disagrees_count),
            replies: count(row.replies_count),
        }
    }
}

/// Counters are non-negative by schema; clamp anyway before the cast
fn count(value: i64) -> u64 {
    value.max(0) as u64
}

pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_posts(
        &self,
        pool_name: &str,
        sql: &str,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>> {
        let rows = sqlx::query_as::<_, PostRow>(sql)
            .bind(user_id)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch {} candidates: {}", pool_name, e);
                AppError::Database(e.to_string())
            })?;

        Ok(rows.into_iter().map(CandidatePost::from).collect())
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn following_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN follows f ON f.following_id = p.user_id
            LEFT JOIN users u ON u.id = p.user_id
            WHERE f.follower_id = $1
              AND p.created_at >= $2
              AND p.deleted_at IS NULL
            ORDER BY p.created_at DESC
            LIMIT $3
            "#
        );
        self.fetch_posts("following", &sql, user_id, since, limit).await
    }

    async fn topical_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.id IN (
                SELECT pt.post_id
                FROM post_topics pt
                JOIN user_topics ut ON ut.topic_id = pt.topic_id
                WHERE ut.user_id = $1
            )
              AND p.user_id <> $1
              AND p.created_at >= $2
              AND p.deleted_at IS NULL
            ORDER BY p.created_at DESC
            LIMIT $3
            "#
        );
        self.fetch_posts("topical", &sql, user_id, since, limit).await
    }

    async fn popular_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.user_id <> $1
              AND p.created_at >= $2
              AND p.deleted_at IS NULL
            ORDER BY (p.likes_count + p.agrees_count + p.comments_count * 2
                      + p.shares_count * 3 - p.reports_count * 3) DESC,
                     p.created_at DESC
            LIMIT $3
            "#
        );
        self.fetch_posts("popular", &sql, user_id, since, limit).await
    }

    async fn recent_posts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidatePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.user_id <> $1
              AND p.created_at >= $2
              AND p.deleted_at IS NULL
            ORDER BY p.created_at DESC
            LIMIT $3
            "#
        );
        self.fetch_posts("recent", &sql, user_id, since, limit).await
    }

    async fn post_with_metrics(&self, post_id: Uuid) -> Result<Option<CandidatePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.id = $1 AND p.deleted_at IS NULL
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch post {}: {}", post_id, e);
                AppError::Database(e.to_string())
            })?;

        Ok(row.map(CandidatePost::from))
    }

    async fn comments_for_post(
        &self,
        post_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<CandidateComment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.post_id, c.user_id, c.created_at,
                   c.likes_count::BIGINT AS likes_count,
                   c.dislikes_count::BIGINT AS dislikes_count,
                   c.agrees_count::BIGINT AS agrees_count,
                   c.disagrees_count::BIGINT AS disagrees_count,
                   (SELECT COUNT(*) FROM comments r
                    WHERE r.parent_id = c.id AND r.deleted_at IS NULL) AS replies_count,
                   u.reputation::DOUBLE PRECISION AS author_reputation
            FROM comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR c.created_at >= $2)
              AND c.deleted_at IS NULL
            ORDER BY c.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(post_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch comments for post {}: {}", post_id, e);
            AppError::Database(e.to_string())
        })?;

        Ok(rows.into_iter().map(CandidateComment::from).collect())
    }

    async fn comment_counts_for_posts(
        &self,
        post_ids: &[Uuid],
        per_post_limit: i64,
    ) -> Result<HashMap<Uuid, Vec<CommentCounts>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, CommentCountsRow>(
            r#"
            SELECT post_id, likes_count, dislikes_count, agrees_count,
                   disagrees_count, replies_count
            FROM (
                SELECT c.post_id,
                       c.likes_count::BIGINT AS likes_count,
                       c.dislikes_count::BIGINT AS dislikes_count,
                       c.agrees_count::BIGINT AS agrees_count,
                       c.disagrees_count::BIGINT AS disagrees_count,
                       (SELECT COUNT(*) FROM comments r
                        WHERE r.parent_id = c.id AND r.deleted_at IS NULL) AS replies_count,
                       ROW_NUMBER() OVER (
                           PARTITION BY c.post_id ORDER BY c.created_at DESC
                       ) AS rn
                FROM comments c
                WHERE c.post_id = ANY($1)
                  AND c.deleted_at IS NULL
            ) newest
            WHERE rn <= $2
            "#,
        )
        .bind(post_ids)
        .bind(per_post_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch comment counts for {} posts: {}", post_ids.len(), e);
            AppError::Database(e.to_string())
        })?;

        let mut by_post: HashMap<Uuid, Vec<CommentCounts>> = HashMap::new();
        for row in &rows {
            by_post.entry(row.post_id).or_default().push(row.into());
        }
        Ok(by_post)
    }
}
