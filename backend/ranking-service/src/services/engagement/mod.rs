/// Engagement Metrics Aggregator
///
/// Folds per-comment reaction counters into one `CommentEngagement` figure
/// attached to the parent post's metrics.
use crate::models::{CommentCounts, CommentEngagement, EngagementMetrics};

/// Per-comment reaction weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentWeights {
    pub likes: f64,
    pub agrees: f64,
    pub disagrees: f64,
    pub replies: f64,
    pub dislikes: f64,
}

impl Default for CommentWeights {
    fn default() -> Self {
        Self {
            likes: 1.0,
            agrees: 1.0,
            disagrees: 0.5, // disagreement is still participation
            replies: 2.0,
            dislikes: -0.5,
        }
    }
}

/// Engagement value of a single comment, never negative
pub fn comment_value(counts: &CommentCounts, weights: &CommentWeights) -> f64 {
    let value = counts.likes as f64 * weights.likes
        + counts.agrees as f64 * weights.agrees
        + counts.disagrees as f64 * weights.disagrees
        + counts.replies as f64 * weights.replies
        + counts.dislikes as f64 * weights.dislikes;

    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Aggregate comment engagement by summing per-comment values
///
/// The sum is what gets scored, so a widely discussed post outranks one with a
/// single well-liked comment. The average is reported alongside it.
pub fn aggregate_comment_engagement(
    comments: &[CommentCounts],
    weights: &CommentWeights,
) -> CommentEngagement {
    if comments.is_empty() {
        return CommentEngagement::default();
    }

    let total: f64 = comments.iter().map(|c| comment_value(c, weights)).sum();
    let comment_count = comments.len() as u64;

    CommentEngagement {
        comment_count,
        total,
        average: total / comment_count as f64,
    }
}

impl EngagementMetrics {
    /// Attach aggregated comment engagement
    ///
    /// The stored comment counter may lag behind the fetched comments, so it is
    /// raised to the number of comments actually seen.
    pub fn with_comments(mut self, comments: &[CommentCounts], weights: &CommentWeights) -> Self {
        self.comment_engagement = aggregate_comment_engagement(comments, weights);
        self.comments = self.comments.max(self.comment_engagement.comment_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_comments_is_neutral() {
        let engagement = aggregate_comment_engagement(&[], &CommentWeights::default());

        assert_eq!(engagement, CommentEngagement::default());
        assert_eq!(engagement.total, 0.0);
    }

    #[test]
    fn test_aggregation_is_a_sum() {
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

        let engagement = aggregate_comment_engagement(&comments, &CommentWeights::default());

        // 2*1 + 1*2 = 4, 4*1 - 2*0.5 = 3
        assert_eq!(engagement.comment_count, 2);
        assert!((engagement.total - 7.0).abs() < 1e-9);
        assert!((engagement.average - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_heavily_disliked_comment_floors_at_zero() {
        let counts = CommentCounts {
            likes: 1,
            dislikes: 100,
            ..Default::default()
        };

        assert_eq!(comment_value(&counts, &CommentWeights::default()), 0.0);
    }

    #[test]
    fn test_with_comments_raises_stale_comment_counter() {
        let comments = vec![CommentCounts::default(); 3];
        let metrics = EngagementMetrics {
            comments: 1,
            ..Default::default()
        }
        .with_comments(&comments, &CommentWeights::default());

        assert_eq!(metrics.comments, 3);
        assert_eq!(metrics.comment_engagement.comment_count, 3);
    }
}
