/// Trending comment selector
///
/// Deterministic top-N over a post's comments: window filter, score,
/// threshold, sort (score desc, newer first on ties), truncate.
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{
    CandidateComment, EngagementMetrics, ScoredComment, TrendingQuery, TrendingResult,
    TrendingStats,
};
use crate::services::scoring::EngagementScorer;

pub fn find_trending_comments(
    scorer: &EngagementScorer,
    comments: &[CandidateComment],
    query: &TrendingQuery,
    now: DateTime<Utc>,
) -> TrendingResult {
    let query = query.clamped();
    let window_start = now - Duration::hours(query.time_window_hours);

    let within_window: Vec<&CandidateComment> = comments
        .iter()
        .filter(|c| c.created_at >= window_start)
        .collect();

    let mut surviving: Vec<ScoredComment> = within_window
        .iter()
        .map(|c| {
            let metrics = EngagementMetrics::from(c.counts);
            let result = scorer.calculate_score_at(&metrics, c.created_at, c.author_reputation, now);
            ScoredComment {
                comment_id: c.id,
                post_id: c.post_id,
                author_id: c.author_id,
                created_at: c.created_at,
                score: result.score,
                breakdown: result.breakdown,
            }
        })
        .filter(|c| c.score >= query.min_score)
        .collect();

    let above_threshold = surviving.len();

    surviving.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.comment_id.cmp(&b.comment_id))
    });
    surviving.truncate(query.limit);

    let stats = summarize(
        comments.len(),
        within_window.len(),
        above_threshold,
        &surviving,
        &query,
    );

    debug!(
        total_considered = stats.total_considered,
        within_window = stats.within_window,
        above_threshold = stats.above_threshold,
        returned = stats.returned,
        "Trending comments selected"
    );

    TrendingResult {
        trending_comments: surviving,
        stats,
    }
}

fn summarize(
    total_considered: usize,
    within_window: usize,
    above_threshold: usize,
    returned: &[ScoredComment],
    query: &TrendingQuery,
) -> TrendingStats {
    let mut stats = TrendingStats {
        total_considered,
        within_window,
        above_threshold,
        returned: returned.len(),
        time_window_hours: query.time_window_hours,
        min_score_threshold: query.min_score,
        ..Default::default()
    };

    if returned.is_empty() {
        return stats;
    }

    stats.min_score = returned.iter().map(|c| c.score).fold(f64::INFINITY, f64::min);
    stats.max_score = returned.iter().map(|c| c.score).fold(0.0, f64::max);
    stats.average_score = returned.iter().map(|c| c.score).sum::<f64>() / returned.len() as f64;
    stats
}
