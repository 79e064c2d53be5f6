//! Deterministic ranked feed
//!
//! Strict top-N over the de-duplicated union of all active pools, ordered by
//! composite score. Used for the "ranked" algorithm and as a reproducible
//! baseline next to the probability cloud.
//!
//! Ordering:
//! - score descending
//! - newer `created_at` first on ties
//! - post id as the final tie-break so output is stable

use std::collections::HashSet;
use tracing::debug;

use crate::models::RankedPost;
use crate::services::feed::{CandidatePool, FeedWeights, SampledFeed};

/// Rank the union of active pools
///
/// A post present in several pools is attributed to the first pool that
/// carries it, in the order the pools are given.
pub fn rank_pools(pools: Vec<CandidatePool>, limit: usize, weights: &FeedWeights) -> SampledFeed {
    let mut seen = HashSet::new();
    let mut candidates: Vec<RankedPost> = Vec::new();

    for pool in pools {
        if !weights.is_active(pool.source) {
            continue;
        }
        for mut post in pool.posts {
            if seen.insert(post.post_id) {
                post.source = pool.source;
                candidates.push(post);
            }
        }
    }

    sort_ranked(&mut candidates);
    candidates.truncate(limit);

    let mut feed = SampledFeed::default();
    for post in &candidates {
        *feed.sampled_per_pool.entry(post.source).or_default() += 1;
    }
    feed.posts = candidates;

    debug!("Ranked feed built with {} posts", feed.posts.len());

    feed
}

/// Sort posts by score (highest first), newer first on ties
pub fn sort_ranked(posts: &mut [RankedPost]) {
    posts.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.post_id.cmp(&b.post_id))
    });
}
