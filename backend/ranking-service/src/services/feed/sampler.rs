use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use super::weights::FeedWeights;
use crate::models::{PoolSource, RankedPost};

/// Scored candidates from one source
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub source: PoolSource,
    pub posts: Vec<RankedPost>,
}

impl CandidatePool {
    pub fn new(source: PoolSource, posts: Vec<RankedPost>) -> Self {
        Self { source, posts }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampledFeed {
    pub posts: Vec<RankedPost>,
    pub sampled_per_pool: HashMap<PoolSource, usize>,
}

/// Probability-cloud sampler
///
/// Each draw picks a pool with probability proportional to its weight, then a
/// post inside that pool with probability proportional to `score + smoothing`.
/// Better posts are more likely, never guaranteed. Drawn posts are removed, so
/// the loop ends after at most `Σ pool sizes` draws.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityCloudSampler {
    smoothing: f64,
}

impl ProbabilityCloudSampler {
    pub const DEFAULT_SMOOTHING: f64 = 0.1;

    pub fn new(smoothing: f64) -> Self {
        let smoothing = if smoothing.is_finite() && smoothing > 0.0 {
            smoothing
        } else {
            Self::DEFAULT_SMOOTHING
        };
        Self { smoothing }
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        pools: Vec<CandidatePool>,
        limit: usize,
        weights: &FeedWeights,
        rng: &mut R,
    ) -> SampledFeed {
        let mut feed = SampledFeed::default();
        if limit == 0 {
            return feed;
        }

        // Zero-weight pools are dropped here so they can never contribute
        let mut active: Vec<(CandidatePool, f64)> = pools
            .into_iter()
            .filter(|pool| weights.is_active(pool.source) && !pool.posts.is_empty())
            .map(|pool| {
                let weight = weights.weight_for(pool.source);
                (pool, weight)
            })
            .collect();

        let mut seen: HashSet<Uuid> = HashSet::new();

        while feed.posts.len() < limit {
            active.retain(|(pool, _)| !pool.posts.is_empty());
            if active.is_empty() {
                break;
            }

            let pool_idx = pick_index(active.iter().map(|(_, w)| *w), active.len(), rng);
            let (pool, _) = &mut active[pool_idx];

            let post_idx = pick_index(
                pool.posts.iter().map(|p| self.item_weight(p.score)),
                pool.posts.len(),
                rng,
            );
            let mut post = pool.posts.swap_remove(post_idx);

            // Same post reached through another pool
            if !seen.insert(post.post_id) {
                continue;
            }

            post.source = pool.source;
            *feed.sampled_per_pool.entry(pool.source).or_default() += 1;
            feed.posts.push(post);
        }

        debug!(
            requested = limit,
            sampled = feed.posts.len(),
            "Probability cloud sampling complete"
        );

        feed
    }

    fn item_weight(&self, score: f64) -> f64 {
        if score.is_finite() && score > 0.0 {
            score + self.smoothing
        } else {
            self.smoothing
        }
    }
}

impl Default for ProbabilityCloudSampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SMOOTHING)
    }
}

/// Draw from the cumulative distribution of `weights`, falling back to a
/// uniform draw when the weights cannot form one (e.g. their sum overflows)
fn pick_index<I, R>(weights: I, len: usize, rng: &mut R) -> usize
where
    I: IntoIterator<Item = f64>,
    R: Rng + ?Sized,
{
    match WeightedIndex::new(weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..len),
    }
}
