use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::decay::{age_hours, TimeDecay};
use super::reputation::ReputationWeighting;
use crate::config::ScoringConfig;
use crate::models::{EngagementMetrics, ScoreBreakdown, ScoreResult};
use crate::services::engagement::CommentWeights;

/// Weight applied to each log-normalized metric; negative weights subtract
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricWeights {
    pub likes: f64,
    pub agrees: f64,
    pub disagrees: f64,
    pub comments: f64,
    pub shares: f64,
    pub views: f64,
    pub community_notes: f64,
    pub comment_engagement: f64,
    pub dislikes: f64,
    pub reports: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        let config = ScoringConfig::default();
        Self::from_config(&config)
    }
}

impl MetricWeights {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            likes: config.weight_likes,
            agrees: config.weight_agrees,
            disagrees: config.weight_disagrees,
            comments: config.weight_comments,
            shares: config.weight_shares,
            views: config.weight_views,
            community_notes: config.weight_community_notes,
            comment_engagement: config.weight_comment_engagement,
            dislikes: config.weight_dislikes,
            reports: config.weight_reports,
        }
    }
}

/// Combines engagement, time decay and author reputation into one score
#[derive(Debug, Clone, Default)]
pub struct EngagementScorer {
    weights: MetricWeights,
    comment_weights: CommentWeights,
    decay: TimeDecay,
    reputation: ReputationWeighting,
}

impl EngagementScorer {
    pub fn new(weights: MetricWeights, decay: TimeDecay, reputation: ReputationWeighting) -> Self {
        Self {
            weights,
            comment_weights: CommentWeights::default(),
            decay,
            reputation,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(
            MetricWeights::from_config(config),
            TimeDecay::new(config.half_life_hours, config.decay_floor),
            ReputationWeighting::new(
                config.neutral_reputation,
                config.reputation_sensitivity,
                config.min_reputation_multiplier,
                config.max_reputation_multiplier,
            ),
        )
    }

    pub fn comment_weights(&self) -> &CommentWeights {
        &self.comment_weights
    }

    pub fn decay(&self) -> &TimeDecay {
        &self.decay
    }

    pub fn reputation(&self) -> &ReputationWeighting {
        &self.reputation
    }

    pub fn calculate_score(
        &self,
        metrics: &EngagementMetrics,
        created_at: DateTime<Utc>,
        author_reputation: Option<f64>,
    ) -> ScoreResult {
        self.calculate_score_at(metrics, created_at, author_reputation, Utc::now())
    }

    /// Score relative to an explicit `now`
    pub fn calculate_score_at(
        &self,
        metrics: &EngagementMetrics,
        created_at: DateTime<Utc>,
        author_reputation: Option<f64>,
        now: DateTime<Utc>,
    ) -> ScoreResult {
        let w = &self.weights;
        let inputs = [
            ("likes", w.likes, metrics.likes as f64),
            ("agrees", w.agrees, metrics.agrees as f64),
            ("disagrees", w.disagrees, metrics.disagrees as f64),
            ("comments", w.comments, metrics.comments as f64),
            ("shares", w.shares, metrics.shares as f64),
            ("views", w.views, metrics.views as f64),
            ("communityNotes", w.community_notes, metrics.community_notes as f64),
            (
                "commentEngagement",
                w.comment_engagement,
                metrics.comment_engagement.total,
            ),
            ("dislikes", w.dislikes, metrics.dislikes as f64),
            ("reports", w.reports, metrics.reports as f64),
        ];

        let mut terms = BTreeMap::new();
        let mut raw_engagement = 0.0;
        for (name, weight, value) in inputs {
            let term = weighted_term(weight, value);
            raw_engagement += term;
            terms.insert(name.to_string(), term);
        }
        let raw_engagement = non_negative(raw_engagement);

        let age_hours = age_hours(created_at, now);
        let decay_factor = self.decay.factor(age_hours);
        let reputation_multiplier = self.reputation.multiplier(author_reputation);

        ScoreResult {
            score: non_negative(raw_engagement * decay_factor * reputation_multiplier),
            breakdown: ScoreBreakdown {
                terms,
                raw_engagement,
                decay_factor,
                reputation_multiplier,
                age_hours,
            },
        }
    }
}

/// `weight * ln(1 + value)`; log scaling keeps viral counters from dominating
fn weighted_term(weight: f64, value: f64) -> f64 {
    if !weight.is_finite() || !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    weight * value.ln_1p()
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
