use serde::{Deserialize, Serialize};

use crate::models::PoolSource;

/// Probability mass given to each candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedWeights {
    pub following: f64,
    pub topical: f64,
    pub popular: f64,
    pub recent: f64,
}

impl Default for FeedWeights {
    fn default() -> Self {
        Self {
            following: 0.4,
            topical: 0.25,
            popular: 0.2,
            recent: 0.15,
        }
    }
}

/// Per-request weight overrides (A/B experiments)
///
/// Accepts both pool names and the affinity/topic/engagement/recency aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedWeightsOverride {
    #[serde(default, alias = "affinity")]
    pub following: Option<f64>,
    #[serde(default, alias = "topic")]
    pub topical: Option<f64>,
    #[serde(default, alias = "engagement")]
    pub popular: Option<f64>,
    #[serde(default, alias = "recency")]
    pub recent: Option<f64>,
}

impl FeedWeightsOverride {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl FeedWeights {
    pub fn weight_for(&self, source: PoolSource) -> f64 {
        match source {
            PoolSource::Following => self.following,
            PoolSource::Topical => self.topical,
            PoolSource::Popular => self.popular,
            PoolSource::Recent => self.recent,
        }
    }

    /// Whether a pool takes part in sampling at all
    pub fn is_active(&self, source: PoolSource) -> bool {
        let weight = self.weight_for(source);
        weight.is_finite() && weight > 0.0
    }

    /// Field-by-field merge: unset, negative or non-finite overrides keep `self`
    pub fn merge(&self, overrides: &FeedWeightsOverride) -> FeedWeights {
        FeedWeights {
            following: pick(self.following, overrides.following),
            topical: pick(self.topical, overrides.topical),
            popular: pick(self.popular, overrides.popular),
            recent: pick(self.recent, overrides.recent),
        }
    }
}

fn pick(default: f64, candidate: Option<f64>) -> f64 {
    match candidate {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        _ => default,
    }
}
