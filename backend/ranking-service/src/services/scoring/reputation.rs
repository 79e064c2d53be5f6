/// Author reputation weighting
///
/// Linear around the neutral reputation, clamped so that reputation adjusts a
/// score but never dominates raw engagement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationWeighting {
    neutral: f64,
    sensitivity: f64,
    min_multiplier: f64,
    max_multiplier: f64,
}

impl ReputationWeighting {
    pub const DEFAULT_NEUTRAL: f64 = 70.0;
    pub const DEFAULT_SENSITIVITY: f64 = 1.0 / 60.0;
    pub const DEFAULT_MIN_MULTIPLIER: f64 = 0.5;
    pub const DEFAULT_MAX_MULTIPLIER: f64 = 1.5;

    pub fn new(neutral: f64, sensitivity: f64, min_multiplier: f64, max_multiplier: f64) -> Self {
        let neutral = finite_or(neutral, Self::DEFAULT_NEUTRAL);
        let sensitivity = if sensitivity.is_finite() && sensitivity >= 0.0 {
            sensitivity
        } else {
            Self::DEFAULT_SENSITIVITY
        };

        let mut min_multiplier = finite_or(min_multiplier, Self::DEFAULT_MIN_MULTIPLIER);
        let mut max_multiplier = finite_or(max_multiplier, Self::DEFAULT_MAX_MULTIPLIER);
        if min_multiplier > max_multiplier {
            std::mem::swap(&mut min_multiplier, &mut max_multiplier);
        }
        // Scores must stay non-negative
        let min_multiplier = min_multiplier.max(0.0);
        let max_multiplier = max_multiplier.max(min_multiplier);

        Self {
            neutral,
            sensitivity,
            min_multiplier,
            max_multiplier,
        }
    }

    pub fn neutral(&self) -> f64 {
        self.neutral
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_multiplier, self.max_multiplier)
    }

    /// Multiplier for an author; unknown reputation is treated as neutral
    pub fn multiplier(&self, reputation: Option<f64>) -> f64 {
        let reputation = reputation
            .filter(|r| r.is_finite())
            .unwrap_or(self.neutral);

        let multiplier = 1.0 + (reputation - self.neutral) * self.sensitivity;
        if multiplier.is_finite() {
            multiplier.clamp(self.min_multiplier, self.max_multiplier)
        } else {
            1.0_f64.clamp(self.min_multiplier, self.max_multiplier)
        }
    }
}

impl Default for ReputationWeighting {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_NEUTRAL,
            Self::DEFAULT_SENSITIVITY,
            Self::DEFAULT_MIN_MULTIPLIER,
            Self::DEFAULT_MAX_MULTIPLIER,
        )
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
