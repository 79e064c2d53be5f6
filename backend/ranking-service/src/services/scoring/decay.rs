use chrono::{DateTime, Utc};

/// Exponential time decay with a non-zero floor
///
/// `factor(age) = floor + (1 - floor) * 0.5^(age / half_life)`, so a post
/// loses half of its decayable weight every `half_life_hours` but never drops
/// below `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDecay {
    half_life_hours: f64,
    floor: f64,
}

impl TimeDecay {
    pub const DEFAULT_HALF_LIFE_HOURS: f64 = 24.0;
    pub const DEFAULT_FLOOR: f64 = 0.05;
    const MIN_HALF_LIFE_HOURS: f64 = 1.0;

    pub fn new(half_life_hours: f64, floor: f64) -> Self {
        let half_life_hours = if half_life_hours.is_finite() {
            half_life_hours.max(Self::MIN_HALF_LIFE_HOURS)
        } else {
            Self::DEFAULT_HALF_LIFE_HOURS
        };

        let floor = if floor.is_finite() && floor > 0.0 && floor < 1.0 {
            floor
        } else {
            Self::DEFAULT_FLOOR
        };

        Self {
            half_life_hours,
            floor,
        }
    }

    pub fn half_life_hours(&self) -> f64 {
        self.half_life_hours
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Decay multiplier in `(floor, 1]`
    pub fn factor(&self, age_hours: f64) -> f64 {
        // Future timestamps and NaN count as brand new
        if age_hours.is_nan() || age_hours <= 0.0 {
            return 1.0;
        }

        self.floor + (1.0 - self.floor) * 0.5_f64.powf(age_hours / self.half_life_hours)
    }

    pub fn factor_at(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        self.factor(age_hours(created_at, now))
    }
}

impl Default for TimeDecay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HALF_LIFE_HOURS, Self::DEFAULT_FLOOR)
    }
}

/// Content age in fractional hours, zero for timestamps in the future
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds();
    (millis as f64 / 3_600_000.0).max(0.0)
}
