use serde::{Deserialize, Serialize};

use super::super::error::SchemaValidationError;

pub const DEFAULT_MINIMUM_SCORE: f64 = 0.6;
pub const DEFAULT_PERFORMANCE_WEIGHT: f64 = 0.25;
pub const DEFAULT_CAPACITY_WEIGHT: f64 = 0.35;
pub const DEFAULT_GEOGRAPHY_WEIGHT: f64 = 0.2;
pub const DEFAULT_PRICE_BAND_WEIGHT: f64 = 0.2;

/// Weights and threshold for agent scoring.
///
/// Weights are not normalised. When they do not sum to 1 the score scale, and therefore
/// `minimum_score`, is specific to this configuration; keeping the budget sane is the
/// caller's job. Missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    pub minimum_score: f64,
    pub performance_weight: f64,
    pub capacity_weight: f64,
    pub geography_weight: f64,
    pub price_band_weight: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            minimum_score: DEFAULT_MINIMUM_SCORE,
            performance_weight: DEFAULT_PERFORMANCE_WEIGHT,
            capacity_weight: DEFAULT_CAPACITY_WEIGHT,
            geography_weight: DEFAULT_GEOGRAPHY_WEIGHT,
            price_band_weight: DEFAULT_PRICE_BAND_WEIGHT,
        }
    }
}

impl RoutingConfig {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SchemaValidationError> {
        let config = Self::deserialize(value)
            .map_err(|err| SchemaValidationError::malformed("routing config", err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SchemaValidationError> {
        let weights = [
            ("minimum_score", self.minimum_score),
            ("performance_weight", self.performance_weight),
            ("capacity_weight", self.capacity_weight),
            ("geography_weight", self.geography_weight),
            ("price_band_weight", self.price_band_weight),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(SchemaValidationError::InvalidWeight { field, value });
            }
        }
        if self.minimum_score > 1.0 {
            return Err(SchemaValidationError::MinimumScoreOutOfRange(
                self.minimum_score,
            ));
        }
        Ok(())
    }

    /// Highest score reachable under this configuration.
    pub fn weight_budget(&self) -> f64 {
        self.performance_weight
            + self.capacity_weight
            + self.geography_weight
            + self.price_band_weight
    }
}
