//! Agent scoring and best-fit selection.

mod config;
mod round_robin;
mod selector;

pub use config::{
    RoutingConfig, DEFAULT_CAPACITY_WEIGHT, DEFAULT_GEOGRAPHY_WEIGHT, DEFAULT_MINIMUM_SCORE,
    DEFAULT_PERFORMANCE_WEIGHT, DEFAULT_PRICE_BAND_WEIGHT,
};
pub use round_robin::next_round_robin;
pub use selector::{rank_agents, route_lead, RoutingInput, RoutingResult, SELECTION_TOLERANCE};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SchemaValidationError;

/// Scorer input for one candidate agent.
///
/// The fit and performance fields are precomputed by the caller in `[0, 1]`; the scorer
/// clamps them anyway. `consent_ready` and `ten_dlc_ready` are hard gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub user_id: String,
    pub full_name: String,
    pub capacity_target: u32,
    pub active_pipeline: u32,
    pub geography_fit: f64,
    pub price_band_fit: f64,
    pub kept_appt_rate: f64,
    pub consent_ready: bool,
    pub ten_dlc_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_robin_order: Option<u32>,
    /// Team roles such as `ISA` or `SHOWING`; matched by `include_roles` on team targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl AgentSnapshot {
    /// Regulatory messaging eligibility. No fit signal overrides a closed gate.
    pub fn is_eligible(&self) -> bool {
        self.consent_ready && self.ten_dlc_ready
    }

    /// Case-insensitive match against any of `wanted`.
    pub fn has_any_role(&self, wanted: &[String]) -> bool {
        self.roles.iter().any(|role| {
            wanted
                .iter()
                .any(|candidate| candidate.trim().eq_ignore_ascii_case(role.trim()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonType {
    Capacity,
    Performance,
    Geography,
    PriceBand,
}

/// One weighted factor behind an agent's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReason {
    #[serde(rename = "type")]
    pub kind: ReasonType,
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    pub user_id: String,
    pub full_name: String,
    pub score: f64,
    /// Always capacity, performance, geography, price band, in that order.
    pub reasons: Vec<ScoreReason>,
}

/// The four clamped factors feeding the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFactors {
    pub capacity: f64,
    pub performance: f64,
    pub geography: f64,
    pub price_band: f64,
}

impl ScoreFactors {
    pub fn from_agent(agent: &AgentSnapshot) -> Self {
        let capacity = if agent.capacity_target == 0 {
            0.0
        } else {
            let remaining = agent.capacity_target.saturating_sub(agent.active_pipeline);
            clamp01(f64::from(remaining) / f64::from(agent.capacity_target))
        };

        Self {
            capacity,
            performance: clamp01(agent.kept_appt_rate),
            geography: clamp01(agent.geography_fit),
            price_band: clamp01(agent.price_band_fit),
        }
    }
}

/// Scores agents under one validated configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentScorer {
    config: RoutingConfig,
}

impl AgentScorer {
    pub fn new(config: RoutingConfig) -> Result<Self, SchemaValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// `None` when the agent fails a hard gate.
    pub fn score(&self, agent: &AgentSnapshot) -> Option<AgentScore> {
        if !agent.is_eligible() {
            debug!(
                user_id = %agent.user_id,
                consent_ready = agent.consent_ready,
                ten_dlc_ready = agent.ten_dlc_ready,
                "agent excluded by messaging gate"
            );
            return None;
        }

        let factors = ScoreFactors::from_agent(agent);
        let config = &self.config;
        let raw = factors.capacity * config.capacity_weight
            + factors.performance * config.performance_weight
            + factors.geography * config.geography_weight
            + factors.price_band * config.price_band_weight;

        let reasons = vec![
            ScoreReason {
                kind: ReasonType::Capacity,
                description: format!("Capacity remaining {}%", percent(factors.capacity)),
                weight: config.capacity_weight,
            },
            ScoreReason {
                kind: ReasonType::Performance,
                description: format!("Kept appointment rate {}%", percent(factors.performance)),
                weight: config.performance_weight,
            },
            ScoreReason {
                kind: ReasonType::Geography,
                description: format!("Geography fit {}%", percent(factors.geography)),
                weight: config.geography_weight,
            },
            ScoreReason {
                kind: ReasonType::PriceBand,
                description: format!("Price band fit {}%", percent(factors.price_band)),
                weight: config.price_band_weight,
            },
        ];

        Some(AgentScore {
            user_id: agent.user_id.clone(),
            full_name: agent.full_name.clone(),
            score: round_score(raw),
            reasons,
        })
    }
}

/// Validate `config`, then score one agent.
pub fn score_agent(
    agent: &AgentSnapshot,
    config: &RoutingConfig,
) -> Result<Option<AgentScore>, SchemaValidationError> {
    Ok(AgentScorer::new(*config)?.score(agent))
}

/// NaN counts as zero.
fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Four decimal places, half-up (scores are never negative).
fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn percent(factor: f64) -> u32 {
    (factor * 100.0).round() as u32
}
