use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::error::{require_text, SchemaValidationError};
use super::{AgentScore, AgentScorer, AgentSnapshot, RoutingConfig};

/// Width of the band below the best score inside which agents are still selected.
pub const SELECTION_TOLERANCE: f64 = 0.05;

/// Payload for a best-fit routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingInput {
    pub lead_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub agents: Vec<AgentSnapshot>,
    /// Absent means [`RoutingConfig::default`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RoutingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_team_id: Option<String>,
    #[serde(default)]
    pub quiet_hours: bool,
}

impl RoutingInput {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SchemaValidationError> {
        Self::deserialize(value)
            .map_err(|err| SchemaValidationError::malformed("routing input", err))
    }

    pub fn validate(&self) -> Result<RoutingConfig, SchemaValidationError> {
        require_text("lead_id", &self.lead_id)?;
        require_text("tenant_id", &self.tenant_id)?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

/// Outcome of one routing decision. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub lead_id: String,
    pub tenant_id: String,
    pub selected_agents: Vec<AgentScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_team_id: Option<String>,
    pub used_fallback: bool,
    pub quiet_hours: bool,
}

/// Score every agent, drop ineligible ones, and sort by descending score.
///
/// The sort is stable: agents with equal scores keep their input order.
pub fn rank_agents(scorer: &AgentScorer, agents: &[AgentSnapshot]) -> Vec<AgentScore> {
    let mut scored: Vec<AgentScore> = agents
        .iter()
        .filter_map(|agent| scorer.score(agent))
        .collect();
    scored.sort_by(|left, right| right.score.total_cmp(&left.score));
    scored
}

/// Pick the agents within [`SELECTION_TOLERANCE`] of the best score that also clear the
/// configured minimum, falling back to the holding team when none do.
pub fn route_lead(input: &RoutingInput) -> Result<RoutingResult, SchemaValidationError> {
    let config = input.validate()?;
    let scorer = AgentScorer::new(config)?;

    let scored = rank_agents(&scorer, &input.agents);
    let best_score = scored.first().map(|agent| agent.score).unwrap_or(0.0);

    let band: Vec<AgentScore> = scored
        .iter()
        .filter(|agent| {
            agent.score >= config.minimum_score && agent.score >= best_score - SELECTION_TOLERANCE
        })
        .cloned()
        .collect();

    debug!(
        lead_id = %input.lead_id,
        candidates = input.agents.len(),
        eligible = scored.len(),
        selected = band.len(),
        best_score,
        "ranked agents for lead"
    );

    let result = if band.is_empty() {
        RoutingResult {
            lead_id: input.lead_id.clone(),
            tenant_id: input.tenant_id.clone(),
            selected_agents: scored.into_iter().take(1).collect(),
            fallback_team_id: input.fallback_team_id.clone(),
            used_fallback: true,
            quiet_hours: input.quiet_hours,
        }
    } else {
        RoutingResult {
            lead_id: input.lead_id.clone(),
            tenant_id: input.tenant_id.clone(),
            selected_agents: band,
            fallback_team_id: None,
            used_fallback: false,
            quiet_hours: input.quiet_hours,
        }
    };

    Ok(result)
}
