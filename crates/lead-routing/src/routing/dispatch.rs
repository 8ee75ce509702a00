use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::conditions::{quiet_hours, ConditionCheck, TimeWindow};
use super::context::RoutingContext;
use super::error::{require_text, SchemaValidationError};
use super::rules::{match_rules, RoutingRule};
use super::scoring::{
    next_round_robin, route_lead, AgentSnapshot, RoutingConfig, RoutingInput, RoutingResult,
};
use super::targets::{RoutingTarget, TeamStrategy};

/// Roster store the dispatcher reads team membership and rotation state from.
pub trait AgentRoster: Send + Sync {
    fn team_roster(&self, team_id: &str) -> Result<Vec<AgentSnapshot>, RosterError>;

    /// Reads the team's last assignee, asks `next` for the successor and records it, all as
    /// one step: concurrent callers never observe the same last assignee. Nothing is
    /// recorded when `next` returns `None`.
    fn advance_rotation(
        &self,
        team_id: &str,
        next: &dyn Fn(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>, RosterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("team '{0}' has no roster")]
    UnknownTeam(String),
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// A lead plus the rule book it should be routed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchRequest {
    pub lead_id: String,
    pub tenant_id: String,
    pub context: RoutingContext,
    #[serde(default)]
    pub rules: Vec<RoutingRule>,
    /// Overrides the dispatcher's default scoring configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RoutingConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quiet_hours: Vec<TimeWindow>,
    /// Used when no rule matches or the matched rule names no fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fallback_team_id: Option<String>,
}

impl DispatchRequest {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SchemaValidationError> {
        Self::deserialize(value)
            .map_err(|err| SchemaValidationError::malformed("dispatch request", err))
    }
}

/// Who ended up owning the lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    Agent {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Team {
        team_id: String,
        result: RoutingResult,
    },
    RoundRobin {
        team_id: String,
        user_id: String,
        full_name: String,
    },
    Pond {
        pond_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Fallback {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team_id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        escalation_channels: Vec<String>,
    },
    Unmatched {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_team_id: Option<String>,
    },
}

impl Assignment {
    pub const fn label(&self) -> &'static str {
        match self {
            Assignment::Agent { .. } => "agent",
            Assignment::Team { .. } => "team",
            Assignment::RoundRobin { .. } => "round_robin",
            Assignment::Pond { .. } => "pond",
            Assignment::Fallback { .. } => "fallback",
            Assignment::Unmatched { .. } => "unmatched",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub lead_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub checks: Vec<ConditionCheck>,
    pub quiet_hours: bool,
    pub assignment: Assignment,
}

/// Service composing rule matching, quiet hours, and agent selection over a roster.
pub struct LeadDispatcher<R> {
    roster: Arc<R>,
    defaults: RoutingConfig,
}

impl<R> LeadDispatcher<R>
where
    R: AgentRoster + 'static,
{
    pub fn new(roster: Arc<R>, defaults: RoutingConfig) -> Self {
        Self { roster, defaults }
    }

    pub fn defaults(&self) -> &RoutingConfig {
        &self.defaults
    }

    pub fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        require_text("lead_id", &request.lead_id)?;
        require_text("tenant_id", &request.tenant_id)?;
        let config = request.config.unwrap_or(self.defaults);
        config.validate()?;
        let quiet = quiet_hours(&request.quiet_hours, request.context.now)?;

        let Some(rule_match) = match_rules(&request.rules, &request.context)? else {
            warn!(lead_id = %request.lead_id, "no routing rule matched lead");
            return Ok(DispatchOutcome {
                lead_id: request.lead_id,
                tenant_id: request.tenant_id,
                rule_id: None,
                checks: Vec::new(),
                quiet_hours: quiet,
                assignment: Assignment::Unmatched {
                    fallback_team_id: request.default_fallback_team_id,
                },
            });
        };

        let fallback_team_id = rule_match
            .fallback
            .as_ref()
            .map(|fallback| fallback.team_id.clone())
            .or_else(|| request.default_fallback_team_id.clone());

        let mut exhausted_team: Option<(String, RoutingResult)> = None;
        let mut assignment = None;

        for target in &rule_match.targets {
            match target {
                RoutingTarget::Agent { id, label } => {
                    assignment = Some(Assignment::Agent {
                        user_id: id.clone(),
                        label: label.clone(),
                    });
                }
                RoutingTarget::Pond { id, label } => {
                    assignment = Some(Assignment::Pond {
                        pond_id: id.clone(),
                        label: label.clone(),
                    });
                }
                RoutingTarget::Team {
                    id,
                    strategy: TeamStrategy::BestFit,
                    include_roles,
                } => {
                    let input = RoutingInput {
                        lead_id: request.lead_id.clone(),
                        tenant_id: request.tenant_id.clone(),
                        agents: self.team_members(id, include_roles)?,
                        config: Some(config),
                        fallback_team_id: fallback_team_id.clone(),
                        quiet_hours: quiet,
                    };
                    let result = route_lead(&input)?;
                    if result.used_fallback {
                        warn!(
                            lead_id = %request.lead_id,
                            team_id = %id,
                            "no agent cleared the selection band"
                        );
                        exhausted_team = Some((id.clone(), result));
                    } else {
                        assignment = Some(Assignment::Team {
                            team_id: id.clone(),
                            result,
                        });
                    }
                }
                RoutingTarget::Team {
                    id,
                    strategy: TeamStrategy::RoundRobin,
                    include_roles,
                } => {
                    let members = self.team_members(id, include_roles)?;
                    let picked = self.roster.advance_rotation(id, &|last| {
                        next_round_robin(&members, last).map(|agent| agent.user_id.clone())
                    })?;
                    let agent = picked
                        .and_then(|user_id| members.iter().find(|agent| agent.user_id == user_id));
                    if let Some(agent) = agent {
                        assignment = Some(Assignment::RoundRobin {
                            team_id: id.clone(),
                            user_id: agent.user_id.clone(),
                            full_name: agent.full_name.clone(),
                        });
                    } else {
                        warn!(
                            lead_id = %request.lead_id,
                            team_id = %id,
                            "round robin found no eligible agent"
                        );
                    }
                }
            }

            if assignment.is_some() {
                break;
            }
        }

        let assignment = match (assignment, exhausted_team) {
            (Some(assignment), _) => assignment,
            (None, Some((team_id, result))) => Assignment::Team { team_id, result },
            (None, None) => Assignment::Fallback {
                team_id: fallback_team_id,
                escalation_channels: rule_match
                    .fallback
                    .as_ref()
                    .map(|fallback| fallback.escalation_channels.clone())
                    .unwrap_or_default(),
            },
        };

        info!(
            lead_id = %request.lead_id,
            rule_id = %rule_match.rule_id,
            assignment = assignment.label(),
            quiet_hours = quiet,
            "dispatched lead"
        );

        Ok(DispatchOutcome {
            lead_id: request.lead_id,
            tenant_id: request.tenant_id,
            rule_id: Some(rule_match.rule_id),
            checks: rule_match.checks,
            quiet_hours: quiet,
            assignment,
        })
    }

    /// Roster members of `team_id`; agents without a team assignment are kept. A non-empty
    /// `include_roles` keeps only agents holding one of those roles.
    fn team_members(
        &self,
        team_id: &str,
        include_roles: &[String],
    ) -> Result<Vec<AgentSnapshot>, RosterError> {
        let roster = self.roster.team_roster(team_id)?;
        Ok(roster
            .into_iter()
            .filter(|agent| agent.team_id.as_deref().map_or(true, |team| team == team_id))
            .filter(|agent| include_roles.is_empty() || agent.has_any_role(include_roles))
            .collect())
    }
}
