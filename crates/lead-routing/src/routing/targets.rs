use serde::{Deserialize, Serialize};

/// How a team target chooses an individual agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStrategy {
    #[default]
    BestFit,
    RoundRobin,
}

/// Where a matched rule sends the lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingTarget {
    Agent {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Team {
        id: String,
        #[serde(default)]
        strategy: TeamStrategy,
        /// When non-empty, only members holding one of these roles are considered.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        include_roles: Vec<String>,
    },
    Pond {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl RoutingTarget {
    pub fn id(&self) -> &str {
        match self {
            RoutingTarget::Agent { id, .. }
            | RoutingTarget::Team { id, .. }
            | RoutingTarget::Pond { id, .. } => id,
        }
    }

    pub const fn kind_label(&self) -> &'static str {
        match self {
            RoutingTarget::Agent { .. } => "agent",
            RoutingTarget::Team { .. } => "team",
            RoutingTarget::Pond { .. } => "pond",
        }
    }
}

/// Holding team that absorbs a lead no agent qualified for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingFallback {
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalation_channels: Vec<String>,
}
