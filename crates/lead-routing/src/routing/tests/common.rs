use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::routing::context::{
    ChannelConsent, ConsentState, ListingFacts, PersonFacts, RoutingContext,
};
use crate::routing::dispatch::{AgentRoster, LeadDispatcher, RosterError};
use crate::routing::scoring::{AgentSnapshot, RoutingConfig, RoutingInput};
use crate::routing::targets::RoutingTarget;
use crate::routing::rules::RoutingRule;

pub(super) fn instant(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn austin_listing() -> ListingFacts {
    ListingFacts {
        price: Some(450_000.0),
        city: Some("Austin".to_string()),
        state: Some("TX".to_string()),
        postal_code: Some("78701".to_string()),
    }
}

pub(super) fn zillow_person() -> PersonFacts {
    PersonFacts {
        source: Some("Zillow".to_string()),
        buyer_rep_status: None,
        consent: ChannelConsent {
            sms: ConsentState::Granted,
            email: ConsentState::Unknown,
        },
    }
}

/// Wednesday 2025-01-15 15:00 UTC, 09:00 in Chicago.
pub(super) fn context() -> RoutingContext {
    RoutingContext::new(instant(2025, 1, 15, 15, 0))
        .with_tenant_timezone("America/Chicago")
        .with_person(zillow_person())
        .with_listing(austin_listing())
}

pub(super) fn agent(user_id: &str) -> AgentSnapshot {
    AgentSnapshot {
        user_id: user_id.to_string(),
        full_name: format!("Agent {user_id}"),
        capacity_target: 8,
        active_pipeline: 2,
        geography_fit: 0.9,
        price_band_fit: 0.8,
        kept_appt_rate: 0.7,
        consent_ready: true,
        ten_dlc_ready: true,
        team_id: None,
        round_robin_order: None,
        roles: Vec::new(),
    }
}

/// Scores 0.7775 under the default configuration.
pub(super) fn strong_agent(user_id: &str) -> AgentSnapshot {
    agent(user_id)
}

/// Scores roughly 0.324 under the default configuration.
pub(super) fn stretched_agent(user_id: &str) -> AgentSnapshot {
    AgentSnapshot {
        active_pipeline: 7,
        geography_fit: 0.5,
        price_band_fit: 0.4,
        kept_appt_rate: 0.4,
        ..agent(user_id)
    }
}

/// Agent whose score equals `kept_appt_rate` under [`performance_only_config`].
pub(super) fn rated_agent(user_id: &str, kept_appt_rate: f64) -> AgentSnapshot {
    AgentSnapshot {
        kept_appt_rate,
        ..agent(user_id)
    }
}

pub(super) fn performance_only_config() -> RoutingConfig {
    RoutingConfig {
        minimum_score: 0.6,
        performance_weight: 1.0,
        capacity_weight: 0.0,
        geography_weight: 0.0,
        price_band_weight: 0.0,
    }
}

pub(super) fn routing_input(agents: Vec<AgentSnapshot>) -> RoutingInput {
    RoutingInput {
        lead_id: "lead-100".to_string(),
        tenant_id: "tenant-austin".to_string(),
        agents,
        config: None,
        fallback_team_id: Some("team-holding".to_string()),
        quiet_hours: false,
    }
}

pub(super) fn rule(id: &str, priority: i32, targets: Vec<RoutingTarget>) -> RoutingRule {
    RoutingRule {
        id: id.to_string(),
        name: None,
        priority,
        enabled: true,
        conditions: None,
        targets,
        fallback: None,
    }
}

pub(super) fn team_target(id: &str) -> RoutingTarget {
    RoutingTarget::Team {
        id: id.to_string(),
        strategy: Default::default(),
        include_roles: Vec::new(),
    }
}

#[derive(Default)]
pub(super) struct MemoryRoster {
    teams: HashMap<String, Vec<AgentSnapshot>>,
    assignments: Mutex<HashMap<String, String>>,
}

impl MemoryRoster {
    pub(super) fn with_team(mut self, team_id: &str, agents: Vec<AgentSnapshot>) -> Self {
        self.teams.insert(team_id.to_string(), agents);
        self
    }

    pub(super) fn assignment(&self, team_id: &str) -> Option<String> {
        self.assignments
            .lock()
            .expect("assignment mutex poisoned")
            .get(team_id)
            .cloned()
    }
}

impl AgentRoster for MemoryRoster {
    fn team_roster(&self, team_id: &str) -> Result<Vec<AgentSnapshot>, RosterError> {
        self.teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| RosterError::UnknownTeam(team_id.to_string()))
    }

    fn advance_rotation(
        &self,
        team_id: &str,
        next: &dyn Fn(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>, RosterError> {
        let mut assignments = self.assignments.lock().expect("assignment mutex poisoned");
        let picked = next(assignments.get(team_id).map(String::as_str));
        if let Some(user_id) = &picked {
            assignments.insert(team_id.to_string(), user_id.clone());
        }
        Ok(picked)
    }
}

/// Fails the test if the dispatcher touches the roster.
pub(super) struct UntouchableRoster;

impl AgentRoster for UntouchableRoster {
    fn team_roster(&self, team_id: &str) -> Result<Vec<AgentSnapshot>, RosterError> {
        panic!("roster read for {team_id} before validation finished")
    }

    fn advance_rotation(
        &self,
        team_id: &str,
        _next: &dyn Fn(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>, RosterError> {
        panic!("rotation advanced for {team_id} before validation finished")
    }
}

pub(super) struct UnavailableRoster;

impl AgentRoster for UnavailableRoster {
    fn team_roster(&self, _team_id: &str) -> Result<Vec<AgentSnapshot>, RosterError> {
        Err(RosterError::Unavailable("roster replica offline".to_string()))
    }

    fn advance_rotation(
        &self,
        _team_id: &str,
        _next: &dyn Fn(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>, RosterError> {
        Err(RosterError::Unavailable("roster replica offline".to_string()))
    }
}

pub(super) fn north_team_roster() -> MemoryRoster {
    let mut outsider = strong_agent("olga");
    outsider.team_id = Some("team-south".to_string());
    outsider.kept_appt_rate = 1.0;

    let mut stretched = stretched_agent("bert");
    stretched.team_id = Some("team-north".to_string());

    MemoryRoster::default().with_team(
        "team-north",
        vec![strong_agent("alma"), stretched, outsider],
    )
}

pub(super) fn dispatcher<R: AgentRoster + 'static>(roster: R) -> Arc<LeadDispatcher<R>> {
    Arc::new(LeadDispatcher::new(Arc::new(roster), RoutingConfig::default()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
