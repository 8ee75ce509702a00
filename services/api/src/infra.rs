use lead_routing::error::AppError;
use lead_routing::routing::{AgentRoster, AgentSnapshot, RosterError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Roster held in memory; stands in for the CRM roster store.
#[derive(Clone)]
pub(crate) struct InMemoryRoster {
    teams: Arc<Mutex<HashMap<String, Vec<AgentSnapshot>>>>,
    rotation: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRoster {
    pub(crate) fn new(teams: HashMap<String, Vec<AgentSnapshot>>) -> Self {
        Self {
            teams: Arc::new(Mutex::new(teams)),
            rotation: Arc::default(),
        }
    }

    pub(crate) fn sample() -> Self {
        let mut teams = HashMap::new();
        teams.insert(
            "team-metro".to_string(),
            vec![sample_agent_a(), sample_agent_b()],
        );
        teams.insert("team-isa".to_string(), vec![sample_agent_isa()]);
        Self::new(teams)
    }
}

impl AgentRoster for InMemoryRoster {
    fn team_roster(&self, team_id: &str) -> Result<Vec<AgentSnapshot>, RosterError> {
        let guard = self.teams.lock().map_err(poisoned)?;
        guard
            .get(team_id)
            .cloned()
            .ok_or_else(|| RosterError::UnknownTeam(team_id.to_string()))
    }

    fn advance_rotation(
        &self,
        team_id: &str,
        next: &dyn Fn(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>, RosterError> {
        let mut guard = self.rotation.lock().map_err(poisoned)?;
        let picked = next(guard.get(team_id).map(String::as_str));
        if let Some(user_id) = &picked {
            guard.insert(team_id.to_string(), user_id.clone());
        }
        Ok(picked)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RosterError {
    RosterError::Unavailable("roster lock poisoned".to_string())
}

pub(crate) fn sample_agent_a() -> AgentSnapshot {
    AgentSnapshot {
        user_id: "agent-avery".to_string(),
        full_name: "Avery Stone".to_string(),
        capacity_target: 8,
        active_pipeline: 2,
        geography_fit: 0.9,
        price_band_fit: 0.8,
        kept_appt_rate: 0.7,
        consent_ready: true,
        ten_dlc_ready: true,
        team_id: Some("team-metro".to_string()),
        round_robin_order: Some(1),
        roles: Vec::new(),
    }
}

pub(crate) fn sample_agent_b() -> AgentSnapshot {
    AgentSnapshot {
        user_id: "agent-blake".to_string(),
        full_name: "Blake Moreno".to_string(),
        capacity_target: 8,
        active_pipeline: 7,
        geography_fit: 0.5,
        price_band_fit: 0.4,
        kept_appt_rate: 0.4,
        consent_ready: true,
        ten_dlc_ready: true,
        team_id: Some("team-metro".to_string()),
        round_robin_order: Some(2),
        roles: Vec::new(),
    }
}

fn sample_agent_isa() -> AgentSnapshot {
    AgentSnapshot {
        user_id: "agent-inez".to_string(),
        full_name: "Inez Park".to_string(),
        capacity_target: 30,
        active_pipeline: 12,
        geography_fit: 0.6,
        price_band_fit: 0.6,
        kept_appt_rate: 0.65,
        consent_ready: true,
        ten_dlc_ready: true,
        team_id: Some("team-isa".to_string()),
        round_robin_order: Some(1),
        roles: Vec::new(),
    }
}

pub(crate) fn read_json_file(path: &Path) -> Result<Value, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
