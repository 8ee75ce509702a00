//! Lead routing: condition evaluation, agent scoring, and dispatch.
//!
//! [`conditions`] and [`scoring`] are pure and independent of each other. [`rules`] and
//! [`dispatch`] compose them the way the CRM does when an inbound lead arrives; the
//! [`AgentRoster`] trait is the only I/O seam.

pub mod conditions;
pub mod context;
pub mod dispatch;
mod error;
pub mod router;
pub mod rules;
pub mod scoring;
pub mod targets;

#[cfg(test)]
mod tests;

pub use conditions::{
    evaluate, quiet_hours, ConditionCheck, ConditionEvaluation, ConditionKey, RoutingConditions,
    TimeWindow,
};
pub use context::{ChannelConsent, ConsentState, ListingFacts, PersonFacts, RoutingContext};
pub use dispatch::{
    AgentRoster, Assignment, DispatchError, DispatchOutcome, DispatchRequest, LeadDispatcher,
    RosterError,
};
pub use error::SchemaValidationError;
pub use router::routing_router;
pub use rules::{match_rules, RoutingRule, RuleMatch};
pub use scoring::{
    next_round_robin, rank_agents, route_lead, score_agent, AgentScore, AgentScorer,
    AgentSnapshot, ReasonType, RoutingConfig, RoutingInput, RoutingResult, ScoreReason,
};
pub use targets::{RoutingFallback, RoutingTarget, TeamStrategy};
