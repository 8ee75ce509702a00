//! Lead routing and assignment engine for brokerage CRM workflows.
//!
//! The [`routing`] module holds the pure decision core (condition evaluation, agent scoring
//! and selection) together with the rule matcher and dispatch service that compose it. The
//! remaining modules carry the configuration, telemetry, and error plumbing used by the
//! HTTP service.

pub mod config;
pub mod error;
pub mod routing;
pub mod telemetry;
