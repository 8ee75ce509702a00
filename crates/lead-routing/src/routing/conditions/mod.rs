//! Condition evaluation for routing rules.
//!
//! Evaluation is two-phase: [`RoutingConditions::validate`] rejects malformed shapes and
//! normalises the clauses, then [`ValidatedConditions::evaluate`] runs the clause logic. A
//! clause that is absent is vacuously satisfied and does not appear in the trace.

mod clauses;
mod clock;
mod schema;

pub use clock::ResolvedWindow;
pub use schema::{
    BuyerRepCondition, BuyerRepRequirement, ConsentCondition, ConsentRequirement,
    GeographyCondition, PriceBandCondition, RoutingConditions, SourceCondition, TimeWindow,
    ValidatedConditions,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::RoutingContext;
use super::error::SchemaValidationError;

/// Clause identifiers, listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKey {
    Geography,
    PriceBand,
    Sources,
    Consent,
    BuyerRep,
    TimeWindows,
}

/// Pass/fail record for one clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCheck {
    pub key: ConditionKey,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ConditionCheck {
    pub(crate) fn pass(key: ConditionKey) -> Self {
        Self {
            key,
            passed: true,
            detail: None,
        }
    }

    pub(crate) fn fail(key: ConditionKey, detail: impl Into<String>) -> Self {
        Self {
            key,
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Result of evaluating a rule's conditions against a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEvaluation {
    pub matched: bool,
    pub checks: Vec<ConditionCheck>,
}

impl ConditionEvaluation {
    /// The outcome for a rule without conditions.
    pub fn vacuous() -> Self {
        Self {
            matched: true,
            checks: Vec::new(),
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ConditionCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

impl ValidatedConditions {
    pub fn evaluate(&self, context: &RoutingContext) -> ConditionEvaluation {
        let listing = context.listing.as_ref();
        let person = &context.person;

        let mut checks = Vec::new();
        if let Some(filter) = &self.geography {
            checks.push(clauses::geography(filter, listing));
        }
        if let Some(band) = &self.price_band {
            checks.push(clauses::price_band(band, listing));
        }
        if let Some(filter) = &self.sources {
            checks.push(clauses::sources(filter, person));
        }
        if let Some(consent) = &self.consent {
            checks.push(clauses::consent(consent, person));
        }
        if let Some(requirement) = self.buyer_rep {
            checks.push(clauses::buyer_rep(requirement, person));
        }
        if let Some(windows) = &self.time_windows {
            checks.push(clauses::time_windows(windows, context.now));
        }

        let matched = checks.iter().all(|check| check.passed);
        debug!(matched, clauses = checks.len(), "evaluated routing conditions");

        ConditionEvaluation { matched, checks }
    }
}

/// Evaluate optional conditions against a context, validating them first.
pub fn evaluate(
    conditions: Option<&RoutingConditions>,
    context: &RoutingContext,
) -> Result<ConditionEvaluation, SchemaValidationError> {
    match conditions {
        None => Ok(ConditionEvaluation::vacuous()),
        Some(conditions) => Ok(conditions.validate()?.evaluate(context)),
    }
}

/// Whether `now` falls inside any of the given quiet-hour windows.
///
/// Uses the same resolution and OR semantics as the `time_windows` clause. An empty list
/// means there are no quiet hours.
pub fn quiet_hours(
    windows: &[TimeWindow],
    now: DateTime<Utc>,
) -> Result<bool, SchemaValidationError> {
    let resolved = windows
        .iter()
        .map(ResolvedWindow::resolve)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(resolved.iter().any(|window| window.contains(now)))
}
