use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conditions::{
    ConditionCheck, ConditionEvaluation, RoutingConditions, ValidatedConditions,
};
use super::context::RoutingContext;
use super::error::{require_text, SchemaValidationError};
use super::targets::{RoutingFallback, RoutingTarget};

const DEFAULT_PRIORITY: i32 = 100;

/// A routing rule: conditions plus the ordered targets they unlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lower runs first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RoutingConditions>,
    pub targets: Vec<RoutingTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<RoutingFallback>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

impl RoutingRule {
    pub fn validate(&self) -> Result<Option<ValidatedConditions>, SchemaValidationError> {
        require_text("rule id", &self.id)?;
        if self.targets.is_empty() {
            return Err(SchemaValidationError::EmptyTargets {
                rule_id: self.id.clone(),
            });
        }
        self.conditions
            .as_ref()
            .map(RoutingConditions::validate)
            .transpose()
    }
}

/// The winning rule and the evaluation trace that selected it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub targets: Vec<RoutingTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<RoutingFallback>,
    pub checks: Vec<ConditionCheck>,
}

/// First enabled rule, by ascending priority, whose conditions match.
///
/// Every enabled rule is validated before any is evaluated. Equal priorities keep input
/// order.
pub fn match_rules(
    rules: &[RoutingRule],
    context: &RoutingContext,
) -> Result<Option<RuleMatch>, SchemaValidationError> {
    let mut compiled = rules
        .iter()
        .filter(|rule| rule.enabled)
        .map(|rule| rule.validate().map(|conditions| (rule, conditions)))
        .collect::<Result<Vec<_>, _>>()?;
    compiled.sort_by_key(|(rule, _)| rule.priority);

    for (rule, conditions) in compiled {
        let evaluation = match conditions {
            Some(conditions) => conditions.evaluate(context),
            None => ConditionEvaluation::vacuous(),
        };
        debug!(rule_id = %rule.id, matched = evaluation.matched, "evaluated routing rule");

        if evaluation.matched {
            return Ok(Some(RuleMatch {
                rule_id: rule.id.clone(),
                targets: rule.targets.clone(),
                fallback: rule.fallback.clone(),
                checks: evaluation.checks,
            }));
        }
    }

    Ok(None)
}
