use crate::infra::{read_json_file, sample_agent_a, sample_agent_b};
use chrono::{DateTime, Utc};
use clap::Args;
use lead_routing::config::AppConfig;
use lead_routing::error::AppError;
use lead_routing::routing::{
    evaluate, quiet_hours, route_lead, ConditionEvaluation, RoutingConditions, RoutingConfig,
    RoutingContext, RoutingInput, RoutingResult, TimeWindow,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct InputArgs {
    /// Path to a JSON document describing the request
    #[arg(long)]
    pub(crate) input: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Minimum score for the strict pass of the demo (defaults to 0.9)
    #[arg(long)]
    pub(crate) strict_minimum: Option<f64>,
    /// Instant to evaluate quiet hours at (RFC 3339). Defaults to now.
    #[arg(long)]
    pub(crate) at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluateInput {
    #[serde(default)]
    conditions: Option<RoutingConditions>,
    context: RoutingContext,
}

pub(crate) fn run_route(args: InputArgs) -> Result<(), AppError> {
    let defaults = AppConfig::load()?.routing;
    let raw = read_json_file(&args.input)?;
    let mut input = RoutingInput::from_json(&raw)?;
    input.config.get_or_insert(defaults);

    let result = route_lead(&input)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(crate) fn run_evaluate(args: InputArgs) -> Result<(), AppError> {
    let raw = read_json_file(&args.input)?;
    let request: EvaluateInput = serde_json::from_value(raw)?;

    let evaluation = evaluate(request.conditions.as_ref(), &request.context)?;
    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let strict_minimum = args.strict_minimum.unwrap_or(0.9);
    let at = args.at.unwrap_or_else(Utc::now);

    println!("Lead routing demo");
    let standard = demo_input(RoutingConfig::default(), false);
    let result = route_lead(&standard)?;
    render_result("Default weights", &result);

    let strict = demo_input(
        RoutingConfig {
            minimum_score: strict_minimum,
            ..RoutingConfig::default()
        },
        false,
    );
    let result = route_lead(&strict)?;
    render_result(&format!("Minimum score {strict_minimum:.2}"), &result);

    let windows = vec![TimeWindow::new("America/Chicago", "21:00", "07:00")];
    let quiet = quiet_hours(&windows, at)?;
    println!(
        "\nQuiet hours (21:00-07:00 America/Chicago) at {}: {}",
        at.to_rfc3339(),
        if quiet { "active" } else { "inactive" }
    );
    let result = route_lead(&demo_input(RoutingConfig::default(), quiet))?;
    render_result("Default weights with quiet hours", &result);

    let conditions: RoutingConditions = serde_json::from_value(serde_json::json!({
        "geography": { "include_states": ["TX"] },
        "price_band": { "min": 300000.0, "max": 800000.0 },
        "time_windows": [{
            "timezone": "America/Chicago",
            "start": "08:00",
            "end": "18:00",
            "days": [1, 2, 3, 4, 5]
        }]
    }))?;
    let context: RoutingContext = serde_json::from_value(serde_json::json!({
        "now": at,
        "tenant_timezone": "America/Chicago",
        "person": { "source": "Zillow" },
        "listing": { "price": 525000.0, "city": "Austin", "state": "TX" }
    }))?;
    let evaluation = evaluate(Some(&conditions), &context)?;
    render_evaluation(&evaluation);

    Ok(())
}

fn demo_input(config: RoutingConfig, quiet: bool) -> RoutingInput {
    RoutingInput {
        lead_id: "lead-demo".to_string(),
        tenant_id: "tenant-demo".to_string(),
        agents: vec![sample_agent_a(), sample_agent_b()],
        config: Some(config),
        fallback_team_id: Some("team-isa".to_string()),
        quiet_hours: quiet,
    }
}

fn render_result(title: &str, result: &RoutingResult) {
    println!("\n{title}");
    if result.used_fallback {
        println!(
            "- no agent cleared the threshold; fallback team {}",
            result.fallback_team_id.as_deref().unwrap_or("(none)")
        );
    }
    for agent in &result.selected_agents {
        println!("- {} ({}) score {:.4}", agent.full_name, agent.user_id, agent.score);
        for reason in &agent.reasons {
            println!("    {} x{:.2}", reason.description, reason.weight);
        }
    }
    if result.quiet_hours {
        println!("- quiet hours active; hold outbound touches");
    }
}

fn render_evaluation(evaluation: &ConditionEvaluation) {
    println!(
        "\nRule conditions: {}",
        if evaluation.matched { "matched" } else { "not matched" }
    );
    for check in &evaluation.checks {
        let verdict = if check.passed { "pass" } else { "fail" };
        match &check.detail {
            Some(detail) => println!("- {:?}: {verdict} ({detail})", check.key),
            None => println!("- {:?}: {verdict}", check.key),
        }
    }
}
