use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conditions::{evaluate, RoutingConditions};
use super::context::RoutingContext;
use super::dispatch::{AgentRoster, DispatchError, DispatchRequest, LeadDispatcher};
use super::error::SchemaValidationError;
use super::scoring::{
    route_lead, score_agent, AgentScore, AgentSnapshot, RoutingConfig, RoutingInput,
};
use crate::error::AppError;

/// Router exposing condition evaluation, scoring, routing, and dispatch endpoints.
pub fn routing_router<R>(dispatcher: Arc<LeadDispatcher<R>>) -> Router
where
    R: AgentRoster + 'static,
{
    Router::new()
        .route(
            "/api/v1/routing/conditions/evaluate",
            post(evaluate_handler::<R>),
        )
        .route("/api/v1/routing/score", post(score_handler::<R>))
        .route("/api/v1/routing/route", post(route_handler::<R>))
        .route("/api/v1/routing/dispatch", post(dispatch_handler::<R>))
        .with_state(dispatcher)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluateRequest {
    #[serde(default)]
    conditions: Option<RoutingConditions>,
    context: RoutingContext,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScoreRequest {
    agent: AgentSnapshot,
    #[serde(default)]
    config: Option<RoutingConfig>,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<AgentScore>,
}

pub(crate) async fn evaluate_handler<R>(
    State(_dispatcher): State<Arc<LeadDispatcher<R>>>,
    Json(payload): Json<Value>,
) -> Response
where
    R: AgentRoster + 'static,
{
    let outcome = parse::<EvaluateRequest>("evaluate request", payload).and_then(|request| {
        evaluate(request.conditions.as_ref(), &request.context)
    });

    match outcome {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn score_handler<R>(
    State(dispatcher): State<Arc<LeadDispatcher<R>>>,
    Json(payload): Json<Value>,
) -> Response
where
    R: AgentRoster + 'static,
{
    let outcome = parse::<ScoreRequest>("score request", payload).and_then(|request| {
        let config = request.config.unwrap_or(*dispatcher.defaults());
        score_agent(&request.agent, &config)
    });

    match outcome {
        Ok(score) => {
            let body = ScoreResponse {
                eligible: score.is_some(),
                score,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn route_handler<R>(
    State(dispatcher): State<Arc<LeadDispatcher<R>>>,
    Json(payload): Json<Value>,
) -> Response
where
    R: AgentRoster + 'static,
{
    let outcome = RoutingInput::from_json(&payload).and_then(|mut input| {
        input.config.get_or_insert(*dispatcher.defaults());
        route_lead(&input)
    });

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn dispatch_handler<R>(
    State(dispatcher): State<Arc<LeadDispatcher<R>>>,
    Json(payload): Json<Value>,
) -> Response
where
    R: AgentRoster + 'static,
{
    let outcome = DispatchRequest::from_json(&payload)
        .map_err(DispatchError::from)
        .and_then(|request| dispatcher.dispatch(request));

    match outcome {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

fn parse<T>(shape: &'static str, payload: Value) -> Result<T, SchemaValidationError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(payload).map_err(|err| SchemaValidationError::malformed(shape, err))
}
