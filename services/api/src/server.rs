use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRoster};
use crate::routes::with_routing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_routing::config::AppConfig;
use lead_routing::error::AppError;
use lead_routing::routing::LeadDispatcher;
use lead_routing::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roster = Arc::new(InMemoryRoster::sample());
    let dispatcher = Arc::new(LeadDispatcher::new(roster, config.routing));

    let app = with_routing_routes(dispatcher)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        minimum_score = config.routing.minimum_score,
        "lead routing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
