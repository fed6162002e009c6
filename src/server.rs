//! HTTP Server and Process Wiring
//!
//! This module starts the exporter: it authenticates against the VSA API, declares
//! every collector's metrics, exposes them over HTTP and drives the poll loop.
//!
//! # Startup Order
//!
//! 1. Log in to the VSA API (failure is fatal)
//! 2. Define all collector metrics
//! 3. Bind the HTTP listener
//! 4. Spawn the poll loop and serve scrapes until Ctrl-C
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (returns 200 if the last cycle reached the VSA API, 503 otherwise)
//!
//! Scrapes read the registry concurrently with the poll loop's updates; a scrape
//! always sees the last values written, including stale ones.

use crate::collectors;
use crate::config::Config;
use crate::metrics::MetricsRegistry;
use crate::scheduler::{Scheduler, SchedulerSettings};
use crate::vsa::VsaClient;
use anyhow::Context;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn start(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let common_labels = config.common_labels()?;

    let client = VsaClient::new(config.vsa.clone())?;
    client
        .login()
        .await
        .with_context(|| format!("Failed to log in to VSA API at {}", config.vsa.url))?;

    let metrics = MetricsRegistry::new()?;
    let mut scheduler = Scheduler::new(
        Arc::new(client),
        metrics.clone(),
        SchedulerSettings::from(&config.metrics),
    );
    for collector in collectors::default_collectors() {
        scheduler.register(collector);
    }
    scheduler.define_all(&common_labels)?;

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    tokio::spawn(async move {
        scheduler.run(shutdown_signal()).await;
    });

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Routes served by the exporter
pub fn router(metrics: MetricsRegistry) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>VSA Exporter</title></head>
<body>
<h1>StarWind VSA Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(metrics): State<MetricsRegistry>) -> Response {
    match metrics.render() {
        Ok(rendered) => rendered.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(metrics): State<MetricsRegistry>) -> impl IntoResponse {
    if metrics.up.get() > 0.0 {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "VSA API unreachable",
        )
    }
}
