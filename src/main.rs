use std::{env, net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{Request, Response},
};
use surrealdb::{engine::any::Any, Surreal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;
use uuid::Uuid;

use crate::{
    auth::token_service::AuthConfig,
    config::LedgerConfig,
    db::{init_database, DbConfig},
    validators::play_gate::PlayGate,
};

pub use self::error::{Error, Result};

mod auth;
mod config;
mod controllers;
mod db;
mod error;
mod helpers;
mod middlewares;
mod models;
mod routes;
mod services;
mod validators;

#[derive(Clone)]
struct AppState {
    db: Surreal<Any>,
    auth_config: AuthConfig,
    ledger_config: LedgerConfig,
    play_gate: PlayGate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!("Starting Engagement Ledger API...");

    let db = init_database(&DbConfig::from_env()?).await?;

    let auth_config = AuthConfig::from_env()?;
    let ledger_config = LedgerConfig::from_env()?;
    tracing::info!(
        dedup_window_secs = ledger_config.play_dedup_window_secs,
        comment_max_length = ledger_config.comment_max_length,
        "Ledger configuration loaded"
    );

    let app_state = AppState {
        db,
        auth_config,
        play_gate: PlayGate::new(ledger_config.play_gate_capacity),
        ledger_config,
    };

    let routes_all = routes::api_router(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4();
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    tracing::info!("{} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                    let status = response.status();
                    let latency_ms = latency.as_millis();

                    match status.as_u16() {
                        200..=299 => tracing::info!("{} ({}ms)", status, latency_ms),
                        400..=499 => tracing::warn!("{} ({}ms)", status, latency_ms),
                        500..=599 => tracing::error!("{} ({}ms)", status, latency_ms),
                        _ => tracing::info!("{} ({}ms)", status, latency_ms),
                    }
                }),
        )
        .layer(CorsLayer::very_permissive());

    let host = env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|_| Error::EnvVarError(format!("invalid bind address {host}:{port}")))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        routes_all.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "engagement_ledger=debug,tower_http=info,info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}
