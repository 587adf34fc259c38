pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod import;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::jwt::TokenService;
use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

/// Assemble the router and its shared state. Fails when the token settings
/// are unusable.
pub fn build_app(pool: PgPool, config: Config) -> Result<(Router, SharedState), String> {
    let tokens = TokenService::from_config(&config)?;

    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        tokens,
        system_mailer,
        login_limiter: LoginRateLimiter::new(),
    });

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ));

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    Ok((app, state))
}

/// Periodically sweep expired login-failure windows until the runtime stops.
pub fn spawn_limiter_sweeper(state: SharedState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(rate_limit::SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let before = state.login_limiter.len();
            state.login_limiter.cleanup();
            let swept = before.saturating_sub(state.login_limiter.len());
            if swept > 0 {
                tracing::debug!(swept, "Login limiter entries expired");
            }
        }
    })
}

async fn health() -> &'static str {
    "ok"
}
