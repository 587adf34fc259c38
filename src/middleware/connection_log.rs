use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use ipnet::IpNet;
use sqlx::PgPool;

use crate::state::SharedState;

pub const LOGIN_SUCCESS: &str = "login_success";
pub const LOGIN_FAILED: &str = "login_failed";
pub const PASSWORD_CHANGED: &str = "password_changed";
pub const PASSWORD_RESET: &str = "password_reset";

/// Where a request came from, as recorded in the connection log.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_request(
        headers: &HeaderMap,
        peer_addr: Option<IpAddr>,
        trusted_proxies: &[IpNet],
    ) -> Self {
        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            ip: peer_addr.map(|peer| client_ip(headers, peer, trusted_proxies).to_string()),
            user_agent,
        }
    }
}

impl FromRequestParts<SharedState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientInfo::from_request(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        ))
    }
}

/// X-Forwarded-For is honored only when the peer is a trusted proxy; the
/// leftmost untrusted address wins.
fn client_ip(headers: &HeaderMap, peer: IpAddr, trusted_proxies: &[IpNet]) -> IpAddr {
    if !trusted_proxies.iter().any(|net| net.contains(&peer)) {
        return peer;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| {
            xff.split(',')
                .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                .find(|ip| !trusted_proxies.iter().any(|net| net.contains(ip)))
        })
        .unwrap_or(peer)
}

/// Append a connection event. Failures are logged and swallowed so that
/// logging never breaks a login.
pub async fn log_event(
    pool: &PgPool,
    user_id: Option<i64>,
    event: &str,
    client: &ClientInfo,
    detail: Option<&str>,
) {
    if let Err(e) = crate::db::connection_logs::insert(
        pool,
        user_id,
        event,
        client.ip.as_deref(),
        client.user_agent.as_deref(),
        detail,
    )
    .await
    {
        tracing::error!("Failed to record {event} event: {e}");
    }
}
