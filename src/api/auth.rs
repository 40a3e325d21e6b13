use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LoginRequest, LoginResponse};

/// Bearer-token middleware for the protected routes.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let principal = state.shared.auth_service.verify(&token)?;
    tracing::Span::current().record("user_id", principal.subject.as_str());

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// POST /auth/login
///
/// Exchange the admin password for a signed token. Failures count toward
/// the per-address lockout; the 429 carries a Retry-After header.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let trusted_proxies = {
        let config = state.config().read().await;
        config.security.auth_throttle.trusted_proxy_ips.clone()
    };

    let client_ip = resolve_client_ip(peer.ip(), &headers, &trusted_proxies);

    let token = state
        .shared
        .auth_service
        .login(&payload.password, client_ip)
        .await?;

    let expires_in_hours = state.config().read().await.security.token_ttl_hours;

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        expires_in_hours,
    })))
}

/// Lockout identity of a request. Forwarded headers are only believed when
/// the socket peer is a configured proxy; otherwise a client could rotate
/// X-Forwarded-For to dodge the limiter.
fn resolve_client_ip(peer: IpAddr, headers: &HeaderMap, trusted_proxies: &[String]) -> IpAddr {
    let peer_is_trusted = trusted_proxies
        .iter()
        .any(|p| p.parse::<IpAddr>().is_ok_and(|ip| ip == peer));

    if !peer_is_trusted {
        return peer;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn untrusted_peer_forwarded_header_ignored() {
        let peer: IpAddr = "203.0.113.9".parse().unwrap();
        let ip = resolve_client_ip(peer, &forwarded("198.51.100.1"), &[]);
        assert_eq!(ip, peer);
    }

    #[test]
    fn trusted_proxy_forwarded_header_honored() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let ip = resolve_client_ip(peer, &forwarded("198.51.100.1"), &["10.0.0.1".to_string()]);
        assert_eq!(ip, "198.51.100.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn garbage_forwarded_header_falls_back_to_peer() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let ip = resolve_client_ip(peer, &forwarded("not-an-ip"), &["10.0.0.1".to_string()]);
        assert_eq!(ip, peer);
    }
}
