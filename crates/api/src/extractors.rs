//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use presence_core::{RequestContext, UserId};
use tracing::debug;

/// Header carrying the caller's identity, set by the upstream authenticator.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        // Try X-Forwarded-For first (for proxied requests)
        if let Some(xff) = headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                // Take the first IP in the chain
                if let Some(ip) = xff_str.split(',').next().map(str::trim) {
                    if !ip.is_empty() {
                        return ClientIp(Some(ip.to_string()));
                    }
                }
            }
        }

        if let Some(real_ip) = headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return ClientIp(Some(ip.trim().to_string()));
            }
        }

        ClientIp(None)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Who is calling, from where, with what.
///
/// Anonymous when `X-User-Id` is missing or not a number.
#[derive(Debug, Clone)]
pub struct ClientContext(pub RequestContext);

impl ClientContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|raw| match raw.trim().parse::<UserId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!(value = raw, "Ignoring malformed user id header");
                    None
                }
            });

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .filter(|ua| !ua.is_empty())
            .map(str::to_string);

        ClientContext(RequestContext {
            user_id,
            ip_address: ClientIp::from_headers(headers).0,
            user_agent,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
