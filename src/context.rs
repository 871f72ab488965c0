use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
};
use uuid::Uuid;

use crate::error::AppError;

/// HTTP header carrying the account identity
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
/// HTTP header carrying the active viewing profile
pub const PROFILE_ID_HEADER: &str = "x-profile-id";

/// Identity of the viewer a request acts for.
///
/// Every operation takes the account and profile explicitly; there is no
/// ambient session. The transport layer supplies both ids as headers and
/// this extractor rejects requests that arrive without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerContext {
    pub account_id: Uuid,
    pub profile_id: Uuid,
}

fn header_uuid(parts: &Parts, name: &'static str) -> Result<Uuid, AppError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::Unauthenticated(format!("missing {} header", name)))?;
    let value = value
        .to_str()
        .map_err(|_| AppError::InvalidInput(format!("malformed {} header", name)))?;
    Uuid::parse_str(value).map_err(|_| AppError::InvalidInput(format!("malformed {} header", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for ViewerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            account_id: header_uuid(parts, ACCOUNT_ID_HEADER)?,
            profile_id: header_uuid(parts, PROFILE_ID_HEADER)?,
        })
    }
}

/// Request span for the HTTP trace layer, tagged with the viewer account
/// when the header is present.
pub fn make_request_span(request: &Request<Body>) -> tracing::Span {
    let account = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("anonymous");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        account = %account,
    )
}
