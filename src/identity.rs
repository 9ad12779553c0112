// Acting-user extraction for sale endpoints
//
// Authentication happens upstream of this service; the gateway forwards the
// resolved user id in the `X-User-Id` header and handlers pass it explicitly
// into the sale service.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the acting user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Acting user extractor for endpoints that record who performed a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Malformed X-User-Id header".to_string()))?;

        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::Unauthorized("X-User-Id must be a UUID".to_string()))?;

        if user_id.is_nil() {
            return Err(ApiError::Unauthorized("X-User-Id must not be nil".to_string()));
        }

        debug!("Resolved acting user {}", user_id);
        Ok(ActingUser { user_id })
    }
}
