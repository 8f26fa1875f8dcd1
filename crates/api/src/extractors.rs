//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use forkful_common::AppError;
use forkful_db::entities::user;

/// Authenticated user extractor. Rejects with 401 when the auth
/// middleware resolved no user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware when the bearer token is valid.
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// Optional authenticated user extractor for endpoints that serve
/// anonymous callers with default flags.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    /// The caller's user id, if authenticated.
    #[must_use]
    pub fn viewer_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}
