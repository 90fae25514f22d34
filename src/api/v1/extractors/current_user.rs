/*
 * Responsibility
 * - Hand the authenticated Principal to handlers
 * - The auth layer (middleware::auth::access) inserts it into request extensions;
 *   a route without that layer gets 401 here
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::principal::Principal;

#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("authentication required"))
    }
}
