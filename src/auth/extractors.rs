use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{gate::require_verified, jwt::JwtKeys};
use crate::{error::AppError, id::RecordId, state::AppState};

/// Authenticated caller: the bearer token validated, subject extracted.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub RecordId);

/// Authenticated caller whose email is verified.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedUser(pub RecordId);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Authentication("missing Authorization header"))?;

    // Expect "Bearer <token>"
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AppError::Authentication("invalid Authorization header"))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Authentication("invalid auth scheme"));
    }
    Ok(token.trim())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        let token = bearer_token(parts)?;

        let user_id = keys.validate(token).map_err(|e| {
            warn!(reason = %e, "token rejected");
            AppError::Token(e)
        })?;

        Ok(AuthUser(user_id))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        require_verified(state.users.as_ref(), user_id).await?;
        Ok(VerifiedUser(user_id))
    }
}
