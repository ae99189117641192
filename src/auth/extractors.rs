use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::TokenKind,
    jwt::JwtKeys,
    permissions::{IsAuthenticated, Permission},
};
use crate::{accounts::repo_types::User, error::AppError, state::AppState};

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(AppError::not_authenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = JwtKeys::from_ref(state)
            .check(token, Some(TokenKind::Access))
            .map_err(|e| {
                warn!(error = %e, "invalid or expired token");
                AppError::Unauthorized("Given token not valid for any token type".into())
            })?;

        Ok(AuthUser(claims.sub))
    }
}

/// The authenticated account, loaded from the database.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(id) = AuthUser::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
        if user.is_blocked {
            warn!(user_id = %user.id, "blocked account rejected");
            return Err(AppError::Forbidden("User account is blocked.".into()));
        }
        Ok(CurrentUser(user))
    }
}

/// The authenticated account, additionally checked against permission `P`.
pub struct Authorized<P = IsAuthenticated>(pub User, pub PhantomData<fn() -> P>);

#[async_trait]
impl<P> FromRequestParts<AppState> for Authorized<P>
where
    P: Permission + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !P::has_permission(&user) {
            warn!(user_id = %user.id, "permission denied");
            return Err(AppError::permission_denied());
        }
        Ok(Authorized(user, PhantomData))
    }
}
