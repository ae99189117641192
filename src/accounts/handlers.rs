use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AccessToken, JoinRequest, JoinedUser, MemberRequest, MemberUpdateRequest, RefreshRequest,
        TokenObtainRequest, TokenPair, VerifyRequest,
    },
    repo_types::{Profile, User},
    services::{authenticate, create_account, update_member},
};
use crate::{
    auth::{claims::TokenKind, extractors::CurrentUser, jwt::JwtKeys},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/join/", post(join))
        .route(
            "/member/",
            post(create_member).get(get_member).patch(patch_member),
        )
        .route("/token/", post(obtain_token))
        .route("/token/refresh/", post(refresh_token))
        .route("/token/verify/", post(verify_token))
}

#[instrument(skip(state, payload))]
pub async fn join(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> AppResult<(StatusCode, Json<JoinedUser>)> {
    let user = create_account(&state.db, payload, Profile::default(), false).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn create_member(
    State(state): State<AppState>,
    Json(payload): Json<MemberRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = create_account(&state.db, payload.account, payload.profile, true).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all)]
pub async fn get_member(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all)]
pub async fn patch_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<MemberUpdateRequest>,
) -> AppResult<Json<User>> {
    let updated = update_member(&state.db, &user, payload).await?;
    Ok(Json(updated))
}

#[instrument(skip(state, payload))]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenObtainRequest>,
) -> AppResult<Json<TokenPair>> {
    let user = authenticate(&state.db, &payload.username, &payload.password).await?;

    let (access, refresh) = JwtKeys::from_ref(&state).issue_pair(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenPair { access, refresh }))
}

#[instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AccessToken>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .check(&payload.refresh, Some(TokenKind::Refresh))
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::Unauthorized("Token is invalid or expired".into())
        })?;
    let access = keys.issue(claims.sub, TokenKind::Access)?;
    Ok(Json(AccessToken { access }))
}

#[instrument(skip(state, payload))]
pub async fn verify_token(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match JwtKeys::from_ref(&state).check(&payload.token, None) {
        Ok(_) => Ok(Json(json!({}))),
        Err(e) => {
            warn!(error = %e, "token verify failed");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": "Token is invalid or expired",
                    "code": "token_not_valid",
                })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    async fn post_json(path: &str, body: Value) -> (StatusCode, Value) {
        let app = account_routes().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn verify_accepts_fresh_tokens() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let token = keys.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
        let (status, body) = post_json("/token/verify/", json!({ "token": token })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn verify_rejects_garbage_with_code() {
        let (status, body) = post_json("/token/verify/", json!({ "token": "abc" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "token_not_valid");
    }

    #[tokio::test]
    async fn refresh_issues_access_for_refresh_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let user_id = Uuid::new_v4();
        let refresh = keys.issue(user_id, TokenKind::Refresh).unwrap();
        let (status, body) = post_json("/token/refresh/", json!({ "refresh": refresh })).await;
        assert_eq!(status, StatusCode::OK);
        let claims = keys
            .check(body["access"].as_str().unwrap(), Some(TokenKind::Access))
            .unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let access = keys.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
        let (status, body) = post_json("/token/refresh/", json!({ "refresh": access })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Token is invalid or expired");
    }

    #[tokio::test]
    async fn member_profile_requires_token() {
        let app = account_routes().with_state(AppState::fake());
        let res = app
            .oneshot(Request::get("/member/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    mod with_db {
        use axum::http::Method;
        use sqlx::PgPool;

        use super::*;
        use crate::test_support::{seed_user, set_flag, TestApp, PASSWORD};

        async fn login(app: &TestApp, identifier: &str, password: &str) -> (StatusCode, Value) {
            app.call(
                Method::POST,
                "/api/account/token/",
                None,
                Some(json!({ "username": identifier, "password": password })),
            )
            .await
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn each_login_key_signs_in(pool: PgPool) {
            let app = TestApp::new(pool);
            let user = seed_user(app.db(), "asha@example.com", None).await;
            sqlx::query("UPDATE users SET phone = '9876543210', username = 'asha_k' WHERE id = $1")
                .bind(user.id)
                .execute(app.db())
                .await
                .unwrap();
            let keys = JwtKeys::from_ref(&app.state);

            for identifier in ["asha@example.com", "ASHA@example.com", "9876543210", "M-asha", "asha_k"] {
                let (status, body) = login(&app, identifier, PASSWORD).await;
                assert_eq!(status, StatusCode::OK, "{identifier}: {body}");
                let access = keys
                    .check(body["access"].as_str().unwrap(), Some(TokenKind::Access))
                    .unwrap();
                assert_eq!(access.sub, user.id, "{identifier}");
                keys.check(body["refresh"].as_str().unwrap(), Some(TokenKind::Refresh))
                    .unwrap();
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn login_failures_are_told_apart(pool: PgPool) {
            let app = TestApp::new(pool);
            let user = seed_user(app.db(), "ravi@example.com", None).await;

            let (status, body) = login(&app, "M-ravi", "not-the-password").await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "Incorrect password.");

            let (status, body) = login(&app, "ghost@example.com", PASSWORD).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "User not found.");

            set_flag(app.db(), &user, "is_blocked", true).await;
            let (status, _) = login(&app, "ravi@example.com", PASSWORD).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn joined_account_can_sign_in(pool: PgPool) {
            let app = TestApp::new(pool);
            let (status, body) = app
                .call(
                    Method::POST,
                    "/api/account/join/",
                    None,
                    Some(json!({
                        "email": "meera@example.com",
                        "password": "s3cret-pass",
                        "name": "Meera",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");

            let (status, body) = login(&app, "meera@example.com", "s3cret-pass").await;
            assert_eq!(status, StatusCode::OK, "{body}");
            let token = body["access"].as_str().unwrap().to_string();

            let (status, body) = app.call(Method::GET, "/api/account/member/", Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["email"], "meera@example.com");
        }
    }
}
