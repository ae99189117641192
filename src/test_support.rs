//! Helpers for router tests that run against a migrated database.

use axum::{
    body::Body,
    extract::FromRef,
    http::{Method, Request, StatusCode},
    Router,
};
use lazy_static::lazy_static;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use crate::{
    accounts::repo_types::{NewUser, Profile, User},
    app::build_app,
    auth::{claims::TokenKind, jwt::JwtKeys, password::hash_password},
    state::AppState,
};

pub const PASSWORD: &str = "longenough";

lazy_static! {
    static ref PASSWORD_HASH: String = hash_password(PASSWORD).unwrap();
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new(db: PgPool) -> Self {
        let state = AppState::with_pool(db);
        let router = build_app(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &PgPool {
        &self.state.db
    }

    pub fn token_for(&self, user: &User) -> String {
        JwtKeys::from_ref(&self.state)
            .issue(user.id, TokenKind::Access)
            .unwrap()
    }

    /// Sends a JSON request and returns the status with the decoded body (`Null` when empty).
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

/// Inserts an account with [`PASSWORD`] and a derived member code.
pub async fn seed_user(db: &PgPool, email: &str, referred_by: Option<uuid::Uuid>) -> User {
    let local = email.split('@').next().unwrap_or(email);
    let new = NewUser {
        email: email.to_string(),
        phone: None,
        user_id: format!("M-{local}"),
        username: None,
        password_hash: PASSWORD_HASH.clone(),
        name: local.to_string(),
        dob: None,
        is_member_account: false,
        profile: Profile::default(),
        referred_by,
    };
    User::create(db, &new).await.unwrap()
}

/// Sets one boolean account flag; `column` is a fixed name from the test itself.
pub async fn set_flag(db: &PgPool, user: &User, column: &str, value: bool) {
    sqlx::query(&format!("UPDATE users SET {column} = $2 WHERE id = $1"))
        .bind(user.id)
        .bind(value)
        .execute(db)
        .await
        .unwrap();
}
