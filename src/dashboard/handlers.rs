use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{ReferralItem, UserCounts},
    repo,
};
use crate::{
    accounts::repo_types::{LoginField, User},
    auth::{
        extractors::{Authorized, CurrentUser},
        permissions::{IsAdminOrIsStaff, IsAuthenticated},
    },
    error::AppResult,
    pagination::Pagination,
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/user-count/", get(user_count))
        .route("/referrals/", get(my_referrals))
        .route("/referrals/:user_id/", get(user_referrals))
}

#[instrument(skip_all)]
pub async fn dashboard(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all)]
pub async fn user_count(
    State(state): State<AppState>,
    _auth: Authorized<IsAuthenticated>,
) -> AppResult<Json<UserCounts>> {
    Ok(Json(repo::user_counts(&state.db).await?))
}

#[instrument(skip_all)]
pub async fn my_referrals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<ReferralItem>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(repo::referrals_of(&state.db, user.id, limit, offset).await?))
}

/// Referrals of any account by its public code; unknown codes list nothing.
#[instrument(skip(state, _auth, page))]
pub async fn user_referrals(
    State(state): State<AppState>,
    _auth: Authorized<IsAdminOrIsStaff>,
    Path(user_id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<ReferralItem>>> {
    let Some(referrer) = User::find_by_login_field(&state.db, LoginField::UserId, &user_id).await?
    else {
        debug!(%user_id, "referral lookup for unknown user");
        return Ok(Json(Vec::new()));
    };
    let (limit, offset) = page.normalize();
    Ok(Json(repo::referrals_of(&state.db, referrer.id, limit, offset).await?))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn every_dashboard_route_needs_a_token() {
        for path in ["/", "/user-count/", "/referrals/", "/referrals/M12345678/"] {
            let res = dashboard_routes()
                .with_state(AppState::fake())
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[test]
    fn counts_serialize_with_dashboard_keys() {
        let json = serde_json::to_value(UserCounts::default()).unwrap();
        for key in [
            "total_user", "verified_user", "member_user", "volunteer_user",
            "business_user", "staff_user", "admin_user", "blocked_user",
        ] {
            assert_eq!(json[key], 0, "{key}");
        }
    }

    mod with_db {
        use axum::http::Method;
        use serde_json::Value;
        use sqlx::PgPool;
        use uuid::Uuid;

        use super::*;
        use crate::test_support::{seed_user, set_flag, TestApp};

        const FLAGS: [(&str, &str); 7] = [
            ("verified_user", "is_verified"),
            ("member_user", "is_member_account"),
            ("volunteer_user", "is_volunteer"),
            ("business_user", "is_business_account"),
            ("staff_user", "is_staff_account"),
            ("admin_user", "is_admin_account"),
            ("blocked_user", "is_blocked"),
        ];

        async fn count_where(db: &PgPool, column: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {column}"))
                .fetch_one(db)
                .await
                .unwrap()
        }

        fn ids(body: &Value) -> Vec<Uuid> {
            body.as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_str().unwrap().parse().unwrap())
                .collect()
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn user_count_matches_table(pool: PgPool) {
            let app = TestApp::new(pool);
            let viewer = seed_user(app.db(), "viewer@example.com", None).await;
            let mut seeded = Vec::new();
            for i in 0..7 {
                seeded.push(seed_user(app.db(), &format!("u{i}@example.com"), None).await);
            }
            // a different mix of flags per column
            for (i, (_, column)) in FLAGS.iter().enumerate() {
                for user in seeded.iter().take(i + 1) {
                    set_flag(app.db(), user, column, true).await;
                }
            }
            set_flag(app.db(), &seeded[6], "is_staff_account", false).await;

            let (status, body) = app
                .call(Method::GET, "/api/dashboard/user-count/", Some(&app.token_for(&viewer)), None)
                .await;
            assert_eq!(status, StatusCode::OK);
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(app.db())
                .await
                .unwrap();
            assert_eq!(body["total_user"], total);
            for (key, column) in FLAGS {
                assert_eq!(body[key], count_where(app.db(), column).await, "{key}");
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn referrals_are_direct_and_newest_first(pool: PgPool) {
            let app = TestApp::new(pool);
            let referrer = seed_user(app.db(), "referrer@example.com", None).await;
            let other = seed_user(app.db(), "other@example.com", None).await;
            let old = seed_user(app.db(), "old@example.com", Some(referrer.id)).await;
            let new = seed_user(app.db(), "new@example.com", Some(referrer.id)).await;
            let mid = seed_user(app.db(), "mid@example.com", Some(referrer.id)).await;
            // second-level and unrelated referrals stay out
            let nested = seed_user(app.db(), "nested@example.com", Some(old.id)).await;
            seed_user(app.db(), "elsewhere@example.com", Some(other.id)).await;
            for (user, days) in [(&old, 30), (&mid, 10), (&new, 1), (&nested, 0)] {
                sqlx::query("UPDATE users SET date_joined = now() - make_interval(days => $2) WHERE id = $1")
                    .bind(user.id)
                    .bind(days)
                    .execute(app.db())
                    .await
                    .unwrap();
            }

            let (status, body) = app
                .call(Method::GET, "/api/dashboard/referrals/", Some(&app.token_for(&referrer)), None)
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(ids(&body), vec![new.id, mid.id, old.id]);
            assert_eq!(body[2]["referral_count"], 1);

            let path = format!("/api/dashboard/referrals/{}/", referrer.user_id);
            let (status, _) = app.call(Method::GET, &path, Some(&app.token_for(&other)), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN);

            set_flag(app.db(), &other, "is_staff_account", true).await;
            let (status, body) = app.call(Method::GET, &path, Some(&app.token_for(&other)), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(ids(&body), vec![new.id, mid.id, old.id]);

            let (_, body) = app
                .call(
                    Method::GET,
                    "/api/dashboard/referrals/M-nobody/",
                    Some(&app.token_for(&other)),
                    None,
                )
                .await;
            assert_eq!(body, serde_json::json!([]));
        }
    }
}
