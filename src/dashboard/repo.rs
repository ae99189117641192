use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{ReferralItem, UserCounts};

pub async fn user_counts(db: &PgPool) -> anyhow::Result<UserCounts> {
    let counts = sqlx::query_as::<_, UserCounts>(
        r#"
        SELECT COUNT(*)                                        AS total_user,
               COUNT(*) FILTER (WHERE is_verified)             AS verified_user,
               COUNT(*) FILTER (WHERE is_member_account)       AS member_user,
               COUNT(*) FILTER (WHERE is_volunteer)            AS volunteer_user,
               COUNT(*) FILTER (WHERE is_business_account)     AS business_user,
               COUNT(*) FILTER (WHERE is_staff_account)        AS staff_user,
               COUNT(*) FILTER (WHERE is_admin_account)        AS admin_user,
               COUNT(*) FILTER (WHERE is_blocked)              AS blocked_user
          FROM users
        "#,
    )
    .fetch_one(db)
    .await
    .context("count users")?;
    Ok(counts)
}

/// Accounts whose `referred_by` is `referrer`, newest first.
pub async fn referrals_of(
    db: &PgPool,
    referrer: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ReferralItem>> {
    let rows = sqlx::query_as::<_, ReferralItem>(
        r#"
        SELECT u.id, u.user_id, u.name, u.email, u.phone, u.is_member_account, u.is_volunteer,
               u.date_joined,
               (SELECT COUNT(*) FROM users r WHERE r.referred_by = u.id) AS referral_count
          FROM users u
         WHERE u.referred_by = $1
         ORDER BY u.date_joined DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(referrer)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list referrals")?;
    Ok(rows)
}
