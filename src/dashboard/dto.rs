use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Aggregate account counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct UserCounts {
    pub total_user: i64,
    pub verified_user: i64,
    pub member_user: i64,
    pub volunteer_user: i64,
    pub business_user: i64,
    pub staff_user: i64,
    pub admin_user: i64,
    pub blocked_user: i64,
}

/// One referred account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferralItem {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_member_account: bool,
    pub is_volunteer: bool,
    pub date_joined: OffsetDateTime,
    /// How many accounts this referral has referred in turn.
    pub referral_count: i64,
}
