use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Profile, User};

/// Request body for `join/`.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub dob: Option<Date>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    /// Public `user_id` of the referrer.
    pub referred_by: Option<String>,
}

/// Request body for creating a member account: the join fields plus profile.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRequest {
    #[serde(flatten)]
    pub account: JoinRequest,
    #[serde(flatten)]
    pub profile: Profile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub dob: Option<Date>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Login body. The identifier may be an email, phone, user_id or username.
#[derive(Debug, Deserialize)]
pub struct TokenObtainRequest {
    #[serde(alias = "email", alias = "identifier", alias = "phone", alias = "user_id")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Public part of the user returned after signup.
#[derive(Debug, Serialize)]
pub struct JoinedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub dob: Option<Date>,
    pub user_id: String,
    pub username: Option<String>,
    pub is_member_account: bool,
    pub referred_by: Option<Uuid>,
    pub date_joined: OffsetDateTime,
}

impl From<User> for JoinedUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            dob: u.dob,
            user_id: u.user_id,
            username: u.username,
            is_member_account: u.is_member_account,
            referred_by: u.referred_by,
            date_joined: u.date_joined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_request_reads_account_and_profile_from_one_object() {
        let req: MemberRequest = serde_json::from_value(serde_json::json!({
            "email": "m@example.com",
            "password": "longenough",
            "name": "Member",
            "dob": "1990-04-12",
            "district": "Pune",
            "postal_code": "411001"
        }))
        .unwrap();
        assert_eq!(req.account.email, "m@example.com");
        assert_eq!(req.account.dob.map(|d| d.year()), Some(1990));
        assert_eq!(req.profile.district.as_deref(), Some("Pune"));
        assert_eq!(req.profile.postal_code.as_deref(), Some("411001"));
        assert!(req.profile.city.is_none());
    }

    #[test]
    fn token_request_accepts_any_identifier_key() {
        for key in ["username", "email", "identifier", "phone", "user_id"] {
            let req: TokenObtainRequest =
                serde_json::from_value(serde_json::json!({ key: "who", "password": "pw" }))
                    .unwrap();
            assert_eq!(req.username, "who");
        }
    }
}
