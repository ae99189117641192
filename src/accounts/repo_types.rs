use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Column list matching [`User`], in declaration order.
pub const USER_COLUMNS: &str = "id, email, phone, user_id, username, password_hash, name, dob, \
    is_admin_account, is_staff_account, is_field_worker, is_volunteer, is_business_account, \
    is_member_account, is_verified, is_blocked, \
    gender, profession, image, aadhar_number, pan_number, street, sub_district, district, \
    city, state, country, postal_code, referred_by, date_joined";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub user_id: String, // public member code
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2, not exposed in JSON
    pub name: String,
    pub dob: Option<Date>,

    pub is_admin_account: bool,
    pub is_staff_account: bool,
    pub is_field_worker: bool,
    pub is_volunteer: bool,
    pub is_business_account: bool,
    pub is_member_account: bool,
    pub is_verified: bool,
    pub is_blocked: bool,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: Profile,

    pub referred_by: Option<Uuid>,
    pub date_joined: OffsetDateTime,
}

/// Extended member profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub gender: Option<String>,
    pub profession: Option<String>,
    pub image: Option<String>,
    pub aadhar_number: Option<String>,
    pub pan_number: Option<String>,
    pub street: Option<String>,
    pub sub_district: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// Everything needed to insert a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub phone: Option<String>,
    pub user_id: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub name: String,
    pub dob: Option<Date>,
    pub is_member_account: bool,
    pub profile: Profile,
    pub referred_by: Option<Uuid>,
}

/// Partial update of the caller's own profile; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub dob: Option<Date>,
    pub password_hash: Option<String>,
    pub profile: Profile,
}

/// Alternate login keys, in the order a login attempt tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Phone,
    UserId,
    Username,
}

impl LoginField {
    pub const FALLBACK_ORDER: [LoginField; 4] = [
        LoginField::Email,
        LoginField::Phone,
        LoginField::UserId,
        LoginField::Username,
    ];

    pub fn column(self) -> &'static str {
        match self {
            LoginField::Email => "email",
            LoginField::Phone => "phone",
            LoginField::UserId => "user_id",
            LoginField::Username => "username",
        }
    }

    /// Value of this key on `user`, if set.
    #[cfg(test)]
    pub fn value_of(self, user: &User) -> Option<&str> {
        match self {
            LoginField::Email => Some(user.email.as_str()),
            LoginField::Phone => user.phone.as_deref(),
            LoginField::UserId => Some(user.user_id.as_str()),
            LoginField::Username => user.username.as_deref(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user_fixture(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            phone: None,
            user_id: "M00000001".into(),
            username: None,
            password_hash: String::new(),
            name: "Test User".into(),
            dob: None,
            is_admin_account: false,
            is_staff_account: false,
            is_field_worker: false,
            is_volunteer: false,
            is_business_account: false,
            is_member_account: false,
            is_verified: false,
            is_blocked: false,
            profile: Profile::default(),
            referred_by: None,
            date_joined: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut user = user_fixture("a@example.com");
        user.password_hash = "$argon2id$secret".into();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@example.com");
        // profile fields sit at the top level
        assert!(json.get("profile").is_none());
        assert!(json.as_object().unwrap().contains_key("postal_code"));
    }

    #[test]
    fn login_fields_map_to_columns() {
        let cols: Vec<_> = LoginField::FALLBACK_ORDER.iter().map(|f| f.column()).collect();
        assert_eq!(cols, ["email", "phone", "user_id", "username"]);
        for col in cols {
            assert!(USER_COLUMNS.contains(col));
        }
    }
}
