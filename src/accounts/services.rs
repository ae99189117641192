use std::future::Future;

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::{
    dto::{JoinRequest, MemberUpdateRequest},
    repo_types::{LoginField, NewUser, Profile, ProfileUpdate, User},
};
use crate::{
    auth::password::{hash_password, verify_password},
    error::{AppError, AppResult, FieldErrors},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

/// Public member code: `M` followed by eight digits.
pub fn generate_member_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..100_000_000);
    format!("M{n:08}")
}

fn push(errors: &mut FieldErrors, field: &str, msg: &str) {
    errors.entry(field.to_string()).or_default().push(msg.to_string());
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Trims and lowercases keys, then checks field shapes.
pub fn normalize_join(mut req: JoinRequest) -> AppResult<JoinRequest> {
    req.email = req.email.trim().to_lowercase();
    req.name = req.name.trim().to_string();
    req.phone = blank_to_none(req.phone);
    req.user_id = blank_to_none(req.user_id);
    req.username = blank_to_none(req.username);
    req.referred_by = blank_to_none(req.referred_by);

    let mut errors = FieldErrors::new();
    if req.email.is_empty() {
        push(&mut errors, "email", "This field may not be blank.");
    } else if !is_valid_email(&req.email) {
        push(&mut errors, "email", "Enter a valid email address.");
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        push(
            &mut errors,
            "password",
            "Ensure this field has at least 8 characters.",
        );
    }
    if let Some(phone) = &req.phone {
        if !is_valid_phone(phone) {
            push(&mut errors, "phone", "Enter a valid phone number.");
        }
    }
    if errors.is_empty() {
        Ok(req)
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Tries each login key in [`LoginField::FALLBACK_ORDER`]; the first hit wins.
pub async fn find_by_any_login<F, Fut>(identifier: &str, mut lookup: F) -> anyhow::Result<Option<User>>
where
    F: FnMut(LoginField, String) -> Fut,
    Fut: Future<Output = anyhow::Result<Option<User>>>,
{
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }
    for field in LoginField::FALLBACK_ORDER {
        if let Some(user) = lookup(field, identifier.to_string()).await? {
            return Ok(Some(user));
        }
    }
    Ok(None)
}

/// Password step of a login attempt.
pub fn check_credentials(user: Option<User>, password: &str) -> AppResult<User> {
    let user = user.ok_or_else(|| AppError::BadRequest("User not found.".into()))?;
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::BadRequest("Incorrect password.".into()));
    }
    if user.is_blocked {
        warn!(user_id = %user.id, "login on blocked account");
        return Err(AppError::Unauthorized("User account is blocked.".into()));
    }
    Ok(user)
}

pub async fn authenticate(db: &PgPool, identifier: &str, password: &str) -> AppResult<User> {
    let user = find_by_any_login(identifier, |field, value| async move {
        User::find_by_login_field(db, field, &value).await
    })
    .await?;
    check_credentials(user, password)
}

async fn ensure_unique(
    db: &PgPool,
    errors: &mut FieldErrors,
    field: LoginField,
    value: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(v) = value {
        if User::find_by_login_field(db, field, v).await?.is_some() {
            let msg = format!("user with this {} already exists.", field.column());
            push(errors, field.column(), &msg);
        }
    }
    Ok(())
}

/// Validates, resolves the referrer and stores a new account.
pub async fn create_account(
    db: &PgPool,
    req: JoinRequest,
    profile: Profile,
    is_member_account: bool,
) -> AppResult<User> {
    let req = normalize_join(req)?;

    let mut errors = FieldErrors::new();
    ensure_unique(db, &mut errors, LoginField::Email, Some(&req.email)).await?;
    ensure_unique(db, &mut errors, LoginField::Phone, req.phone.as_deref()).await?;
    ensure_unique(db, &mut errors, LoginField::UserId, req.user_id.as_deref()).await?;
    ensure_unique(db, &mut errors, LoginField::Username, req.username.as_deref()).await?;

    let referred_by = match &req.referred_by {
        Some(code) => match User::find_by_login_field(db, LoginField::UserId, code).await? {
            Some(referrer) => Some(referrer.id),
            None => {
                push(&mut errors, "referred_by", "Invalid referral code.");
                None
            }
        },
        None => None,
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user_id = match req.user_id {
        Some(code) => code,
        None => unused_member_code(db).await?,
    };

    let new = NewUser {
        password_hash: hash_password(&req.password)?,
        email: req.email,
        phone: req.phone,
        user_id,
        username: req.username,
        name: req.name,
        dob: req.dob,
        is_member_account,
        profile,
        referred_by,
    };
    let user = User::create(db, &new).await?;
    info!(user_id = %user.id, code = %user.user_id, referred = user.referred_by.is_some(), "account created");
    Ok(user)
}

async fn unused_member_code(db: &PgPool) -> anyhow::Result<String> {
    loop {
        let code = generate_member_code();
        if User::find_by_login_field(db, LoginField::UserId, &code)
            .await?
            .is_none()
        {
            return Ok(code);
        }
    }
}

/// Applies a partial profile update for the caller.
pub async fn update_member(db: &PgPool, user: &User, req: MemberUpdateRequest) -> AppResult<User> {
    let mut errors = FieldErrors::new();
    let phone = blank_to_none(req.phone);
    let username = blank_to_none(req.username);

    if let Some(p) = &phone {
        if !is_valid_phone(p) {
            push(&mut errors, "phone", "Enter a valid phone number.");
        } else if user.phone.as_deref() != Some(p.as_str()) {
            ensure_unique(db, &mut errors, LoginField::Phone, Some(p)).await?;
        }
    }
    if let Some(u) = &username {
        if user.username.as_deref() != Some(u.as_str()) {
            ensure_unique(db, &mut errors, LoginField::Username, Some(u)).await?;
        }
    }
    if let Some(pw) = &req.password {
        if pw.len() < MIN_PASSWORD_LEN {
            push(
                &mut errors,
                "password",
                "Ensure this field has at least 8 characters.",
            );
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = match &req.password {
        Some(pw) => Some(hash_password(pw)?),
        None => None,
    };
    let upd = ProfileUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        phone,
        username,
        dob: req.dob,
        password_hash,
        profile: req.profile,
    };
    let updated = User::update_profile(db, user.id, &upd).await?;
    info!(user_id = %updated.id, "member profile updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::tests::user_fixture;

    fn join(email: &str, password: &str) -> JoinRequest {
        JoinRequest {
            email: email.into(),
            password: password.into(),
            name: " Asha ".into(),
            phone: None,
            dob: None,
            user_id: None,
            username: Some("  ".into()),
            referred_by: None,
        }
    }

    fn directory() -> Vec<User> {
        let hash = hash_password("right-password").unwrap();
        let mut a = user_fixture("asha@example.com");
        a.password_hash = hash.clone();
        a.phone = Some("9876543210".into());
        a.user_id = "M12345678".into();
        a.username = Some("asha".into());

        let mut b = user_fixture("ravi@example.com");
        b.password_hash = hash;
        b.user_id = "M87654321".into();
        // b's username collides with a's phone; email/phone are tried first
        b.username = Some("9876543210".into());
        vec![a, b]
    }

    async fn login_lookup(users: &[User], identifier: &str) -> Option<User> {
        find_by_any_login(identifier, |field, value| {
            let hit = users
                .iter()
                .find(|u| field.value_of(u) == Some(value.as_str()))
                .cloned();
            async move { Ok(hit) }
        })
        .await
        .unwrap()
    }

    #[test]
    fn email_and_phone_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+919876543210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765-43210"));
    }

    #[test]
    fn member_codes_have_fixed_shape() {
        for _ in 0..50 {
            let code = generate_member_code();
            assert_eq!(code.len(), 9);
            assert!(code.starts_with('M'));
            assert!(code[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn normalize_join_trims_and_lowercases() {
        let req = normalize_join(join("  Asha@Example.COM ", "longenough")).unwrap();
        assert_eq!(req.email, "asha@example.com");
        assert_eq!(req.name, "Asha");
        assert!(req.username.is_none());
    }

    #[test]
    fn normalize_join_collects_every_field_error() {
        let mut req = join("nope", "short");
        req.phone = Some("12".into());
        match normalize_join(req) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("password"));
                assert!(errors.contains_key("phone"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_resolves_each_identifier_kind() {
        let users = directory();
        for id in ["asha@example.com", "9876543210", "M12345678", "asha"] {
            let found = login_lookup(&users, id).await.expect("user should resolve");
            assert_eq!(found.email, "asha@example.com", "identifier {id}");
        }
        let ravi = login_lookup(&users, "M87654321").await.unwrap();
        assert_eq!(ravi.email, "ravi@example.com");
    }

    #[tokio::test]
    async fn earlier_field_wins_on_ambiguous_identifier() {
        let users = directory();
        let found = login_lookup(&users, "9876543210").await.unwrap();
        assert_eq!(found.email, "asha@example.com");
    }

    #[tokio::test]
    async fn lookup_stops_at_first_hit() {
        let users = directory();
        let mut tried = Vec::new();
        let found = find_by_any_login("M12345678", |field, value| {
            tried.push(field);
            let hit = users
                .iter()
                .find(|u| field.value_of(u) == Some(value.as_str()))
                .cloned();
            async move { Ok(hit) }
        })
        .await
        .unwrap();
        assert!(found.is_some());
        assert_eq!(tried, [LoginField::Email, LoginField::Phone, LoginField::UserId]);
    }

    #[tokio::test]
    async fn credentials_messages() {
        let users = directory();

        let unknown = login_lookup(&users, "ghost@example.com").await;
        match check_credentials(unknown, "right-password") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "User not found."),
            other => panic!("unexpected {other:?}"),
        }

        let asha = login_lookup(&users, "asha").await;
        match check_credentials(asha.clone(), "wrong-password") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Incorrect password."),
            other => panic!("unexpected {other:?}"),
        }

        let ok = check_credentials(asha, "right-password").unwrap();
        assert_eq!(ok.username.as_deref(), Some("asha"));
    }

    #[test]
    fn blocked_account_cannot_log_in() {
        let mut user = user_fixture("b@example.com");
        user.password_hash = hash_password("right-password").unwrap();
        user.is_blocked = true;
        let err = check_credentials(Some(user), "right-password").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
