use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{LoginField, NewUser, ProfileUpdate, User, USER_COLUMNS};

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Exact lookup on one login key; email compares case-insensitively.
    pub async fn find_by_login_field(
        db: &PgPool,
        field: LoginField,
        value: &str,
    ) -> anyhow::Result<Option<User>> {
        let predicate = match field {
            LoginField::Email => "LOWER(email) = LOWER($1)".to_string(),
            other => format!("{} = $1", other.column()),
        };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {predicate}"
        ))
        .bind(value)
        .fetch_optional(db)
        .await
        .with_context(|| format!("find user by {}", field.column()))?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: &NewUser) -> anyhow::Result<User> {
        let p = &new.profile;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                email, phone, user_id, username, password_hash, name, dob, is_member_account,
                gender, profession, image, aadhar_number, pan_number, street, sub_district,
                district, city, state, country, postal_code, referred_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.user_id)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.dob)
        .bind(new.is_member_account)
        .bind(&p.gender)
        .bind(&p.profession)
        .bind(&p.image)
        .bind(&p.aadhar_number)
        .bind(&p.pan_number)
        .bind(&p.street)
        .bind(&p.sub_district)
        .bind(&p.district)
        .bind(&p.city)
        .bind(&p.state)
        .bind(&p.country)
        .bind(&p.postal_code)
        .bind(new.referred_by)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        upd: &ProfileUpdate,
    ) -> anyhow::Result<User> {
        let p = &upd.profile;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name          = COALESCE($2, name),
                phone         = COALESCE($3, phone),
                username      = COALESCE($4, username),
                dob           = COALESCE($5, dob),
                password_hash = COALESCE($6, password_hash),
                gender        = COALESCE($7, gender),
                profession    = COALESCE($8, profession),
                image         = COALESCE($9, image),
                aadhar_number = COALESCE($10, aadhar_number),
                pan_number    = COALESCE($11, pan_number),
                street        = COALESCE($12, street),
                sub_district  = COALESCE($13, sub_district),
                district      = COALESCE($14, district),
                city          = COALESCE($15, city),
                state         = COALESCE($16, state),
                country       = COALESCE($17, country),
                postal_code   = COALESCE($18, postal_code)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&upd.name)
        .bind(&upd.phone)
        .bind(&upd.username)
        .bind(upd.dob)
        .bind(&upd.password_hash)
        .bind(&p.gender)
        .bind(&p.profession)
        .bind(&p.image)
        .bind(&p.aadhar_number)
        .bind(&p.pan_number)
        .bind(&p.street)
        .bind(&p.sub_district)
        .bind(&p.district)
        .bind(&p.city)
        .bind(&p.state)
        .bind(&p.country)
        .bind(&p.postal_code)
        .fetch_one(db)
        .await
        .context("update user profile")?;
        Ok(user)
    }
}
