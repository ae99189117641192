use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    filters::{
        designations_query, levels_query, volunteers_query, wings_query, DesignationFilter,
        LevelFilter, VolunteerFilter, WingFilter,
    },
    repo_types::{
        Designation, Level, NewDesignation, NewLevel, NewVolunteer, NewWing, Volunteer, Wing,
    },
};

const VOLUNTEER_COLUMNS: &str = "id, account_id, wing_id, level_id, designation_id, \
    phone_number, joined_date, is_active";

impl Wing {
    pub async fn list(
        db: &PgPool,
        f: WingFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Wing>> {
        let rows = wings_query(f, limit, offset)
            .build_query_as::<Wing>()
            .fetch_all(db)
            .await
            .context("list wings")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Wing>> {
        let row = sqlx::query_as::<_, Wing>("SELECT id, name, description FROM wings WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find wing")?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: &NewWing) -> anyhow::Result<Wing> {
        let row = sqlx::query_as::<_, Wing>(
            "INSERT INTO wings (name, description) VALUES ($1, $2) \
             RETURNING id, name, description",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(db)
        .await
        .context("insert wing")?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: i64, new: &NewWing) -> anyhow::Result<Option<Wing>> {
        let row = sqlx::query_as::<_, Wing>(
            "UPDATE wings SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_optional(db)
        .await
        .context("update wing")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM wings WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete wing")?;
        Ok(res.rows_affected() > 0)
    }
}

impl Level {
    pub async fn list(
        db: &PgPool,
        f: LevelFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Level>> {
        let rows = levels_query(f, limit, offset)
            .build_query_as::<Level>()
            .fetch_all(db)
            .await
            .context("list levels")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Level>> {
        let row = sqlx::query_as::<_, Level>(
            "SELECT id, wing_id, name, description FROM levels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find level")?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: &NewLevel) -> anyhow::Result<Level> {
        let row = sqlx::query_as::<_, Level>(
            "INSERT INTO levels (wing_id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, wing_id, name, description",
        )
        .bind(new.wing)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(db)
        .await
        .context("insert level")?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: i64, new: &NewLevel) -> anyhow::Result<Option<Level>> {
        let row = sqlx::query_as::<_, Level>(
            "UPDATE levels SET wing_id = $2, name = $3, description = $4 WHERE id = $1 \
             RETURNING id, wing_id, name, description",
        )
        .bind(id)
        .bind(new.wing)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_optional(db)
        .await
        .context("update level")?;
        Ok(row)
    }

    /// Whether a volunteer holds this level under a wing other than `wing`.
    pub async fn held_outside_wing(db: &PgPool, id: i64, wing: i64) -> anyhow::Result<bool> {
        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM volunteers WHERE level_id = $1 AND wing_id <> $2)",
        )
        .bind(id)
        .bind(wing)
        .fetch_one(db)
        .await
        .context("check level usage")?;
        Ok(held)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM levels WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete level")?;
        Ok(res.rows_affected() > 0)
    }
}

impl Designation {
    pub async fn list(
        db: &PgPool,
        f: DesignationFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Designation>> {
        let rows = designations_query(f, limit, offset)
            .build_query_as::<Designation>()
            .fetch_all(db)
            .await
            .context("list designations")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Designation>> {
        let row = sqlx::query_as::<_, Designation>(
            "SELECT id, level_id, title, description FROM designations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find designation")?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: &NewDesignation) -> anyhow::Result<Designation> {
        let row = sqlx::query_as::<_, Designation>(
            "INSERT INTO designations (level_id, title, description) VALUES ($1, $2, $3) \
             RETURNING id, level_id, title, description",
        )
        .bind(new.level)
        .bind(&new.title)
        .bind(&new.description)
        .fetch_one(db)
        .await
        .context("insert designation")?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        new: &NewDesignation,
    ) -> anyhow::Result<Option<Designation>> {
        let row = sqlx::query_as::<_, Designation>(
            "UPDATE designations SET level_id = $2, title = $3, description = $4 WHERE id = $1 \
             RETURNING id, level_id, title, description",
        )
        .bind(id)
        .bind(new.level)
        .bind(&new.title)
        .bind(&new.description)
        .fetch_optional(db)
        .await
        .context("update designation")?;
        Ok(row)
    }

    /// Whether a volunteer holds this designation under a level other than `level`.
    pub async fn held_outside_level(db: &PgPool, id: i64, level: i64) -> anyhow::Result<bool> {
        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM volunteers WHERE designation_id = $1 AND level_id <> $2)",
        )
        .bind(id)
        .bind(level)
        .fetch_one(db)
        .await
        .context("check designation usage")?;
        Ok(held)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM designations WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete designation")?;
        Ok(res.rows_affected() > 0)
    }
}

/// Keeps `users.is_volunteer` in step with the volunteers table.
async fn sync_volunteer_flag(
    tx: &mut Transaction<'_, Postgres>,
    account: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE users SET is_volunteer = EXISTS (SELECT 1 FROM volunteers WHERE account_id = $1) \
         WHERE id = $1",
    )
    .bind(account)
    .execute(&mut **tx)
    .await
    .context("sync volunteer flag")?;
    Ok(())
}

impl Volunteer {
    pub async fn list(
        db: &PgPool,
        f: VolunteerFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Volunteer>> {
        let rows = volunteers_query(f, limit, offset)
            .build_query_as::<Volunteer>()
            .fetch_all(db)
            .await
            .context("list volunteers")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Volunteer>> {
        let row = sqlx::query_as::<_, Volunteer>(&format!(
            "SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find volunteer")?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: &NewVolunteer) -> anyhow::Result<Volunteer> {
        let mut tx = db.begin().await.context("begin tx")?;
        let row = sqlx::query_as::<_, Volunteer>(&format!(
            r#"
            INSERT INTO volunteers
                (account_id, wing_id, level_id, designation_id, phone_number, joined_date, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VOLUNTEER_COLUMNS}
            "#
        ))
        .bind(new.user)
        .bind(new.wing)
        .bind(new.level)
        .bind(new.designation)
        .bind(&new.phone_number)
        .bind(new.joined_date)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await
        .context("insert volunteer")?;
        sync_volunteer_flag(&mut tx, row.user).await?;
        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        previous_account: Uuid,
        new: &NewVolunteer,
    ) -> anyhow::Result<Option<Volunteer>> {
        let mut tx = db.begin().await.context("begin tx")?;
        let row = sqlx::query_as::<_, Volunteer>(&format!(
            r#"
            UPDATE volunteers
               SET account_id = $2, wing_id = $3, level_id = $4, designation_id = $5,
                   phone_number = $6, joined_date = $7, is_active = $8
             WHERE id = $1
            RETURNING {VOLUNTEER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new.user)
        .bind(new.wing)
        .bind(new.level)
        .bind(new.designation)
        .bind(&new.phone_number)
        .bind(new.joined_date)
        .bind(new.is_active)
        .fetch_optional(&mut *tx)
        .await
        .context("update volunteer")?;
        if let Some(v) = &row {
            sync_volunteer_flag(&mut tx, v.user).await?;
            if v.user != previous_account {
                sync_volunteer_flag(&mut tx, previous_account).await?;
            }
        }
        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let mut tx = db.begin().await.context("begin tx")?;
        let account: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM volunteers WHERE id = $1 RETURNING account_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("delete volunteer")?;
        if let Some(account) = account {
            sync_volunteer_flag(&mut tx, account).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(account.is_some())
    }
}
