use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{District, NewDistrict, NewState, State};

impl State {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<State>> {
        let rows = sqlx::query_as::<_, State>(
            "SELECT id, name, code FROM states ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list states")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<State>> {
        let row = sqlx::query_as::<_, State>("SELECT id, name, code FROM states WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find state")?;
        Ok(row)
    }

    pub async fn name_taken(db: &PgPool, name: &str) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM states WHERE LOWER(name) = LOWER($1))",
        )
        .bind(name)
        .fetch_one(db)
        .await
        .context("check state name")?;
        Ok(taken)
    }

    pub async fn insert(db: &PgPool, new: &NewState) -> anyhow::Result<State> {
        let row = sqlx::query_as::<_, State>(
            "INSERT INTO states (name, code) VALUES ($1, $2) RETURNING id, name, code",
        )
        .bind(&new.name)
        .bind(&new.code)
        .fetch_one(db)
        .await
        .context("insert state")?;
        Ok(row)
    }
}

impl District {
    /// `state` narrows the listing to one state's districts.
    pub async fn list(
        db: &PgPool,
        state: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<District>> {
        let rows = sqlx::query_as::<_, District>(
            r#"
            SELECT id, state_id, name
              FROM districts
             WHERE ($1::BIGINT IS NULL OR state_id = $1)
             ORDER BY name
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(state)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list districts")?;
        Ok(rows)
    }

    pub async fn name_taken(db: &PgPool, state: i64, name: &str) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM districts WHERE state_id = $1 AND LOWER(name) = LOWER($2))",
        )
        .bind(state)
        .bind(name)
        .fetch_one(db)
        .await
        .context("check district name")?;
        Ok(taken)
    }

    pub async fn insert(db: &PgPool, new: &NewDistrict) -> anyhow::Result<District> {
        let row = sqlx::query_as::<_, District>(
            "INSERT INTO districts (state_id, name) VALUES ($1, $2) RETURNING id, state_id, name",
        )
        .bind(new.state)
        .bind(&new.name)
        .fetch_one(db)
        .await
        .context("insert district")?;
        Ok(row)
    }
}
