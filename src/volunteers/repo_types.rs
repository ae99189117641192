use serde::Serialize;
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Wing {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Second tier; belongs to a wing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Level {
    pub id: i64,
    #[sqlx(rename = "wing_id")]
    pub wing: i64,
    pub name: String,
    pub description: String,
}

/// Third tier; belongs to a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Designation {
    pub id: i64,
    #[sqlx(rename = "level_id")]
    pub level: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Volunteer {
    pub id: i64,
    #[sqlx(rename = "account_id")]
    pub user: Uuid,
    #[sqlx(rename = "wing_id")]
    pub wing: i64,
    #[sqlx(rename = "level_id")]
    pub level: i64,
    #[sqlx(rename = "designation_id")]
    pub designation: i64,
    pub phone_number: String,
    pub joined_date: Date,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWing {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLevel {
    pub wing: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDesignation {
    pub level: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVolunteer {
    pub user: Uuid,
    pub wing: i64,
    pub level: i64,
    pub designation: i64,
    pub phone_number: String,
    pub joined_date: Date,
    pub is_active: bool,
}
