use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct State {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// Names are unique within a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct District {
    pub id: i64,
    #[sqlx(rename = "state_id")]
    pub state: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewState {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDistrict {
    pub state: i64,
    pub name: String,
}
