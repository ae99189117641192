use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{DistrictPayload, DistrictQuery, StatePayload},
    repo_types::{self, District},
};
use crate::{
    auth::{extractors::Authorized, permissions::IsAdminOrIsStaff},
    error::{AppError, AppResult},
    pagination::Pagination,
    state::AppState,
};

pub fn adminpanel_routes() -> Router<AppState> {
    Router::new()
        .route("/states/", get(list_states))
        .route("/states/create/", post(create_state))
        .route("/districts/", get(list_districts))
        .route("/districts/create/", post(create_district))
}

#[instrument(skip(state))]
pub async fn list_states(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<repo_types::State>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(repo_types::State::list(&state.db, limit, offset).await?))
}

#[instrument(skip_all)]
pub async fn create_state(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<IsAdminOrIsStaff>,
    Json(payload): Json<StatePayload>,
) -> AppResult<(StatusCode, Json<repo_types::State>)> {
    let new = payload.validate()?;
    if repo_types::State::name_taken(&state.db, &new.name).await? {
        return Err(AppError::field("name", "state with this name already exists."));
    }
    let row = repo_types::State::insert(&state.db, &new).await?;
    info!(state_id = row.id, created_by = %staff.id, "state created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn list_districts(
    State(state): State<AppState>,
    Query(filter): Query<DistrictQuery>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<District>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(District::list(&state.db, filter.state, limit, offset).await?))
}

#[instrument(skip_all)]
pub async fn create_district(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<IsAdminOrIsStaff>,
    Json(payload): Json<DistrictPayload>,
) -> AppResult<(StatusCode, Json<District>)> {
    let new = payload.validate()?;
    if repo_types::State::find(&state.db, new.state).await?.is_none() {
        return Err(AppError::field(
            "state",
            format!("Invalid pk \"{}\" - object does not exist.", new.state),
        ));
    }
    if District::name_taken(&state.db, new.state, &new.name).await? {
        return Err(AppError::field(
            "name",
            "district with this name already exists in the state.",
        ));
    }
    let row = District::insert(&state.db, &new).await?;
    info!(district_id = row.id, state_id = row.state, created_by = %staff.id, "district created");
    Ok((StatusCode::CREATED, Json(row)))
}
