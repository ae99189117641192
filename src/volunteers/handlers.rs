use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::{Date, OffsetDateTime};
use tracing::{info, instrument};

use super::{
    dto::{DesignationPayload, LevelPayload, VolunteerPayload, WingPayload},
    filters::{DesignationFilter, LevelFilter, VolunteerFilter, WingFilter},
    repo_types::{Designation, Level, Volunteer, Wing},
    services::{check_designation_refs, check_level_refs, check_volunteer_refs},
};
use crate::{
    auth::{extractors::Authorized, permissions::IsAdminOrIsStaff},
    error::{AppError, AppResult},
    pagination::Pagination,
    state::AppState,
};

type Staff = Authorized<IsAdminOrIsStaff>;

pub fn volunteer_routes() -> Router<AppState> {
    Router::new()
        .route("/wings/", get(list_wings).post(create_wing))
        .route(
            "/wings/:id/",
            get(get_wing)
                .put(replace_wing)
                .patch(patch_wing)
                .delete(delete_wing),
        )
        .route("/levels/", get(list_levels).post(create_level))
        .route(
            "/levels/:id/",
            get(get_level)
                .put(replace_level)
                .patch(patch_level)
                .delete(delete_level),
        )
        .route("/designations/", get(list_designations).post(create_designation))
        .route(
            "/designations/:id/",
            get(get_designation)
                .put(replace_designation)
                .patch(patch_designation)
                .delete(delete_designation),
        )
        .route("/volunteers/", get(list_volunteers).post(create_volunteer))
        .route(
            "/volunteers/:id/",
            get(get_volunteer)
                .put(replace_volunteer)
                .patch(patch_volunteer)
                .delete(delete_volunteer),
        )
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn deleted(found: bool) -> AppResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found())
    }
}

// ---- wings ----

#[instrument(skip(state))]
pub async fn list_wings(
    State(state): State<AppState>,
    Query(filter): Query<WingFilter>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Wing>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(Wing::list(&state.db, filter, limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_wing(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Wing>> {
    let wing = Wing::find(&state.db, id).await?.ok_or_else(AppError::not_found)?;
    Ok(Json(wing))
}

#[instrument(skip_all)]
pub async fn create_wing(
    State(state): State<AppState>,
    _staff: Staff,
    Json(payload): Json<WingPayload>,
) -> AppResult<(StatusCode, Json<Wing>)> {
    let new = payload.merge(None)?;
    let wing = Wing::insert(&state.db, &new).await?;
    info!(wing_id = wing.id, "wing created");
    Ok((StatusCode::CREATED, Json(wing)))
}

async fn save_wing(state: &AppState, id: i64, payload: WingPayload, partial: bool) -> AppResult<Wing> {
    let current = Wing::find(&state.db, id).await?.ok_or_else(AppError::not_found)?;
    if !partial {
        payload.clone().merge(None)?;
    }
    let new = payload.merge(Some(&current))?;
    Wing::update(&state.db, id, &new)
        .await?
        .ok_or_else(AppError::not_found)
}

#[instrument(skip(state, _staff, payload))]
pub async fn replace_wing(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<WingPayload>,
) -> AppResult<Json<Wing>> {
    Ok(Json(save_wing(&state, id, payload, false).await?))
}

#[instrument(skip(state, _staff, payload))]
pub async fn patch_wing(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<WingPayload>,
) -> AppResult<Json<Wing>> {
    Ok(Json(save_wing(&state, id, payload, true).await?))
}

#[instrument(skip(state, _staff))]
pub async fn delete_wing(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(Wing::delete(&state.db, id).await?)
}

// ---- levels ----

#[instrument(skip(state))]
pub async fn list_levels(
    State(state): State<AppState>,
    Query(filter): Query<LevelFilter>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Level>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(Level::list(&state.db, filter, limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_level(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Level>> {
    let level = Level::find(&state.db, id).await?.ok_or_else(AppError::not_found)?;
    Ok(Json(level))
}

#[instrument(skip_all)]
pub async fn create_level(
    State(state): State<AppState>,
    _staff: Staff,
    Json(payload): Json<LevelPayload>,
) -> AppResult<(StatusCode, Json<Level>)> {
    let new = payload.merge(None)?;
    check_level_refs(&state.db, None, &new).await?;
    let level = Level::insert(&state.db, &new).await?;
    info!(level_id = level.id, wing_id = level.wing, "level created");
    Ok((StatusCode::CREATED, Json(level)))
}

async fn save_level(
    state: &AppState,
    id: i64,
    payload: LevelPayload,
    partial: bool,
) -> AppResult<Level> {
    let current = Level::find(&state.db, id).await?.ok_or_else(AppError::not_found)?;
    if !partial {
        payload.clone().merge(None)?;
    }
    let new = payload.merge(Some(&current))?;
    check_level_refs(&state.db, Some(id), &new).await?;
    Level::update(&state.db, id, &new)
        .await?
        .ok_or_else(AppError::not_found)
}

#[instrument(skip(state, _staff, payload))]
pub async fn replace_level(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<LevelPayload>,
) -> AppResult<Json<Level>> {
    Ok(Json(save_level(&state, id, payload, false).await?))
}

#[instrument(skip(state, _staff, payload))]
pub async fn patch_level(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<LevelPayload>,
) -> AppResult<Json<Level>> {
    Ok(Json(save_level(&state, id, payload, true).await?))
}

#[instrument(skip(state, _staff))]
pub async fn delete_level(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(Level::delete(&state.db, id).await?)
}

// ---- designations ----

#[instrument(skip(state))]
pub async fn list_designations(
    State(state): State<AppState>,
    Query(filter): Query<DesignationFilter>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Designation>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(Designation::list(&state.db, filter, limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_designation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Designation>> {
    let d = Designation::find(&state.db, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(d))
}

#[instrument(skip_all)]
pub async fn create_designation(
    State(state): State<AppState>,
    _staff: Staff,
    Json(payload): Json<DesignationPayload>,
) -> AppResult<(StatusCode, Json<Designation>)> {
    let new = payload.merge(None)?;
    check_designation_refs(&state.db, None, &new).await?;
    let d = Designation::insert(&state.db, &new).await?;
    info!(designation_id = d.id, level_id = d.level, "designation created");
    Ok((StatusCode::CREATED, Json(d)))
}

async fn save_designation(
    state: &AppState,
    id: i64,
    payload: DesignationPayload,
    partial: bool,
) -> AppResult<Designation> {
    let current = Designation::find(&state.db, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    if !partial {
        payload.clone().merge(None)?;
    }
    let new = payload.merge(Some(&current))?;
    check_designation_refs(&state.db, Some(id), &new).await?;
    Designation::update(&state.db, id, &new)
        .await?
        .ok_or_else(AppError::not_found)
}

#[instrument(skip(state, _staff, payload))]
pub async fn replace_designation(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<DesignationPayload>,
) -> AppResult<Json<Designation>> {
    Ok(Json(save_designation(&state, id, payload, false).await?))
}

#[instrument(skip(state, _staff, payload))]
pub async fn patch_designation(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<DesignationPayload>,
) -> AppResult<Json<Designation>> {
    Ok(Json(save_designation(&state, id, payload, true).await?))
}

#[instrument(skip(state, _staff))]
pub async fn delete_designation(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(Designation::delete(&state.db, id).await?)
}

// ---- volunteers ----

#[instrument(skip(state))]
pub async fn list_volunteers(
    State(state): State<AppState>,
    Query(filter): Query<VolunteerFilter>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Volunteer>>> {
    let (limit, offset) = page.normalize();
    Ok(Json(Volunteer::list(&state.db, filter, limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_volunteer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Volunteer>> {
    let v = Volunteer::find(&state.db, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(v))
}

/// Also marks the account as a volunteer.
#[instrument(skip_all)]
pub async fn create_volunteer(
    State(state): State<AppState>,
    _staff: Staff,
    Json(payload): Json<VolunteerPayload>,
) -> AppResult<(StatusCode, Json<Volunteer>)> {
    let new = payload.merge(None, today())?;
    check_volunteer_refs(&state.db, &new).await?;
    let v = Volunteer::insert(&state.db, &new).await?;
    info!(volunteer_id = v.id, user_id = %v.user, "volunteer created");
    Ok((StatusCode::CREATED, Json(v)))
}

async fn save_volunteer(
    state: &AppState,
    id: i64,
    payload: VolunteerPayload,
    partial: bool,
) -> AppResult<Volunteer> {
    let current = Volunteer::find(&state.db, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let today = today();
    if !partial {
        payload.clone().merge(None, today)?;
    }
    let new = payload.merge(Some(&current), today)?;
    check_volunteer_refs(&state.db, &new).await?;
    Volunteer::update(&state.db, id, current.user, &new)
        .await?
        .ok_or_else(AppError::not_found)
}

#[instrument(skip(state, _staff, payload))]
pub async fn replace_volunteer(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<VolunteerPayload>,
) -> AppResult<Json<Volunteer>> {
    Ok(Json(save_volunteer(&state, id, payload, false).await?))
}

#[instrument(skip(state, _staff, payload))]
pub async fn patch_volunteer(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
    Json(payload): Json<VolunteerPayload>,
) -> AppResult<Json<Volunteer>> {
    Ok(Json(save_volunteer(&state, id, payload, true).await?))
}

#[instrument(skip(state, _staff))]
pub async fn delete_volunteer(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(Volunteer::delete(&state.db, id).await?)
}
