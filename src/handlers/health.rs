use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::error::AppError,
    dtos::{
        content::{CreateHealthCampRequest, HealthCampQuery, UpdateHealthCampRequest},
        response::Res,
    },
    services::health as HealthService,
    state::AppState,
};

/// `?time=upcoming|past` 以服务器当前时间为界
pub async fn list_camps(
    State(state): State<AppState>,
    Query(query): Query<HealthCampQuery>,
) -> Result<impl IntoResponse, AppError> {
    let camps = HealthService::list_camps(&state.db, query, Utc::now().fixed_offset()).await?;
    Ok(Res::with_data(camps))
}

pub async fn get_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(HealthService::get_camp(&state.db, id).await?))
}

pub async fn create_camp(
    State(state): State<AppState>,
    Json(payload): Json<CreateHealthCampRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(HealthService::create_camp(&state.db, payload).await?))
}

pub async fn update_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHealthCampRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(HealthService::update_camp(&state.db, id, payload).await?))
}

pub async fn delete_camp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    HealthService::delete_camp(&state.db, id).await?;
    Ok(Res::deleted())
}
