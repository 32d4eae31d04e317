use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::error::AppError,
    dtos::{
        library::{BookQuery, CreateBookRequest, CreateLoanRequest, LoanQuery, UpdateBookRequest, UpdateLoanRequest},
        response::Res,
    },
    services::library as LibraryService,
    state::AppState,
};

// ---------- 图书 ----------

pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(LibraryService::list_books(&state.db, query).await?))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(LibraryService::get_book(&state.db, id).await?))
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(LibraryService::create_book(&state.db, payload).await?))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(LibraryService::update_book(&state.db, id, payload).await?))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    LibraryService::delete_book(&state.db, id).await?;
    Ok(Res::deleted())
}

// ---------- 借阅 ----------

pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<LoanQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(LibraryService::list_loans(&state.db, query).await?))
}

pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(LibraryService::get_loan(&state.db, id).await?))
}

/// 所有副本都已借出时返回 409
pub async fn create_loan(
    State(state): State<AppState>,
    Json(payload): Json<CreateLoanRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(LibraryService::create_loan(&state.db, payload).await?))
}

pub async fn update_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLoanRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(LibraryService::update_loan(&state.db, id, payload).await?))
}

pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    LibraryService::delete_loan(&state.db, id).await?;
    Ok(Res::deleted())
}

/// 标记归还。重复归还返回 409。
pub async fn mark_returned(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(LibraryService::mark_returned(&state.db, id).await?))
}
