use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::{constants::RECAPTCHA_ACTION_CONTACT, error::AppError},
    dtos::{
        content::{
            CreateCarouselRequest, CreateContactRequest, CreateMemberRequest, CreateNoticeRequest,
            NoticeQuery, UpdateCarouselRequest, UpdateContactRequest, UpdateMemberRequest,
            UpdateNoticeRequest,
        },
        response::Res,
        SearchQuery,
    },
    rate_limit,
    services::content as ContentService,
    state::AppState,
};

// ---------- 公告 ----------

pub async fn list_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::list_notices(&state.db, query).await?))
}

pub async fn get_notice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::get_notice(&state.db, id).await?))
}

pub async fn create_notice(
    State(state): State<AppState>,
    Json(payload): Json<CreateNoticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(ContentService::create_notice(&state.db, payload).await?))
}

pub async fn update_notice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(ContentService::update_notice(&state.db, id, payload).await?))
}

pub async fn delete_notice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ContentService::delete_notice(&state.db, id).await?;
    Ok(Res::deleted())
}

// ---------- 成员 ----------

pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::list_members(&state.db, query.search).await?))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::get_member(&state.db, id).await?))
}

pub async fn create_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(ContentService::create_member(&state.db, payload).await?))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(ContentService::update_member(&state.db, id, payload).await?))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ContentService::delete_member(&state.db, id).await?;
    Ok(Res::deleted())
}

// ---------- 轮播图 ----------

pub async fn list_carousel(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::list_carousel(&state.db).await?))
}

pub async fn get_carousel_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::get_carousel_item(&state.db, id).await?))
}

pub async fn create_carousel_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateCarouselRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::created(ContentService::create_carousel_item(&state.db, payload).await?))
}

pub async fn update_carousel_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarouselRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(ContentService::update_carousel_item(&state.db, id, payload).await?))
}

pub async fn delete_carousel_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ContentService::delete_carousel_item(&state.db, id).await?;
    Ok(Res::deleted())
}

// ---------- 联系表单 ----------

/// 公开提交。先过人机校验（action = `contact`），再按发件邮箱限流：每60秒最多5条。
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    state
        .recaptcha
        .require(payload.recaptcha_token.as_deref(), RECAPTCHA_ACTION_CONTACT)
        .await?;

    rate_limit!(&state.redis, "contact", &payload.email, 5, 60);

    Ok(Res::created(ContentService::submit_contact(&state, payload).await?))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::list_contacts(&state.db, query.search).await?))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(ContentService::get_contact(&state.db, id).await?))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(
        ContentService::set_contact_read(&state.db, id, payload.is_read).await?,
    ))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ContentService::delete_contact(&state.db, id).await?;
    Ok(Res::deleted())
}
