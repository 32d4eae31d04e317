use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::error::AppError,
    dtos::{
        auth::Claims,
        blog::{
            CommentQuery, CreateCommentRequest, CreatePostRequest, ReadCountResponse,
            UpdateCommentRequest, UpdatePostRequest,
        },
        response::Res,
        SearchQuery,
    },
    extractors::claims::current_user_id,
    services::blog as BlogService,
    state::AppState,
};

// ---------- 文章 ----------

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(BlogService::list_posts(&state.db, query.search).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(BlogService::get_post(&state.db, id).await?))
}

/// 作者取自当前令牌
pub async fn create_post(
    claims: Claims,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let post = BlogService::create_post(&state.db, current_user_id(&claims)?, payload).await?;
    Ok(Res::created(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Res::with_data(BlogService::update_post(&state.db, id, payload).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    BlogService::delete_post(&state.db, id).await?;
    Ok(Res::deleted())
}

/// 公开接口，匿名访问也会计数
pub async fn increment_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let read_count = BlogService::increment_read(&state.db, id).await?;
    Ok(Res::with_data(ReadCountResponse {
        status: "read count incremented",
        read_count,
    }))
}

// ---------- 评论 ----------

pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(BlogService::list_comments(&state.db, query.post).await?))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(BlogService::get_comment(&state.db, id).await?))
}

pub async fn create_comment(
    claims: Claims,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let comment = BlogService::create_comment(&state.db, current_user_id(&claims)?, payload).await?;
    Ok(Res::created(comment))
}

/// 只有评论作者或管理员可以修改
pub async fn update_comment(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let comment =
        BlogService::update_comment(&state.db, current_user_id(&claims)?, claims.role(), id, payload).await?;
    Ok(Res::with_data(comment))
}

pub async fn delete_comment(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    BlogService::delete_comment(&state.db, current_user_id(&claims)?, claims.role(), id).await?;
    Ok(Res::deleted())
}
