use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::error::AppError,
    dtos::{
        content::{CreateHealthCampRequest, HealthCampQuery, UpdateHealthCampRequest},
        search_term,
    },
    entity::health_camps,
    utils::search::icontains,
};

fn camp_not_found() -> AppError {
    AppError::NotFound("Health camp not found".to_string())
}

/// `time=upcoming` 取 `date_time > now`，`time=past` 取 `date_time <= now`，其它值忽略。
pub async fn list_camps(
    db: &DatabaseConnection,
    query: HealthCampQuery,
    now: DateTime<FixedOffset>,
) -> Result<Vec<health_camps::Model>, AppError> {
    let mut select = health_camps::Entity::find();

    if let Some(term) = search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains(health_camps::Column::Title, term))
                .add(icontains(health_camps::Column::Location, term))
                .add(icontains(health_camps::Column::DoctorName, term)),
        );
    }

    match query.time.as_deref() {
        Some("upcoming") => select = select.filter(health_camps::Column::DateTime.gt(now)),
        Some("past") => select = select.filter(health_camps::Column::DateTime.lte(now)),
        _ => {}
    }

    Ok(select
        .order_by_desc(health_camps::Column::DateTime)
        .all(db)
        .await?)
}

pub async fn get_camp(db: &DatabaseConnection, id: Uuid) -> Result<health_camps::Model, AppError> {
    health_camps::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(camp_not_found)
}

pub async fn create_camp(
    db: &DatabaseConnection,
    req: CreateHealthCampRequest,
) -> Result<health_camps::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let camp = health_camps::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(req.title),
        location: Set(req.location),
        date_time: Set(req.date_time),
        doctor_name: Set(req.doctor_name),
        description: Set(req.description),
        image: Set(req.image),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    tracing::info!("🩺 Health camp scheduled: {} at {}", camp.title, camp.date_time);
    Ok(camp)
}

pub async fn update_camp(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateHealthCampRequest,
) -> Result<health_camps::Model, AppError> {
    let mut model: health_camps::ActiveModel = get_camp(db, id).await?.into();
    if let Some(v) = req.title {
        model.title = Set(v);
    }
    if let Some(v) = req.location {
        model.location = Set(v);
    }
    if let Some(v) = req.date_time {
        model.date_time = Set(v);
    }
    if let Some(v) = req.doctor_name {
        model.doctor_name = Set(v);
    }
    if let Some(v) = req.description {
        model.description = Set(v);
    }
    if let Some(v) = req.image {
        model.image = Set(Some(v));
    }
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(db).await?)
}

pub async fn delete_camp(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let result = health_camps::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(camp_not_found());
    }
    Ok(())
}
