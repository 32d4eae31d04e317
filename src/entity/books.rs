use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::core::enums::BookCategory;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub bengali_title: Option<String>,
    pub author: String,
    pub category: BookCategory,
    #[sea_orm(unique)]
    pub serial_number: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub cover_image: Option<String>,
    /// 派生字段：未归还借阅数 < quantity。只由 `services::library` 写入。
    pub is_available: bool,
    pub quantity: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::borrowed_books::Entity")]
    BorrowedBooks,
}

impl Related<super::borrowed_books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BorrowedBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
