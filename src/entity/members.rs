use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub designation: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub image: Option<String>,
    pub contact_number: String,
    pub email: String,
    // `order` 是 SQL 关键字，库里叫 display_order
    #[serde(rename = "order")]
    pub display_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
