use sea_orm::entity::prelude::*;

use crate::core::enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub village_street: Option<String>,
    pub upazilla: Option<String>,
    pub district: Option<String>,
    pub division: Option<String>,
    pub country: Option<String>,
    pub mobile_number: Option<String>,
    pub profile_picture: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_approved_staff: bool,
    pub is_staff_applicant: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    /// 仅在邮箱验证完成之前非空，验证成功后清除
    #[sea_orm(unique)]
    pub email_verification_token: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::blog_posts::Entity")]
    BlogPosts,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Related<super::blog_posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlogPosts.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// "名 姓"，两者都有时才返回
    pub fn full_name(&self) -> Option<String> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            None
        } else {
            Some(format!("{} {}", self.first_name, self.last_name))
        }
    }
}
