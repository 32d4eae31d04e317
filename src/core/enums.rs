// src/core/enums.rs

use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// 用户角色枚举
/// 同时支持：
/// 1. 数据库映射 (SeaORM) - 存为字符串 "admin" / "staff" / "user"
/// 2. JSON 序列化 (Serde) - 前端交互
/// 3. 字符串转换 (Strum) - JWT claims 中的角色字段
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "staff")]
    Staff,

    #[sea_orm(string_value = "user")]
    User,
}

impl UserRole {
    /// Admin 与 Staff 统称“运营人员”，可以修改站点内容。
    pub fn is_operator(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }
}

/// 图书分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum BookCategory {
    #[sea_orm(string_value = "Novel")]
    Novel,
    #[sea_orm(string_value = "Children")]
    Children,
    #[sea_orm(string_value = "Academic")]
    Academic,
    #[sea_orm(string_value = "Islamic")]
    Islamic,
    #[sea_orm(string_value = "Fiction")]
    Fiction,
    #[serde(rename = "Non-Fiction")]
    #[sea_orm(string_value = "Non-Fiction")]
    NonFiction,
    #[serde(rename = "General Knowledge")]
    #[sea_orm(string_value = "General Knowledge")]
    GeneralKnowledge,
    #[serde(rename = "Science Fiction")]
    #[sea_orm(string_value = "Science Fiction")]
    ScienceFiction,
    #[serde(rename = "Self Help")]
    #[sea_orm(string_value = "Self Help")]
    SelfHelp,
    #[sea_orm(string_value = "History")]
    History,
    #[sea_orm(string_value = "Poetry")]
    Poetry,
    #[sea_orm(string_value = "Biography")]
    Biography,
    #[default]
    #[sea_orm(string_value = "Other")]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_claim_strings() {
        assert_eq!(UserRole::Staff.to_string(), "staff");
        assert_eq!(UserRole::from_str("ADMIN").ok(), Some(UserRole::Admin));
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn book_category_uses_display_names_in_json() {
        let json = serde_json::to_string(&BookCategory::ScienceFiction).unwrap();
        assert_eq!(json, "\"Science Fiction\"");
        let parsed: BookCategory = serde_json::from_str("\"Non-Fiction\"").unwrap();
        assert_eq!(parsed, BookCategory::NonFiction);
    }
}
