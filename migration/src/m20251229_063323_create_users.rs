use sea_orm_migration::prelude::*;

use crate::{attach_timestamp_trigger, detach_timestamp_trigger};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. 创建用户表。邮箱是登录凭证，必须唯一。
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string_len(150).not_null().default(""))
                    .col(ColumnDef::new(Users::LastName).string_len(150).not_null().default(""))
                    // 地址拆分为多个字段，全部可空
                    .col(ColumnDef::new(Users::VillageStreet).string_len(255))
                    .col(ColumnDef::new(Users::Upazilla).string_len(100))
                    .col(ColumnDef::new(Users::District).string_len(100))
                    .col(ColumnDef::new(Users::Division).string_len(100))
                    .col(ColumnDef::new(Users::Country).string_len(100).default("Bangladesh"))
                    .col(ColumnDef::new(Users::MobileNumber).string_len(15))
                    .col(ColumnDef::new(Users::ProfilePicture).string())
                    .col(ColumnDef::new(Users::Role).string().not_null().default("user"))
                    .col(ColumnDef::new(Users::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsApprovedStaff).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsStaffApplicant).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsSuperuser).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::EmailVerificationToken).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. 时间戳函数，后续迁移中的表共用
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE OR REPLACE FUNCTION update_timestamp()
             RETURNS TRIGGER AS $$
             BEGIN
                 NEW.updated_at = NOW();
                 RETURN NEW;
             END;
             $$ language 'plpgsql';",
        )
        .await?;

        // 3. 触发器
        attach_timestamp_trigger(manager, "users").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：触发器 -> 函数 -> 表
        detach_timestamp_trigger(manager, "users").await?;
        manager
            .get_connection()
            .execute_unprepared("DROP FUNCTION IF EXISTS update_timestamp;")
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    VillageStreet,
    Upazilla,
    District,
    Division,
    Country,
    MobileNumber,
    ProfilePicture,
    Role,
    IsVerified,
    IsApprovedStaff,
    IsStaffApplicant,
    IsSuperuser,
    IsActive,
    EmailVerificationToken,
    CreatedAt,
    UpdatedAt,
}
