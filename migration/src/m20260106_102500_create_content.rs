use sea_orm_migration::prelude::*;

use crate::{attach_timestamp_trigger, detach_timestamp_trigger};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 公告
        manager
            .create_table(
                Table::create()
                    .table(Notices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Notices::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Notices::Content).text().not_null().default(""))
                    .col(ColumnDef::new(Notices::Attachment).string())
                    .col(ColumnDef::new(Notices::IsActive).boolean().not_null().default(true))
                    .col(created_at(Notices::CreatedAt))
                    .col(created_at(Notices::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        attach_timestamp_trigger(manager, "notices").await?;

        // 成员
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Members::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Members::Designation).string_len(255).not_null())
                    .col(ColumnDef::new(Members::Bio).text().not_null().default(""))
                    .col(ColumnDef::new(Members::Image).string())
                    .col(ColumnDef::new(Members::ContactNumber).string_len(20).not_null().default(""))
                    .col(ColumnDef::new(Members::Email).string().not_null().default(""))
                    .col(ColumnDef::new(Members::DisplayOrder).integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;

        // 首页轮播
        manager
            .create_table(
                Table::create()
                    .table(CarouselItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CarouselItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CarouselItems::Title).string_len(255).not_null().default(""))
                    .col(ColumnDef::new(CarouselItems::Image).string().not_null())
                    .col(ColumnDef::new(CarouselItems::Caption).text().not_null().default(""))
                    .col(ColumnDef::new(CarouselItems::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(CarouselItems::DisplayOrder).integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;

        // 联系表单
        manager
            .create_table(
                Table::create()
                    .table(ContactMessages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ContactMessages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ContactMessages::Name).string_len(255).not_null())
                    .col(ColumnDef::new(ContactMessages::Email).string().not_null())
                    .col(ColumnDef::new(ContactMessages::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(ContactMessages::Message).text().not_null())
                    .col(ColumnDef::new(ContactMessages::IsRead).boolean().not_null().default(false))
                    .col(created_at(ContactMessages::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // 义诊活动
        manager
            .create_table(
                Table::create()
                    .table(HealthCamps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HealthCamps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(HealthCamps::Title).string_len(255).not_null())
                    .col(ColumnDef::new(HealthCamps::Location).string_len(255).not_null())
                    .col(ColumnDef::new(HealthCamps::DateTime).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(HealthCamps::DoctorName).string_len(255).not_null())
                    .col(ColumnDef::new(HealthCamps::Description).text().not_null().default(""))
                    .col(ColumnDef::new(HealthCamps::Image).string())
                    .col(created_at(HealthCamps::CreatedAt))
                    .col(created_at(HealthCamps::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        attach_timestamp_trigger(manager, "health_camps").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        detach_timestamp_trigger(manager, "health_camps").await?;
        detach_timestamp_trigger(manager, "notices").await?;
        for table in [
            HealthCamps::Table.into_iden(),
            ContactMessages::Table.into_iden(),
            CarouselItems::Table.into_iden(),
            Members::Table.into_iden(),
            Notices::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Notices {
    Table,
    Id,
    Title,
    Content,
    Attachment,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    Name,
    Designation,
    Bio,
    Image,
    ContactNumber,
    Email,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum CarouselItems {
    Table,
    Id,
    Title,
    Image,
    Caption,
    IsActive,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum ContactMessages {
    Table,
    Id,
    Name,
    Email,
    Subject,
    Message,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HealthCamps {
    Table,
    Id,
    Title,
    Location,
    DateTime,
    DoctorName,
    Description,
    Image,
    CreatedAt,
    UpdatedAt,
}
