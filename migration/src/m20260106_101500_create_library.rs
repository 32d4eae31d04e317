use sea_orm_migration::prelude::*;

use crate::{attach_timestamp_trigger, detach_timestamp_trigger};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Books::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Books::BengaliTitle).string_len(255))
                    .col(ColumnDef::new(Books::Author).string_len(255).not_null())
                    .col(ColumnDef::new(Books::Category).string_len(50).not_null().default("Other"))
                    .col(ColumnDef::new(Books::SerialNumber).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Books::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Books::CoverImage).string())
                    .col(ColumnDef::new(Books::IsAvailable).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Books::Quantity)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(Books::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Books::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Books::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;
        attach_timestamp_trigger(manager, "books").await?;

        // 借阅记录：删除图书时级联删除
        manager
            .create_table(
                Table::create()
                    .table(BorrowedBooks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BorrowedBooks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BorrowedBooks::BookId).uuid().not_null())
                    .col(ColumnDef::new(BorrowedBooks::BorrowerName).string_len(255).not_null())
                    .col(ColumnDef::new(BorrowedBooks::BorrowDate).date().not_null())
                    .col(ColumnDef::new(BorrowedBooks::ReturnDate).date().not_null())
                    .col(ColumnDef::new(BorrowedBooks::IsReturned).boolean().not_null().default(false))
                    .col(ColumnDef::new(BorrowedBooks::ReturnedDate).date())
                    .col(
                        ColumnDef::new(BorrowedBooks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_borrowed_books_book")
                            .from(BorrowedBooks::Table, BorrowedBooks::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 可用性重算时按 (book_id, is_returned) 计数
        manager
            .create_index(
                Index::create()
                    .name("idx_borrowed_books_book_returned")
                    .table(BorrowedBooks::Table)
                    .col(BorrowedBooks::BookId)
                    .col(BorrowedBooks::IsReturned)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BorrowedBooks::Table).to_owned())
            .await?;
        detach_timestamp_trigger(manager, "books").await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Books {
    Table,
    Id,
    Title,
    BengaliTitle,
    Author,
    Category,
    SerialNumber,
    Description,
    CoverImage,
    IsAvailable,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BorrowedBooks {
    Table,
    Id,
    BookId,
    BorrowerName,
    BorrowDate,
    ReturnDate,
    IsReturned,
    ReturnedDate,
    CreatedAt,
}
