pub use sea_orm_migration::prelude::*;

mod m20251229_063323_create_users;
mod m20260106_101500_create_library;
mod m20260106_102000_create_blog;
mod m20260106_102500_create_content;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251229_063323_create_users::Migration),
            Box::new(m20260106_101500_create_library::Migration),
            Box::new(m20260106_102000_create_blog::Migration),
            Box::new(m20260106_102500_create_content::Migration),
        ]
    }
}

/// 为带 `updated_at` 列的表挂载时间戳触发器（函数由 users 迁移创建）。
pub(crate) async fn attach_timestamp_trigger(
    manager: &SchemaManager<'_>,
    table: &str,
) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            "CREATE TRIGGER set_timestamp_{table}
             BEFORE UPDATE ON {table}
             FOR EACH ROW
             EXECUTE PROCEDURE update_timestamp();"
        ))
        .await?;
    Ok(())
}

pub(crate) async fn detach_timestamp_trigger(
    manager: &SchemaManager<'_>,
    table: &str,
) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            "DROP TRIGGER IF EXISTS set_timestamp_{table} ON {table};"
        ))
        .await?;
    Ok(())
}
