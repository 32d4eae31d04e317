use sea_orm::*;

use crate::{
    core::enums::UserRole,
    dtos::dashboard::DashboardStats,
    entity::{
        blog_posts, books, borrowed_books, contact_messages, health_camps, members, notices, users,
    },
};

/// 单项统计失败时记日志并返回 0，不影响其它项。
async fn count_or_zero<E>(db: &DatabaseConnection, label: &str, select: Select<E>) -> u64
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    match select.count(db).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!("⚠️ Dashboard count '{}' failed: {}", label, e);
            0
        }
    }
}

pub async fn stats(db: &DatabaseConnection) -> DashboardStats {
    let users_with = |role: UserRole| users::Entity::find().filter(users::Column::Role.eq(role));
    let loans_with = |returned: bool| {
        borrowed_books::Entity::find().filter(borrowed_books::Column::IsReturned.eq(returned))
    };

    DashboardStats {
        total_users: count_or_zero(db, "total_users", users::Entity::find()).await,
        admin_users: count_or_zero(db, "admin_users", users_with(UserRole::Admin)).await,
        staff_users: count_or_zero(db, "staff_users", users_with(UserRole::Staff)).await,
        regular_users: count_or_zero(db, "regular_users", users_with(UserRole::User)).await,
        total_books: count_or_zero(db, "total_books", books::Entity::find()).await,
        total_borrowed: count_or_zero(db, "total_borrowed", loans_with(false)).await,
        total_returned: count_or_zero(db, "total_returned", loans_with(true)).await,
        total_members: count_or_zero(db, "total_members", members::Entity::find()).await,
        total_notices: count_or_zero(db, "total_notices", notices::Entity::find()).await,
        total_messages: count_or_zero(db, "total_messages", contact_messages::Entity::find()).await,
        unread_messages: count_or_zero(
            db,
            "unread_messages",
            contact_messages::Entity::find().filter(contact_messages::Column::IsRead.eq(false)),
        )
        .await,
        total_health_camps: count_or_zero(db, "total_health_camps", health_camps::Entity::find()).await,
        total_posts: count_or_zero(db, "total_posts", blog_posts::Entity::find()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dtos::content::CreateContactRequest,
        services::content::{create_contact, set_contact_read},
        testing::{seed_book, setup_db, UserSeed},
    };
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    async fn seed_loan(db: &DatabaseConnection, book_id: Uuid, returned: bool) {
        let day = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        borrowed_books::ActiveModel {
            id: Set(Uuid::new_v4()),
            book_id: Set(book_id),
            borrower_name: Set("Sabina".into()),
            borrow_date: Set(day),
            return_date: Set(day),
            is_returned: Set(returned),
            returned_date: Set(returned.then_some(day)),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn counts_reflect_the_database() {
        let db = setup_db().await;
        UserSeed::new("admin@example.org", UserRole::Admin).insert(&db).await;
        UserSeed::new("staff@example.org", UserRole::Staff).insert(&db).await;
        UserSeed::new("a@example.org", UserRole::User).insert(&db).await;
        UserSeed::new("b@example.org", UserRole::User).unverified().insert(&db).await;

        let book = seed_book(&db, "LIB-1", 3).await;
        seed_loan(&db, book.id, false).await;
        seed_loan(&db, book.id, true).await;
        seed_loan(&db, book.id, true).await;

        let msg = create_contact(
            &db,
            CreateContactRequest {
                name: "Visitor".into(),
                email: "v@example.org".into(),
                subject: "Hi".into(),
                message: "Hello".into(),
                recaptcha_token: None,
            },
        )
        .await
        .unwrap();
        create_contact(
            &db,
            CreateContactRequest {
                name: "Visitor".into(),
                email: "v@example.org".into(),
                subject: "Again".into(),
                message: "Hello".into(),
                recaptcha_token: None,
            },
        )
        .await
        .unwrap();
        set_contact_read(&db, msg.id, true).await.unwrap();

        let stats = stats(&db).await;
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 4,
                admin_users: 1,
                staff_users: 1,
                regular_users: 2,
                total_books: 1,
                total_borrowed: 1,
                total_returned: 2,
                total_messages: 2,
                unread_messages: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn failing_counts_degrade_to_zero() {
        let db = setup_db().await;
        UserSeed::new("a@example.org", UserRole::User).insert(&db).await;
        db.execute_unprepared("DROP TABLE health_camps").await.unwrap();

        let stats = stats(&db).await;
        assert_eq!(stats.total_health_camps, 0);
        assert_eq!(stats.total_users, 1);
    }
}
