//! 站点内容：公告、成员、轮播图、联系表单。

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::error::AppError,
    dtos::{
        content::{
            CreateCarouselRequest, CreateContactRequest, CreateMemberRequest, CreateNoticeRequest,
            NoticeQuery, UpdateCarouselRequest, UpdateMemberRequest, UpdateNoticeRequest,
        },
        search_term,
    },
    entity::{carousel_items, contact_messages, members, notices},
    services::email::notification_recipients,
    state::AppState,
    utils::search::icontains,
};

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

// ---------- 公告 ----------

pub async fn list_notices(db: &DatabaseConnection, query: NoticeQuery) -> Result<Vec<notices::Model>, AppError> {
    let mut select = notices::Entity::find();

    if let Some(term) = search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains(notices::Column::Title, term))
                .add(icontains(notices::Column::Content, term)),
        );
    }

    // 空字符串与 NULL 都算没有附件
    match query.has_attachment.as_deref() {
        Some("yes") => {
            select = select
                .filter(notices::Column::Attachment.is_not_null())
                .filter(notices::Column::Attachment.ne(""));
        }
        Some("no") => {
            select = select.filter(
                Condition::any()
                    .add(notices::Column::Attachment.is_null())
                    .add(notices::Column::Attachment.eq("")),
            );
        }
        _ => {}
    }

    Ok(select.order_by_desc(notices::Column::CreatedAt).all(db).await?)
}

pub async fn get_notice(db: &DatabaseConnection, id: Uuid) -> Result<notices::Model, AppError> {
    notices::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("Notice"))
}

pub async fn create_notice(db: &DatabaseConnection, req: CreateNoticeRequest) -> Result<notices::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let notice = notices::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(req.title),
        content: Set(req.content),
        attachment: Set(req.attachment),
        is_active: Set(req.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    tracing::info!("📢 Notice published: {}", notice.title);
    Ok(notice)
}

pub async fn update_notice(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateNoticeRequest,
) -> Result<notices::Model, AppError> {
    let mut model: notices::ActiveModel = get_notice(db, id).await?.into();
    if let Some(v) = req.title {
        model.title = Set(v);
    }
    if let Some(v) = req.content {
        model.content = Set(v);
    }
    if let Some(v) = req.attachment {
        model.attachment = Set(Some(v));
    }
    if let Some(v) = req.is_active {
        model.is_active = Set(v);
    }
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(db).await?)
}

pub async fn delete_notice(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let result = notices::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(not_found("Notice"));
    }
    Ok(())
}

// ---------- 成员 ----------

pub async fn list_members(db: &DatabaseConnection, search: Option<String>) -> Result<Vec<members::Model>, AppError> {
    let mut select = members::Entity::find();
    if let Some(term) = search_term(&search) {
        select = select.filter(
            Condition::any()
                .add(icontains(members::Column::Name, term))
                .add(icontains(members::Column::Email, term))
                .add(icontains(members::Column::ContactNumber, term)),
        );
    }
    Ok(select
        .order_by_asc(members::Column::DisplayOrder)
        .order_by_asc(members::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_member(db: &DatabaseConnection, id: Uuid) -> Result<members::Model, AppError> {
    members::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("Member"))
}

pub async fn create_member(db: &DatabaseConnection, req: CreateMemberRequest) -> Result<members::Model, AppError> {
    let member = members::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        designation: Set(req.designation),
        bio: Set(req.bio),
        image: Set(req.image),
        contact_number: Set(req.contact_number),
        email: Set(req.email),
        display_order: Set(req.display_order),
    }
    .insert(db)
    .await?;
    Ok(member)
}

pub async fn update_member(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateMemberRequest,
) -> Result<members::Model, AppError> {
    let mut model: members::ActiveModel = get_member(db, id).await?.into();
    if let Some(v) = req.name {
        model.name = Set(v);
    }
    if let Some(v) = req.designation {
        model.designation = Set(v);
    }
    if let Some(v) = req.bio {
        model.bio = Set(v);
    }
    if let Some(v) = req.image {
        model.image = Set(Some(v));
    }
    if let Some(v) = req.contact_number {
        model.contact_number = Set(v);
    }
    if let Some(v) = req.email {
        model.email = Set(v);
    }
    if let Some(v) = req.display_order {
        model.display_order = Set(v);
    }
    Ok(model.update(db).await?)
}

pub async fn delete_member(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let result = members::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(not_found("Member"));
    }
    Ok(())
}

// ---------- 轮播图 ----------

pub async fn list_carousel(db: &DatabaseConnection) -> Result<Vec<carousel_items::Model>, AppError> {
    Ok(carousel_items::Entity::find()
        .order_by_asc(carousel_items::Column::DisplayOrder)
        .all(db)
        .await?)
}

pub async fn get_carousel_item(db: &DatabaseConnection, id: Uuid) -> Result<carousel_items::Model, AppError> {
    carousel_items::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("Carousel item"))
}

pub async fn create_carousel_item(
    db: &DatabaseConnection,
    req: CreateCarouselRequest,
) -> Result<carousel_items::Model, AppError> {
    let item = carousel_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(req.title),
        image: Set(req.image),
        caption: Set(req.caption),
        is_active: Set(req.is_active),
        display_order: Set(req.display_order),
    }
    .insert(db)
    .await?;
    Ok(item)
}

pub async fn update_carousel_item(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateCarouselRequest,
) -> Result<carousel_items::Model, AppError> {
    let mut model: carousel_items::ActiveModel = get_carousel_item(db, id).await?.into();
    if let Some(v) = req.title {
        model.title = Set(v);
    }
    if let Some(v) = req.image {
        model.image = Set(v);
    }
    if let Some(v) = req.caption {
        model.caption = Set(v);
    }
    if let Some(v) = req.is_active {
        model.is_active = Set(v);
    }
    if let Some(v) = req.display_order {
        model.display_order = Set(v);
    }
    Ok(model.update(db).await?)
}

pub async fn delete_carousel_item(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let result = carousel_items::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(not_found("Carousel item"));
    }
    Ok(())
}

// ---------- 联系表单 ----------

pub async fn create_contact(
    db: &DatabaseConnection,
    req: CreateContactRequest,
) -> Result<contact_messages::Model, AppError> {
    let message = contact_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        email: Set(req.email.trim().to_string()),
        subject: Set(req.subject),
        message: Set(req.message),
        is_read: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;
    Ok(message)
}

/// 公开提交（人机校验已由处理器完成）：落库后异步通知所有已验证的 Admin / Staff。
/// 通知失败只记日志，不影响提交结果。
pub async fn submit_contact(
    state: &AppState,
    req: CreateContactRequest,
) -> Result<contact_messages::Model, AppError> {
    let message = create_contact(&state.db, req).await?;
    tracing::info!("✉️ Contact message from {} <{}>", message.name, message.email);

    match notification_recipients(&state.db).await {
        Ok(recipients) => state.email.spawn_send(state.email.contact_notification(
            recipients,
            &message.name,
            &message.email,
            &message.subject,
            &message.message,
        )),
        Err(e) => tracing::warn!("⚠️ Could not load notification recipients: {}", e),
    }

    Ok(message)
}

pub async fn list_contacts(
    db: &DatabaseConnection,
    search: Option<String>,
) -> Result<Vec<contact_messages::Model>, AppError> {
    let mut select = contact_messages::Entity::find();
    if let Some(term) = search_term(&search) {
        select = select.filter(
            Condition::any()
                .add(icontains(contact_messages::Column::Name, term))
                .add(icontains(contact_messages::Column::Email, term))
                .add(icontains(contact_messages::Column::Subject, term)),
        );
    }
    Ok(select
        .order_by_desc(contact_messages::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn get_contact(db: &DatabaseConnection, id: Uuid) -> Result<contact_messages::Model, AppError> {
    contact_messages::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("Contact message"))
}

/// 留言只允许修改已读标记
pub async fn set_contact_read(
    db: &DatabaseConnection,
    id: Uuid,
    is_read: bool,
) -> Result<contact_messages::Model, AppError> {
    let mut model: contact_messages::ActiveModel = get_contact(db, id).await?.into();
    model.is_read = Set(is_read);
    Ok(model.update(db).await?)
}

pub async fn delete_contact(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let result = contact_messages::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(not_found("Contact message"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        core::enums::UserRole,
        testing::{recording_email, setup_db, test_state, RecordingTransport, UserSeed},
    };

    fn notice(title: &str, attachment: Option<&str>) -> CreateNoticeRequest {
        CreateNoticeRequest {
            title: title.to_string(),
            content: "Details inside".to_string(),
            attachment: attachment.map(str::to_string),
            is_active: true,
        }
    }

    fn member(name: &str, order: i32) -> CreateMemberRequest {
        CreateMemberRequest {
            name: name.to_string(),
            designation: "Volunteer".to_string(),
            bio: String::new(),
            image: None,
            contact_number: "01712345678".to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
            display_order: order,
        }
    }

    fn contact(name: &str, subject: &str) -> CreateContactRequest {
        CreateContactRequest {
            name: name.to_string(),
            email: "visitor@example.org".to_string(),
            subject: subject.to_string(),
            message: "Hello".to_string(),
            recaptcha_token: None,
        }
    }

    #[tokio::test]
    async fn attachment_filter_treats_blank_as_missing() {
        let db = setup_db().await;
        create_notice(&db, notice("Exam routine", Some("notices/routine.pdf"))).await.unwrap();
        create_notice(&db, notice("Holiday", None)).await.unwrap();
        create_notice(&db, notice("Meeting", Some(""))).await.unwrap();

        let with = list_notices(&db, NoticeQuery { has_attachment: Some("yes".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].title, "Exam routine");

        let without = list_notices(&db, NoticeQuery { has_attachment: Some("no".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(without.len(), 2);

        let all = list_notices(&db, NoticeQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn notice_search_covers_title_and_content() {
        let db = setup_db().await;
        create_notice(&db, notice("Exam routine", None)).await.unwrap();
        let found = list_notices(&db, NoticeQuery { search: Some("DETAILS".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let none = list_notices(&db, NoticeQuery { search: Some("sports".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn members_are_sorted_by_order() {
        let db = setup_db().await;
        create_member(&db, member("Karim", 2)).await.unwrap();
        create_member(&db, member("Amina", 1)).await.unwrap();

        let names: Vec<String> = list_members(&db, None).await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Amina", "Karim"]);

        let found = list_members(&db, Some("karim@".into())).await.unwrap();
        assert_eq!(found.len(), 1);

        let moved = update_member(
            &db,
            found[0].id,
            UpdateMemberRequest { display_order: Some(0), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(moved.display_order, 0);
        assert_eq!(list_members(&db, None).await.unwrap()[0].name, "Karim");
    }

    #[tokio::test]
    async fn carousel_crud() {
        let db = setup_db().await;
        let item = create_carousel_item(
            &db,
            CreateCarouselRequest {
                title: "Welcome".into(),
                image: "carousel/1.jpg".into(),
                caption: String::new(),
                is_active: true,
                display_order: 1,
            },
        )
        .await
        .unwrap();
        let updated = update_carousel_item(
            &db,
            item.id,
            UpdateCarouselRequest { is_active: Some(false), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(!updated.is_active);
        delete_carousel_item(&db, item.id).await.unwrap();
        assert!(matches!(delete_carousel_item(&db, item.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn contact_messages_start_unread_and_toggle() {
        let db = setup_db().await;
        let msg = create_contact(&db, contact("Rahim", "Volunteering")).await.unwrap();
        assert!(!msg.is_read);

        let read = set_contact_read(&db, msg.id, true).await.unwrap();
        assert!(read.is_read);
        assert_eq!(read.subject, "Volunteering");

        assert_eq!(list_contacts(&db, Some("volunteer".into())).await.unwrap().len(), 1);
        assert!(list_contacts(&db, Some("donation".into())).await.unwrap().is_empty());

        delete_contact(&db, msg.id).await.unwrap();
        assert!(matches!(get_contact(&db, msg.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn notifications_go_to_verified_operators_only() {
        let db = setup_db().await;
        UserSeed::new("admin@example.org", UserRole::Admin).insert(&db).await;
        UserSeed::new("staff@example.org", UserRole::Staff).pending().insert(&db).await;
        UserSeed::new("new-staff@example.org", UserRole::Staff).unverified().insert(&db).await;
        UserSeed::new("reader@example.org", UserRole::User).insert(&db).await;

        let recipients = notification_recipients(&db).await.unwrap();
        assert_eq!(recipients, vec!["admin@example.org", "staff@example.org"]);
    }

    #[tokio::test]
    async fn submitted_message_is_stored_and_operators_are_notified() {
        let db = setup_db().await;
        UserSeed::new("admin@example.org", UserRole::Admin).insert(&db).await;
        UserSeed::new("staff@example.org", UserRole::Staff).insert(&db).await;
        UserSeed::new("reader@example.org", UserRole::User).insert(&db).await;

        let transport = Arc::new(RecordingTransport::default());
        let state = test_state(db, recording_email(true, transport.clone()));

        let message = submit_contact(&state, contact("Rahim", "Book donation")).await.unwrap();
        assert!(!message.is_read);
        assert_eq!(get_contact(&state.db, message.id).await.unwrap().subject, "Book donation");

        let sent = transport.wait_for(1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["admin@example.org", "staff@example.org"]);
        assert_eq!(sent[0].subject, "New contact message: Book donation");
    }

    #[tokio::test]
    async fn failed_notification_does_not_fail_the_submission() {
        let db = setup_db().await;
        UserSeed::new("admin@example.org", UserRole::Admin).insert(&db).await;

        let transport = Arc::new(RecordingTransport { fail: true, ..Default::default() });
        let state = test_state(db, recording_email(true, transport.clone()));

        let message = submit_contact(&state, contact("Karim", "Volunteering")).await.unwrap();
        assert_eq!(transport.wait_for(1).await.len(), 1);
        assert_eq!(list_contacts(&state.db, None).await.unwrap()[0].id, message.id);
    }
}
