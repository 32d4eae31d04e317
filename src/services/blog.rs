use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::{enums::UserRole, error::AppError, policy::can_modify_comment},
    dtos::{
        blog::{
            CommentResponse, CreateCommentRequest, CreatePostRequest, PostResponse,
            UpdateCommentRequest, UpdatePostRequest,
        },
        search_term,
    },
    entity::{blog_posts, comments, users},
    utils::search::icontains,
};

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}

/// 按文章分组的评论（新的在前），附带评论人
async fn comments_by_post(
    db: &DatabaseConnection,
    post_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<CommentResponse>>, AppError> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = comments::Entity::find()
        .find_also_related(users::Entity)
        .filter(comments::Column::PostId.is_in(post_ids))
        .order_by_desc(comments::Column::CreatedAt)
        .all(db)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    for (comment, user) in rows {
        grouped
            .entry(comment.post_id)
            .or_default()
            .push(CommentResponse::new(comment, user.as_ref()));
    }
    Ok(grouped)
}

async fn assemble(
    db: &DatabaseConnection,
    rows: Vec<(blog_posts::Model, Option<users::Model>)>,
) -> Result<Vec<PostResponse>, AppError> {
    let mut grouped = comments_by_post(db, rows.iter().map(|(p, _)| p.id).collect()).await?;
    Ok(rows
        .into_iter()
        .map(|(post, author)| {
            let comments = grouped.remove(&post.id).unwrap_or_default();
            PostResponse::new(post, author.as_ref(), comments)
        })
        .collect())
}

pub async fn list_posts(db: &DatabaseConnection, search: Option<String>) -> Result<Vec<PostResponse>, AppError> {
    let mut select = blog_posts::Entity::find().find_also_related(users::Entity);

    if let Some(term) = search_term(&search) {
        select = select.filter(
            Condition::any()
                .add(icontains((blog_posts::Entity, blog_posts::Column::Title), term))
                .add(icontains((blog_posts::Entity, blog_posts::Column::AuthorName), term))
                .add(icontains((users::Entity, users::Column::Email), term))
                .add(icontains((users::Entity, users::Column::FirstName), term))
                .add(icontains((users::Entity, users::Column::LastName), term)),
        );
    }

    let rows = select
        .order_by_desc(blog_posts::Column::CreatedAt)
        .all(db)
        .await?;
    assemble(db, rows).await
}

pub async fn get_post(db: &DatabaseConnection, id: Uuid) -> Result<PostResponse, AppError> {
    let row = blog_posts::Entity::find_by_id(id)
        .find_also_related(users::Entity)
        .one(db)
        .await?
        .ok_or_else(post_not_found)?;
    assemble(db, vec![row]).await?.pop().ok_or_else(post_not_found)
}

/// 作者为当前登录的运营人员
pub async fn create_post(
    db: &DatabaseConnection,
    author_id: Uuid,
    req: CreatePostRequest,
) -> Result<PostResponse, AppError> {
    let now = Utc::now().fixed_offset();
    let post = blog_posts::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(req.title),
        content: Set(req.content),
        author_id: Set(author_id),
        author_name: Set(req.author_name.trim().to_string()),
        image: Set(req.image),
        read_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!("📝 Post published: {}", post.title);
    get_post(db, post.id).await
}

pub async fn update_post(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdatePostRequest,
) -> Result<PostResponse, AppError> {
    let post = blog_posts::Entity::find_by_id(id).one(db).await?.ok_or_else(post_not_found)?;

    let mut model: blog_posts::ActiveModel = post.into();
    if let Some(v) = req.title {
        model.title = Set(v);
    }
    if let Some(v) = req.content {
        model.content = Set(v);
    }
    if let Some(v) = req.author_name {
        model.author_name = Set(v.trim().to_string());
    }
    if let Some(v) = req.image {
        model.image = Set(Some(v));
    }
    model.updated_at = Set(Utc::now().fixed_offset());
    model.update(db).await?;

    get_post(db, id).await
}

pub async fn delete_post(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;
    comments::Entity::delete_many()
        .filter(comments::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    let result = blog_posts::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(post_not_found());
    }
    txn.commit().await?;
    Ok(())
}

/// 阅读数 +1，数据库端原子自增，返回新值。
pub async fn increment_read(db: &DatabaseConnection, id: Uuid) -> Result<i32, AppError> {
    let result = blog_posts::Entity::update_many()
        .col_expr(
            blog_posts::Column::ReadCount,
            Expr::col(blog_posts::Column::ReadCount).add(1),
        )
        .filter(blog_posts::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(post_not_found());
    }

    let post = blog_posts::Entity::find_by_id(id).one(db).await?.ok_or_else(post_not_found)?;
    Ok(post.read_count)
}

// ---------- 评论 ----------

pub async fn list_comments(db: &DatabaseConnection, post: Option<Uuid>) -> Result<Vec<CommentResponse>, AppError> {
    let mut select = comments::Entity::find().find_also_related(users::Entity);
    if let Some(post_id) = post {
        select = select.filter(comments::Column::PostId.eq(post_id));
    }
    let rows = select.order_by_desc(comments::Column::CreatedAt).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(comment, user)| CommentResponse::new(comment, user.as_ref()))
        .collect())
}

pub async fn get_comment(db: &DatabaseConnection, id: Uuid) -> Result<CommentResponse, AppError> {
    let (comment, user) = comments::Entity::find_by_id(id)
        .find_also_related(users::Entity)
        .one(db)
        .await?
        .ok_or_else(comment_not_found)?;
    Ok(CommentResponse::new(comment, user.as_ref()))
}

pub async fn create_comment(
    db: &DatabaseConnection,
    user_id: Uuid,
    req: CreateCommentRequest,
) -> Result<CommentResponse, AppError> {
    if blog_posts::Entity::find_by_id(req.post).one(db).await?.is_none() {
        return Err(AppError::invalid("post", "Post does not exist."));
    }

    let comment = comments::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(req.post),
        user_id: Set(user_id),
        text: Set(req.text),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;

    get_comment(db, comment.id).await
}

async fn owned_comment(
    db: &DatabaseConnection,
    actor_id: Uuid,
    actor_role: UserRole,
    id: Uuid,
    action: &str,
) -> Result<comments::Model, AppError> {
    let comment = comments::Entity::find_by_id(id).one(db).await?.ok_or_else(comment_not_found)?;
    if !can_modify_comment(actor_id, actor_role, comment.user_id) {
        tracing::warn!("🚫 User {} tried to {} comment {}", actor_id, action, id);
        return Err(AppError::Forbidden(format!(
            "You do not have permission to {} this comment.",
            action
        )));
    }
    Ok(comment)
}

pub async fn update_comment(
    db: &DatabaseConnection,
    actor_id: Uuid,
    actor_role: UserRole,
    id: Uuid,
    req: UpdateCommentRequest,
) -> Result<CommentResponse, AppError> {
    let comment = owned_comment(db, actor_id, actor_role, id, "edit").await?;
    let mut model: comments::ActiveModel = comment.into();
    model.text = Set(req.text);
    model.update(db).await?;
    get_comment(db, id).await
}

pub async fn delete_comment(
    db: &DatabaseConnection,
    actor_id: Uuid,
    actor_role: UserRole,
    id: Uuid,
) -> Result<(), AppError> {
    let comment = owned_comment(db, actor_id, actor_role, id, "delete").await?;
    comments::Entity::delete_by_id(comment.id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{setup_db, UserSeed};

    fn post_req(title: &str, author_name: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "Body".to_string(),
            author_name: author_name.to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn display_author_falls_back_to_name_then_email() {
        let db = setup_db().await;
        let staff = UserSeed::new("writer@example.org", UserRole::Staff).insert(&db).await;

        let anonymous = create_post(&db, staff.id, post_req("Eid drive", "")).await.unwrap();
        assert_eq!(anonymous.author, "writer@example.org");
        assert_eq!(anonymous.display_author, "writer@example.org");

        let named = create_post(&db, staff.id, post_req("Flood relief", "Relief Team")).await.unwrap();
        assert_eq!(named.display_author, "Relief Team");

        let mut model: users::ActiveModel = staff.into();
        model.first_name = Set("Rafiq".into());
        model.last_name = Set("Islam".into());
        model.update(&db).await.unwrap();
        let reread = get_post(&db, anonymous.id).await.unwrap();
        assert_eq!(reread.display_author, "Rafiq Islam");
    }

    #[tokio::test]
    async fn read_count_increments_atomically() {
        let db = setup_db().await;
        let staff = UserSeed::new("writer@example.org", UserRole::Staff).insert(&db).await;
        let post = create_post(&db, staff.id, post_req("Camp", "")).await.unwrap();

        assert_eq!(increment_read(&db, post.id).await.unwrap(), 1);
        assert_eq!(increment_read(&db, post.id).await.unwrap(), 2);
        assert!(matches!(increment_read(&db, Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_matches_title_and_author_fields() {
        let db = setup_db().await;
        let staff = UserSeed::new("nadia@example.org", UserRole::Staff).insert(&db).await;
        create_post(&db, staff.id, post_req("Library week", "")).await.unwrap();
        create_post(&db, staff.id, post_req("Health camp", "Dr. Hasan")).await.unwrap();

        assert_eq!(list_posts(&db, Some("LIBRARY".into())).await.unwrap().len(), 1);
        assert_eq!(list_posts(&db, Some("hasan".into())).await.unwrap().len(), 1);
        assert_eq!(list_posts(&db, Some("nadia@".into())).await.unwrap().len(), 2);
        assert_eq!(list_posts(&db, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn comments_belong_to_their_author_or_an_admin() {
        let db = setup_db().await;
        let staff = UserSeed::new("writer@example.org", UserRole::Staff).insert(&db).await;
        let owner = UserSeed::new("owner@example.org", UserRole::User).insert(&db).await;
        let stranger = UserSeed::new("stranger@example.org", UserRole::User).insert(&db).await;
        let admin = UserSeed::new("admin@example.org", UserRole::Admin).insert(&db).await;
        let post = create_post(&db, staff.id, post_req("Camp", "")).await.unwrap();

        let comment = create_comment(
            &db,
            owner.id,
            CreateCommentRequest { post: post.id, text: "Thanks!".into() },
        )
        .await
        .unwrap();
        assert_eq!(comment.user.as_ref().map(|u| u.id), Some(owner.id));

        let edit = || UpdateCommentRequest { text: "Edited".into() };
        assert!(matches!(
            update_comment(&db, stranger.id, UserRole::User, comment.id, edit()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            update_comment(&db, staff.id, UserRole::Staff, comment.id, edit()).await,
            Err(AppError::Forbidden(_))
        ));
        let edited = update_comment(&db, owner.id, UserRole::User, comment.id, edit()).await.unwrap();
        assert_eq!(edited.text, "Edited");

        assert_eq!(get_post(&db, post.id).await.unwrap().comments.len(), 1);
        assert_eq!(list_comments(&db, Some(post.id)).await.unwrap().len(), 1);
        assert!(list_comments(&db, Some(Uuid::new_v4())).await.unwrap().is_empty());

        delete_comment(&db, admin.id, UserRole::Admin, comment.id).await.unwrap();
        assert!(list_comments(&db, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_rejected() {
        let db = setup_db().await;
        let user = UserSeed::new("u@example.org", UserRole::User).insert(&db).await;
        let err = create_comment(
            &db,
            user.id,
            CreateCommentRequest { post: Uuid::new_v4(), text: "hi".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Invalid { field: "post", .. }));
    }
}
