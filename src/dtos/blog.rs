use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entity::{blog_posts, comments, users};

#[derive(Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub author_name: String,
    pub image: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(max = 255))]
    pub author_name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
}

impl From<&users::Model> for CommentUser {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub user: Option<CommentUser>,
    pub post: Uuid,
    pub text: String,
    pub created_at: String,
}

impl CommentResponse {
    pub fn new(comment: comments::Model, user: Option<&users::Model>) -> Self {
        Self {
            id: comment.id,
            user: user.map(CommentUser::from),
            post: comment.post_id,
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// 作者账号（邮箱）
    pub author: String,
    pub author_name: String,
    pub display_author: String,
    pub image: Option<String>,
    pub read_count: i32,
    pub created_at: String,
    pub comments: Vec<CommentResponse>,
}

/// 展示作者：优先使用覆盖名，其次“名 姓”，最后是邮箱。
pub fn display_author(post: &blog_posts::Model, author: Option<&users::Model>) -> String {
    if !post.author_name.trim().is_empty() {
        return post.author_name.clone();
    }
    match author {
        Some(user) => user.full_name().unwrap_or_else(|| user.email.clone()),
        None => String::new(),
    }
}

impl PostResponse {
    pub fn new(
        post: blog_posts::Model,
        author: Option<&users::Model>,
        comments: Vec<CommentResponse>,
    ) -> Self {
        let display_author = display_author(&post, author);
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: author.map(|u| u.email.clone()).unwrap_or_default(),
            author_name: post.author_name,
            display_author,
            image: post.image,
            read_count: post.read_count,
            created_at: post.created_at.to_rfc3339(),
            comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadCountResponse {
    pub status: &'static str,
    pub read_count: i32,
}

#[derive(Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post: Uuid,
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub text: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub text: String,
}

#[derive(Deserialize, Default)]
pub struct CommentQuery {
    pub post: Option<Uuid>,
}
