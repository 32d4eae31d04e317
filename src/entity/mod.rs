pub mod blog_posts;
pub mod books;
pub mod borrowed_books;
pub mod carousel_items;
pub mod comments;
pub mod contact_messages;
pub mod health_camps;
pub mod members;
pub mod notices;
pub mod users;
