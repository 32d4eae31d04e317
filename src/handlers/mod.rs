pub mod auth;
pub mod blog;
pub mod content;
pub mod health;
pub mod library;
pub mod users;
