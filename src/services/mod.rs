pub mod auth;
pub mod blog;
pub mod content;
pub mod dashboard;
pub mod email;
pub mod health;
pub mod library;
pub mod recaptcha;
pub mod roles;
pub mod user;
