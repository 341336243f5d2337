pub mod auth;
pub mod health;
pub mod logs;
pub mod trends;
