//! API handlers module

pub mod articles;
pub mod auth;
pub mod comments;
pub mod health;
