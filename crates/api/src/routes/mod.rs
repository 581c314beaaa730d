//! HTTP route handlers.

pub mod applications;
pub mod companies;
pub mod health;
pub mod settings;
pub mod telegram;
pub mod views;
