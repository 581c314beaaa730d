//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod application;
pub mod setting;
pub mod view;

pub use application::{ApplicationEntity, ApplicationStatusDb};
pub use setting::AppSettingEntity;
pub use view::ApplicationViewEntity;
