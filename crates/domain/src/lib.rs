//! Domain layer for the OFB catalog backend.
//!
//! This crate contains:
//! - Domain models (Application, View, ThemeSetting)
//! - The application lifecycle controller and conversation dispatcher
//! - Store, gateway and session interfaces
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
