//! Shared utilities and common types for the OFB catalog backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Registration code format and generation
//! - Signed admin tokens
//! - Common validation logic

pub mod code;
pub mod jwt;
pub mod validation;
