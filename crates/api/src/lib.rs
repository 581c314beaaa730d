//! HTTP service and chat transport for the OFB catalog.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
