//! HTTP surface and configuration of the org directory service.

pub mod config;
pub mod http;
mod rest;

pub use config::AppConfig;
pub use http::{AppState, ServeConfig, build_router, serve};
