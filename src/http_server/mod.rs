//! # HTTP Server Module
//!
//! Combines resource routers into one Axum server.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/counter/*` - Sharded counters
//! - resource routes mounted by the application

pub mod config;
pub mod counter_routes;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use counter_routes::{counter_routes, CounterState};
pub use server::HttpServer;
