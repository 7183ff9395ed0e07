//! # Application Assembly
//!
//! Wires settings into shared services and mounts resources on a server.

pub mod demo;
pub mod services;

pub use demo::{demo_schema, demo_server, seed_demo, DEMO_KIND};
pub use services::Services;
