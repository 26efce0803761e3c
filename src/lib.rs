//! Health aggregation service library.
//!
//! Build a [`Collaborators`](health::Collaborators) for the subsystems the
//! process depends on, then either serve it with [`lifecycle::run`] or embed
//! [`build_router`](http::build_router) in an existing axum application.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::HealthConfig;
pub use health::HealthService;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
