//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → request.rs (assign x-request-id, request span)
//!     → server.rs (router: /healthcheck, /healthcheck/live, maintenance)
//!     → HealthService
//!     → response.rs (overall verdict → 200 / 503 + JSON body)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
