//! Network layer.
//!
//! # Data Flow
//! ```text
//! listener.bind_address
//!     → plain TCP (axum::serve)
//!     → or TLS (tls.rs → axum-server rustls acceptor)
//! ```

pub mod tls;

pub use tls::{load_tls_config, TlsError};
