//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {}", .path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("failed to load TLS material: {0}")]
    Load(#[from] std::io::Error),
}

/// Load the rustls acceptor config from the PEM files named in `tls`.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let cert = Path::new(&tls.cert_path);
    let key = Path::new(&tls.key_path);
    require(cert, "Certificate")?;
    require(key, "Private key")?;

    let config = RustlsConfig::from_pem_file(cert, key).await?;
    tracing::info!(cert = %cert.display(), "TLS certificates loaded");
    Ok(config)
}

fn require(path: &Path, kind: &'static str) -> Result<(), TlsError> {
    if path.exists() {
        Ok(())
    } else {
        Err(TlsError::NotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}
