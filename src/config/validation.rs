//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the TLS cert/key pairing
//! - Check the hostname can be bound locally
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DyteConfig → Result<(), Vec<ValidationError>>
//! - Runs before every server start, initial or reload

use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::DyteConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.tls.cert ({}) is set but server.tls.key is missing", .0.display())]
    TlsCertWithoutKey(PathBuf),

    #[error("server.tls.key ({}) is set but server.tls.cert is missing", .0.display())]
    TlsKeyWithoutCert(PathBuf),

    #[error("server.hostname `{0}` must be `localhost` or an IP address")]
    InvalidHostname(String),

    #[error("entry must not be empty")]
    EmptyEntry,
}

pub fn validate_config(config: &DyteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let tls = &config.server.tls;
    match (&tls.cert, &tls.key) {
        (Some(cert), None) => errors.push(ValidationError::TlsCertWithoutKey(cert.clone())),
        (None, Some(key)) => errors.push(ValidationError::TlsKeyWithoutCert(key.clone())),
        _ => {}
    }

    let hostname = config.server.hostname.as_str();
    if hostname != "localhost" && hostname.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHostname(hostname.to_string()));
    }

    if config.entry.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyEntry);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
