//! Configuration schema definitions.
//!
//! This module defines the complete configuration tree for a dyte project.
//! All types derive Serde traits for deserialization from config files, and
//! every section falls back to its defaults so a file may set a single key.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration for a dyte project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DyteConfig {
    /// Project root. Relative values are resolved against the working directory.
    pub root: PathBuf,

    /// Build mode.
    pub mode: Mode,

    /// Entry directory, relative to `root`.
    pub entry: PathBuf,

    /// Directory of static files served as-is, relative to `root`.
    pub public_dir: PathBuf,

    /// Dev server settings.
    pub server: ServerConfig,
}

impl Default for DyteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: Mode::Development,
            entry: PathBuf::from("src"),
            public_dir: PathBuf::from("public"),
            server: ServerConfig::default(),
        }
    }
}

/// Build mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_development(self) -> bool {
        self == Mode::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dev server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname shown in the serving URL (`localhost` or an IP literal).
    pub hostname: String,

    /// Port to listen on.
    pub port: u16,

    /// Optional TLS configuration. Cert and key are mutually required.
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3000,
            tls: TlsConfig::default(),
        }
    }
}

/// TLS configuration for the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,

    /// Path to private key file (PEM).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,
}

impl TlsConfig {
    /// Both paths, when TLS is fully configured.
    pub fn pair(&self) -> Option<(&Path, &Path)> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cert.is_none() && self.key.is_none()
    }
}

/// Generate the configuration used when a project has no config file.
pub fn generate_config(mode: Mode, project_dir: &Path, cwd: &Path) -> DyteConfig {
    DyteConfig {
        root: cwd.join(project_dir),
        mode,
        ..DyteConfig::default()
    }
}
