//! Explicit run context threaded through every subsystem.
//!
//! Nothing below the binary reads process-global state such as the current
//! directory; the binary captures it once and hands a `RunContext` down.

use std::path::{Path, PathBuf};

use crate::config::schema::{Mode, TlsConfig};

/// Inputs that stay fixed for the lifetime of one `dyte run` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Working directory the config lookup is relative to.
    pub cwd: PathBuf,

    /// Project directory argument (`run [directory]`), relative to `cwd`.
    pub project_dir: PathBuf,

    /// Build mode selected on the command line.
    pub mode: Mode,

    /// TLS paths given on the command line, if any.
    pub tls_override: Option<TlsConfig>,
}

impl RunContext {
    pub fn new(cwd: impl Into<PathBuf>, project_dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            cwd: cwd.into(),
            project_dir: project_dir.into(),
            mode,
            tls_override: None,
        }
    }

    /// Attach command-line TLS paths. Passing neither path leaves the config's
    /// own TLS section in effect.
    pub fn with_tls(mut self, cert: Option<PathBuf>, key: Option<PathBuf>) -> Self {
        self.tls_override = if cert.is_some() || key.is_some() {
            Some(TlsConfig { cert, key })
        } else {
            None
        };
        self
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_override_only_when_a_flag_is_given() {
        let ctx = RunContext::new("/work", ".", Mode::Development).with_tls(None, None);
        assert!(ctx.tls_override.is_none());

        let ctx = RunContext::new("/work", ".", Mode::Development)
            .with_tls(Some(PathBuf::from("cert.pem")), None);
        let tls = ctx.tls_override.unwrap();
        assert_eq!(tls.cert, Some(PathBuf::from("cert.pem")));
        assert!(tls.key.is_none());
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let ctx = RunContext::new("/work", ".", Mode::Development);
        assert_eq!(ctx.absolutize(Path::new("app")), PathBuf::from("/work/app"));
        assert_eq!(ctx.absolutize(Path::new("/elsewhere")), PathBuf::from("/elsewhere"));
    }
}
