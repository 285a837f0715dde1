//! Command-line surface.

use std::path::PathBuf;
use std::process::Command;

use clap::{Args, Parser, Subcommand};

use crate::config::schema::Mode;
use crate::context::RunContext;

#[derive(Debug, Parser)]
#[command(name = "dyte", version)]
#[command(about = "Universal frontend tooling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the dev server and restart it when the dyte config changes
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Project directory
    pub directory: Option<PathBuf>,

    /// The mode to build for
    #[arg(short, long, value_enum, default_value_t = Mode::Development)]
    pub mode: Mode,

    /// Launch web browser once the server is up
    #[arg(long)]
    pub launch: bool,

    /// TLS certificate file (experimental, not implemented)
    #[arg(long = "tls-cert", value_name = "CERT", hide = true)]
    pub tls_cert: Option<PathBuf>,

    /// TLS key file (experimental, not implemented)
    #[arg(long = "tls-key", value_name = "KEY", hide = true)]
    pub tls_key: Option<PathBuf>,
}

impl RunArgs {
    /// Build the run context. Pairing of the TLS flags is checked by config
    /// validation, before any server starts.
    pub fn into_context(self, cwd: PathBuf) -> RunContext {
        let project_dir = self.directory.unwrap_or_else(|| PathBuf::from("."));
        RunContext::new(cwd, project_dir, self.mode).with_tls(self.tls_cert, self.tls_key)
    }
}

/// Open `url` in the default browser.
///
/// Uses platform-specific commands:
/// - macOS: `open`
/// - Windows: `start`
/// - Linux: `xdg-open`
pub fn launch_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => tracing::info!(url, "Opened browser"),
        Err(e) => tracing::warn!(url, error = %e, "Failed to open browser"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
        }
    }

    #[test]
    fn run_defaults_to_development_in_cwd() {
        let args = run_args(&["dyte", "run"]);
        assert_eq!(args.mode, Mode::Development);
        assert!(!args.launch);

        let ctx = args.into_context(PathBuf::from("/work"));
        assert_eq!(ctx.cwd, PathBuf::from("/work"));
        assert_eq!(ctx.project_dir, PathBuf::from("."));
        assert!(ctx.tls_override.is_none());
    }

    #[test]
    fn run_accepts_directory_mode_and_launch() {
        let args = run_args(&["dyte", "run", "site", "--mode", "production", "--launch"]);
        assert_eq!(args.directory, Some(PathBuf::from("site")));
        assert_eq!(args.mode, Mode::Production);
        assert!(args.launch);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["dyte", "run", "--mode", "staging"]).is_err());
    }

    #[test]
    fn lone_tls_cert_reaches_context() {
        let ctx = run_args(&["dyte", "run", "--tls-cert", "cert.pem"]).into_context(PathBuf::from("/work"));
        let tls = ctx.tls_override.unwrap();
        assert_eq!(tls.cert, Some(PathBuf::from("cert.pem")));
        assert!(tls.key.is_none());
    }
}
