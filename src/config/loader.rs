//! Configuration loading from disk.
//!
//! Resolution never fails: a missing or unusable config file yields the
//! generated defaults for the requested mode and project directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{generate_config, DyteConfig};
use crate::context::RunContext;

/// Name the config lookup is keyed on.
pub const CONFIG_NAME: &str = "dyte";

/// Candidate config files, checked in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["dyte.config.toml", "dyte.config.json"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Parse error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value in {}: {source}", path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where a resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Defaults => f.write_str("generated defaults"),
        }
    }
}

/// A configuration plus its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub config: DyteConfig,
    pub origin: ConfigOrigin,
}

/// Find the first config file present in `cwd`.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| cwd.join(name))
        .find(|path| path.is_file())
}

/// Whether `path` names one of the config files the lookup considers.
pub fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
}

/// Produce the configuration for this run.
///
/// Loads the project config file layered over the generated defaults, then
/// applies command-line TLS paths. Any load failure falls back to defaults.
pub fn resolve(ctx: &RunContext) -> ResolvedConfig {
    let defaults = generate_config(ctx.mode, &ctx.project_dir, &ctx.cwd);

    let mut resolved = match find_config_file(&ctx.cwd) {
        None => {
            tracing::debug!(cwd = %ctx.cwd.display(), name = CONFIG_NAME, "No config file found, using defaults");
            ResolvedConfig {
                config: defaults,
                origin: ConfigOrigin::Defaults,
            }
        }
        Some(path) => match load_config(&path, &defaults) {
            Ok(mut config) => {
                config.root = ctx.absolutize(&config.root);
                ResolvedConfig {
                    config,
                    origin: ConfigOrigin::File(path),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config file, falling back to defaults");
                ResolvedConfig {
                    config: defaults,
                    origin: ConfigOrigin::Defaults,
                }
            }
        },
    };

    if let Some(tls) = &ctx.tls_override {
        resolved.config.server.tls = tls.clone();
    }

    resolved
}

/// Load a config file and layer it over `defaults`.
pub fn load_config(path: &Path, defaults: &DyteConfig) -> Result<DyteConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let overlay = parse_tree(path, &content)?;
    let mut tree = serde_json::to_value(defaults).map_err(|source| ConfigError::Shape {
        path: path.to_path_buf(),
        source,
    })?;
    merge_tree(&mut tree, overlay);

    serde_json::from_value(tree).map_err(|source| ConfigError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_tree(path: &Path, content: &str) -> Result<Value, ConfigError> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    if is_json {
        return serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        });
    }

    let table: toml::Table = toml::from_str(content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_value(table).map_err(|source| ConfigError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

/// Deep-merge `overlay` into `base`: objects merge key by key, anything else
/// replaces. Nulls in the overlay are skipped.
pub(crate) fn merge_tree(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                match base.get_mut(&key) {
                    Some(slot) => merge_tree(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Mode, TlsConfig};
    use serde_json::json;

    fn ctx(dir: &Path) -> RunContext {
        RunContext::new(dir, ".", Mode::Development)
    }

    #[test]
    fn missing_file_resolves_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(&ctx(dir.path()));

        assert_eq!(resolved.origin, ConfigOrigin::Defaults);
        assert_eq!(resolved.config, generate_config(Mode::Development, Path::new("."), dir.path()));
    }

    #[test]
    fn toml_file_is_layered_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dyte.config.toml"), "entry = \"app\"\n\n[server]\nport = 4000\n").unwrap();

        let resolved = resolve(&ctx(dir.path()));

        assert_eq!(resolved.origin, ConfigOrigin::File(dir.path().join("dyte.config.toml")));
        assert_eq!(resolved.config.server.port, 4000);
        assert_eq!(resolved.config.server.hostname, "localhost");
        assert_eq!(resolved.config.entry, PathBuf::from("app"));
        assert_eq!(resolved.config.root, dir.path().join("."));
    }

    #[test]
    fn json_file_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dyte.config.json"),
            r#"{ "mode": "production", "server": { "port": 5000 } }"#,
        )
        .unwrap();

        let resolved = resolve(&ctx(dir.path()));
        assert_eq!(resolved.config.mode, Mode::Production);
        assert_eq!(resolved.config.server.port, 5000);
    }

    #[test]
    fn toml_wins_over_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dyte.config.toml"), "[server]\nport = 4100\n").unwrap();
        fs::write(dir.path().join("dyte.config.json"), r#"{ "server": { "port": 4200 } }"#).unwrap();

        assert_eq!(resolve(&ctx(dir.path())).config.server.port, 4100);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dyte.config.toml"), "[server\nport = ").unwrap();

        let resolved = resolve(&ctx(dir.path()));
        assert_eq!(resolved.origin, ConfigOrigin::Defaults);
        assert_eq!(resolved.config.server.port, 3000);
    }

    #[test]
    fn wrong_value_type_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dyte.config.toml");
        fs::write(&path, "[server]\nport = \"high\"\n").unwrap();

        let err = load_config(&path, &DyteConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Shape { .. }));
    }

    #[test]
    fn relative_root_is_resolved_against_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dyte.config.toml"), "root = \"web\"\n").unwrap();

        assert_eq!(resolve(&ctx(dir.path())).config.root, dir.path().join("web"));
    }

    #[test]
    fn cli_tls_override_replaces_section() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dyte.config.toml"),
            "[server.tls]\ncert = \"a.pem\"\nkey = \"a.key\"\n",
        )
        .unwrap();
        let ctx = ctx(dir.path()).with_tls(Some(PathBuf::from("b.pem")), None);

        let tls = resolve(&ctx).config.server.tls;
        assert_eq!(
            tls,
            TlsConfig {
                cert: Some(PathBuf::from("b.pem")),
                key: None
            }
        );
    }

    #[test]
    fn merge_replaces_scalars_and_merges_objects() {
        let mut base = json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        merge_tree(&mut base, json!({ "a": 5, "b": { "d": 4 }, "e": null }));
        assert_eq!(base, json!({ "a": 5, "b": { "c": 2, "d": 4 } }));
    }

    #[test]
    fn config_file_names_are_recognised() {
        assert!(is_config_file(Path::new("/p/dyte.config.toml")));
        assert!(is_config_file(Path::new("dyte.config.json")));
        assert!(!is_config_file(Path::new("/p/deno.json")));
    }
}
