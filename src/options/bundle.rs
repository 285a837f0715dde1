//! Bundler option derivation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::schema::{DyteConfig, Mode};
use crate::options::tooling::ToolingMetadata;

/// Options handed to the bundler for one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOptions {
    pub root: PathBuf,
    pub entry_dir: PathBuf,
    pub public_dir: PathBuf,
    pub mode: Mode,
    pub minify: bool,
    pub sourcemap: bool,
    /// Compile-time replacements, e.g. `process.env.NODE_ENV`.
    pub define: BTreeMap<String, String>,
    pub import_map: Option<PathBuf>,
    pub imports: BTreeMap<String, String>,
    pub jsx: JsxOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsxOptions {
    /// JSX transform: `react` (classic) or `react-jsx` (automatic).
    pub transform: String,
    pub factory: String,
    pub fragment_factory: String,
    pub import_source: Option<String>,
}

impl Default for JsxOptions {
    fn default() -> Self {
        Self {
            transform: "react".to_string(),
            factory: "React.createElement".to_string(),
            fragment_factory: "React.Fragment".to_string(),
            import_source: None,
        }
    }
}

/// Derive bundler options. `config.root` is expected to be absolute, as
/// produced by the resolver.
pub fn derive_bundle_options(
    config: &DyteConfig,
    tooling: &ToolingMetadata,
    is_development: bool,
) -> BundleOptions {
    let root = config.root.clone();
    let node_env = if is_development {
        Mode::Development
    } else {
        Mode::Production
    };

    let mut define = BTreeMap::new();
    define.insert(
        "process.env.NODE_ENV".to_string(),
        format!("\"{}\"", node_env.as_str()),
    );

    let compiler = &tooling.compiler_options;
    let defaults = JsxOptions::default();
    let jsx = JsxOptions {
        transform: compiler.jsx.clone().unwrap_or(defaults.transform),
        factory: compiler.jsx_factory.clone().unwrap_or(defaults.factory),
        fragment_factory: compiler
            .jsx_fragment_factory
            .clone()
            .unwrap_or(defaults.fragment_factory),
        import_source: compiler.jsx_import_source.clone(),
    };

    BundleOptions {
        entry_dir: join(&root, &config.entry),
        public_dir: join(&root, &config.public_dir),
        import_map: tooling.import_map.as_deref().map(|p| join(&root, p)),
        imports: tooling.imports.clone(),
        mode: config.mode,
        minify: !is_development,
        sourcemap: is_development,
        define,
        jsx,
        root,
    }
}

fn join(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::tooling::CompilerOptions;

    fn config() -> DyteConfig {
        DyteConfig {
            root: PathBuf::from("/project"),
            ..DyteConfig::default()
        }
    }

    #[test]
    fn development_bundle_has_sourcemaps_and_no_minify() {
        let bundle = derive_bundle_options(&config(), &ToolingMetadata::default(), true);

        assert_eq!(bundle.entry_dir, PathBuf::from("/project/src"));
        assert_eq!(bundle.public_dir, PathBuf::from("/project/public"));
        assert!(bundle.sourcemap);
        assert!(!bundle.minify);
        assert_eq!(bundle.define["process.env.NODE_ENV"], "\"development\"");
        assert_eq!(bundle.jsx, JsxOptions::default());
    }

    #[test]
    fn production_bundle_minifies() {
        let bundle = derive_bundle_options(&config(), &ToolingMetadata::default(), false);
        assert!(bundle.minify);
        assert!(!bundle.sourcemap);
        assert_eq!(bundle.define["process.env.NODE_ENV"], "\"production\"");
    }

    #[test]
    fn tooling_metadata_flows_into_bundle() {
        let tooling = ToolingMetadata {
            import_map: Some(PathBuf::from("import_map.json")),
            imports: BTreeMap::from([("preact".to_string(), "npm:preact".to_string())]),
            compiler_options: CompilerOptions {
                jsx: Some("react-jsx".into()),
                jsx_import_source: Some("preact".into()),
                ..CompilerOptions::default()
            },
        };

        let bundle = derive_bundle_options(&config(), &tooling, true);
        assert_eq!(bundle.import_map, Some(PathBuf::from("/project/import_map.json")));
        assert_eq!(bundle.imports.len(), 1);
        assert_eq!(bundle.jsx.transform, "react-jsx");
        assert_eq!(bundle.jsx.factory, "React.createElement");
        assert_eq!(bundle.jsx.import_source.as_deref(), Some("preact"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let tooling = ToolingMetadata::default();
        assert_eq!(
            derive_bundle_options(&config(), &tooling, true),
            derive_bundle_options(&config(), &tooling, true)
        );
    }
}
