//! Project tooling metadata (`deno.json`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOOLING_FILE_NAME: &str = "deno.json";

#[derive(Debug, Error)]
pub enum ToolingError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of `deno.json` the bundler cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolingMetadata {
    /// Path to an external import map, relative to the project root.
    pub import_map: Option<PathBuf>,

    /// Inline import map entries.
    pub imports: BTreeMap<String, String>,

    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub jsx: Option<String>,
    pub jsx_factory: Option<String>,
    pub jsx_fragment_factory: Option<String>,
    pub jsx_import_source: Option<String>,
}

impl ToolingMetadata {
    /// Load `deno.json` from `root`. A missing file yields `Ok(None)`.
    pub fn load(root: &Path) -> Result<Option<Self>, ToolingError> {
        let path = root.join(TOOLING_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| ToolingError::Io {
            path: path.clone(),
            source,
        })?;
        let metadata = serde_json::from_str(&content)
            .map_err(|source| ToolingError::Parse { path, source })?;
        Ok(Some(metadata))
    }

    /// Load `deno.json`, treating a missing or broken file as empty metadata.
    pub fn load_or_default(root: &Path) -> Self {
        match Self::load(root) {
            Ok(metadata) => metadata.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable tooling metadata");
                Self::default()
            }
        }
    }
}
