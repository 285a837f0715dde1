//! Structural diff between two configuration snapshots.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::config::schema::DyteConfig;

/// How a single path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One changed path with its old and new value.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// Dotted path into the config tree, e.g. `server.port`.
    pub path: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl DiffEntry {
    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            _ => ChangeKind::Changed,
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (None, Some(new)) => write!(f, "Added `{}`: `{}`", self.path, new),
            (Some(old), None) => write!(f, "Removed `{}` (was `{}`)", self.path, old),
            (Some(old), Some(new)) => {
                write!(f, "Changed `{}` from `{}` to `{}`", self.path, old, new)
            }
            (None, None) => write!(f, "Changed `{}`", self.path),
        }
    }
}

/// Ordered list of changed entries between two configurations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigChangeDiff {
    entries: Vec<DiffEntry>,
}

impl ConfigChangeDiff {
    /// Compute the diff from `old` to `new`. Entries are ordered by path.
    pub fn between(old: &DyteConfig, new: &DyteConfig) -> Self {
        let mut entries = Vec::new();

        match (serde_json::to_value(old), serde_json::to_value(new)) {
            (Ok(old_tree), Ok(new_tree)) => walk("", &old_tree, &new_tree, &mut entries),
            _ => tracing::debug!("Config not representable as a tree, diffing by equality"),
        }

        // Paths that cannot be serialized still count as a change.
        if entries.is_empty() && old != new {
            entries.push(DiffEntry {
                path: "<root>".to_string(),
                old: None,
                new: None,
            });
        }

        Self { entries }
    }

    pub fn from_entries(entries: Vec<DiffEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.path.as_str())
    }
}

impl fmt::Display for ConfigChangeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

fn walk(prefix: &str, old: &Value, new: &Value, out: &mut Vec<DiffEntry>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            for key in keys {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match (present(old_map.get(key)), present(new_map.get(key))) {
                    (Some(o), Some(n)) => walk(&path, o, n, out),
                    (None, None) => {}
                    (o, n) => out.push(DiffEntry {
                        path,
                        old: o.cloned(),
                        new: n.cloned(),
                    }),
                }
            }
        }
        (o, n) if o != n => out.push(DiffEntry {
            path: prefix.to_string(),
            old: Some(o.clone()),
            new: Some(n.clone()),
        }),
        _ => {}
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
