//! Reload decision for a config change.

use crate::config::diff::ConfigChangeDiff;

/// Decides whether a config change requires restarting the server.
///
/// Any non-empty diff restarts; no field is considered cosmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffPolicy;

impl DiffPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn should_reload(&self, diff: &ConfigChangeDiff) -> bool {
        if diff.is_empty() {
            tracing::info!("No config changed detected!");
            return false;
        }

        tracing::info!(changes = diff.len(), "Config updated:\n{}", diff);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DyteConfig;

    #[test]
    fn empty_diff_is_noop() {
        let config = DyteConfig::default();
        let diff = ConfigChangeDiff::between(&config, &config);
        assert!(!DiffPolicy::new().should_reload(&diff));
    }

    #[test]
    fn any_change_reloads() {
        let old = DyteConfig::default();
        let mutations: [fn(&mut DyteConfig); 3] = [
            |c| c.server.port = 4000,
            |c| c.public_dir = "static".into(),
            |c| c.server.hostname = "0.0.0.0".into(),
        ];
        for mutate in mutations {
            let mut new = old.clone();
            mutate(&mut new);
            let diff = ConfigChangeDiff::between(&old, &new);
            assert!(DiffPolicy::new().should_reload(&diff));
        }
    }
}
