use crate::core::firewall::Action;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Evaluator configuration, read from `config.json` in the data directory.
///
/// Every field has a default so partial files are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Action for packets that match no rule
    pub default_action: Action,
    /// Rule file location (defaults to the XDG data directory)
    pub rules_file: Option<PathBuf>,
    /// Fail read-only commands on a corrupt rule file instead of treating it as empty
    pub strict_load: bool,
    /// Record rule additions and deletions in the audit log
    pub audit_log: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_action: Action::Deny,
            rules_file: None,
            strict_load: false,
            audit_log: true,
        }
    }
}

impl AppConfig {
    /// Rule file path, falling back to the XDG default.
    pub fn rules_path(&self) -> PathBuf {
        self.rules_file
            .clone()
            .unwrap_or_else(crate::utils::default_rules_path)
    }
}

/// Loads config from `path`, or returns default if not found.
///
/// An unreadable or malformed file is logged and ignored.
pub fn load_config_from(path: &Path) -> AppConfig {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppConfig::default(),
        Err(e) => {
            tracing::warn!("Cannot read config {}: {}", path.display(), e);
            return AppConfig::default();
        }
    };

    match serde_json::from_str::<AppConfig>(&json) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

/// Loads the config from the data directory, or returns default if not found.
pub fn load_config() -> AppConfig {
    crate::utils::default_config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}
