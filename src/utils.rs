//! Utility functions for directory management
//!
//! Follows the XDG Base Directory specification for portable storage across
//! Linux distributions.
//!
//! # Directory Structure
//!
//! - Data: `~/.local/share/pfcheck/` - Rule file and configuration
//! - State: `~/.local/state/pfcheck/` - Audit log

use directories::ProjectDirs;
use std::path::PathBuf;

/// File name of the rule set inside the data directory
pub const RULES_FILE_NAME: &str = "rules.json";

/// File name of the configuration inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pfcheck", "pfcheck")
}

pub fn get_data_dir() -> Option<PathBuf> {
    project_dirs().map(|pd| pd.data_dir().to_path_buf())
}

pub fn get_state_dir() -> Option<PathBuf> {
    project_dirs().and_then(|pd| pd.state_dir().map(std::path::Path::to_path_buf))
}

/// Default rule file location, falling back to `./rules.json` when no home
/// directory can be determined.
pub fn default_rules_path() -> PathBuf {
    get_data_dir().map_or_else(
        || PathBuf::from(RULES_FILE_NAME),
        |dir| dir.join(RULES_FILE_NAME),
    )
}

pub fn default_config_path() -> Option<PathBuf> {
    get_data_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

pub fn ensure_state_dir() -> std::io::Result<Option<PathBuf>> {
    let Some(dir) = get_state_dir() else {
        return Ok(None);
    };

    #[cfg(unix)]
    {
        use std::fs::DirBuilder;
        use std::os::unix::fs::DirBuilderExt;

        DirBuilder::new().mode(0o700).recursive(true).create(&dir)?;
    }

    #[cfg(not(unix))]
    std::fs::create_dir_all(&dir)?;

    Ok(Some(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_path_file_name() {
        assert!(default_rules_path().ends_with(RULES_FILE_NAME));
    }

    #[test]
    fn test_config_lives_next_to_rules() {
        if let Some(config) = default_config_path() {
            assert_eq!(config.parent(), default_rules_path().parent());
        }
    }
}
