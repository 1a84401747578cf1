//! Rule persistence
//!
//! Rule sets are ordered JSON arrays of [`Rule`] records. Storage sits behind
//! the [`RuleStore`] trait so callers receive the store explicitly instead of
//! reaching for a global file path.
//!
//! # Built-in Implementations
//!
//! - [`FileRuleStore`] - JSON file on disk, written atomically
//! - [`MemoryRuleStore`] - In-memory rules (for testing and embedding)
//!
//! # Example
//!
//! ```
//! use pfcheck::core::firewall::{Action, Protocol, Rule};
//! use pfcheck::core::store::{MemoryRuleStore, RuleStore};
//!
//! let mut store = MemoryRuleStore::default();
//! store.append(Rule::new(Action::Allow, "10.0.0.0/8", 443, Protocol::Tcp).unwrap()).unwrap();
//! assert_eq!(store.load().unwrap().len(), 1);
//! ```

use crate::core::error::{Error, Result};
use crate::core::firewall::{MAX_RULES, Rule};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Rule storage backend.
pub trait RuleStore {
    /// Reads the persisted rules in stored order.
    fn load(&self) -> Result<Vec<Rule>>;

    /// Replaces the persisted rules with `rules`, keeping their order.
    fn save(&mut self, rules: &[Rule]) -> Result<()>;

    /// Appends a rule and persists the result. Returns the new rule's index.
    ///
    /// Refuses to grow the list past [`MAX_RULES`], which `load` would reject.
    fn append(&mut self, rule: Rule) -> Result<usize> {
        let mut rules = self.load()?;
        if rules.len() >= MAX_RULES {
            return Err(Error::validation(
                "rules",
                format!("rule limit reached ({MAX_RULES} rules)"),
            ));
        }
        rules.push(rule);
        self.save(&rules)?;
        Ok(rules.len() - 1)
    }

    /// Removes the rule at `index` and persists the result.
    ///
    /// An out-of-range index returns [`Error::Index`] without writing anything.
    fn remove_at(&mut self, index: usize) -> Result<Rule> {
        let mut rules = self.load()?;
        let removed = remove_rule(&mut rules, index)?;
        self.save(&rules)?;
        Ok(removed)
    }
}

/// Removes `rules[index]`, leaving `rules` untouched when out of range.
pub fn remove_rule(rules: &mut Vec<Rule>, index: usize) -> Result<Rule> {
    if index >= rules.len() {
        return Err(Error::Index {
            index,
            len: rules.len(),
        });
    }
    Ok(rules.remove(index))
}

fn checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Parses a rule file body. `path` is only used for error reporting.
pub fn parse_rules(json: &str, path: &Path) -> Result<Vec<Rule>> {
    let rules: Vec<Rule> = serde_json::from_str(json).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })?;

    if rules.len() > MAX_RULES {
        return Err(Error::TooManyRules {
            count: rules.len(),
            max: MAX_RULES,
        });
    }

    Ok(rules)
}

/// JSON file rule store.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `.sha256` sidecar written next to the rule file
    pub fn checksum_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".sha256");
        self.path.with_file_name(name)
    }

    /// Reads the rule file, reporting a missing file as [`Error::MissingFile`].
    pub fn read(&self) -> Result<Vec<Rule>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingFile(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        // Warn but don't fail: the file may have been edited by hand
        if let Ok(expected) = std::fs::read_to_string(self.checksum_path()) {
            let actual = checksum(json.as_bytes());
            if expected.trim() != actual {
                tracing::warn!(
                    "Rule file '{}' checksum mismatch (expected: {}, got: {})",
                    self.path.display(),
                    expected.trim(),
                    actual
                );
            }
        }

        parse_rules(&json, &self.path)
    }

    fn write_atomic(&self, json: &str) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        // Sidecar is advisory: the rules are already saved at this point
        let checksum_path = self.checksum_path();
        if let Err(e) = std::fs::write(&checksum_path, checksum(json.as_bytes())) {
            tracing::warn!(
                "Saved rules but failed to write checksum {}: {}",
                checksum_path.display(),
                e
            );
        }
        Ok(())
    }
}

impl RuleStore for FileRuleStore {
    fn load(&self) -> Result<Vec<Rule>> {
        match self.read() {
            Err(Error::MissingFile(path)) => {
                tracing::debug!("No rule file at {}, starting empty", path.display());
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn save(&mut self, rules: &[Rule]) -> Result<()> {
        let json = serde_json::to_string_pretty(rules)?;
        self.write_atomic(&json)?;
        tracing::debug!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}

/// In-memory rule store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: Vec<Rule>,
    saves: usize,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules, saves: 0 }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl RuleStore for MemoryRuleStore {
    fn load(&self) -> Result<Vec<Rule>> {
        Ok(self.rules.clone())
    }

    fn save(&mut self, rules: &[Rule]) -> Result<()> {
        self.rules = rules.to_vec();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::firewall::{Action, Protocol};
    use crate::core::test_helpers::{rule, sample_rules};

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::new(dir.path().join("rules.json"));

        assert!(matches!(store.read(), Err(Error::MissingFile(_))));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[{\"action\": \"ALLOW\"").unwrap();

        let store = FileRuleStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Format { .. })));
    }

    #[test]
    fn test_wrong_shape_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"action":"REJECT","ip":"1.2.3.4","port":1,"protocol":"TCP"}]"#,
        )
        .unwrap();

        let store = FileRuleStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Format { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_order_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("rules.json"));

        let mut rules = sample_rules();
        rules.push(Rule {
            action: Action::Allow,
            ip: "192.168.1.5/24".to_string(),
            port: 8080,
            protocol: Protocol::Udp,
        });
        store.save(&rules).unwrap();

        assert_eq!(store.load().unwrap(), rules);
        assert!(store.checksum_path().exists());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("nested/deeper/rules.json"));
        store.save(&sample_rules()).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("rules.json"));
        store.save(&sample_rules()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_checksum_mismatch_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("rules.json"));
        store.save(&sample_rules()).unwrap();
        std::fs::write(store.checksum_path(), "deadbeef").unwrap();

        assert_eq!(store.load().unwrap(), sample_rules());
    }

    #[test]
    fn test_checksum_path_sits_next_to_rule_file() {
        let store = FileRuleStore::new("/etc/pfcheck/rules.json");
        assert_eq!(
            store.checksum_path(),
            PathBuf::from("/etc/pfcheck/rules.json.sha256")
        );
    }

    #[test]
    fn test_unwritable_checksum_does_not_fail_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("rules.json"));
        std::fs::create_dir(store.checksum_path()).unwrap();

        store.save(&sample_rules()).unwrap();
        assert_eq!(store.load().unwrap(), sample_rules());

        let index = store
            .append(rule(Action::Allow, "10.0.0.0/8", 443, Protocol::Tcp))
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(store.load().unwrap().len(), 3);
    }

    #[test]
    fn test_append_stops_at_rule_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRuleStore::new(dir.path().join("rules.json"));
        let full = vec![rule(Action::Allow, "1.1.1.1", 1, Protocol::Tcp); MAX_RULES];
        store.save(&full).unwrap();

        let err = store
            .append(rule(Action::Allow, "2.2.2.2", 2, Protocol::Tcp))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "rules"));

        assert_eq!(store.load().unwrap().len(), MAX_RULES);
        store.remove_at(0).unwrap();
        assert_eq!(store.load().unwrap().len(), MAX_RULES - 1);
    }

    #[test]
    fn test_too_many_rules() {
        let rules = vec![rule(Action::Allow, "1.1.1.1", 1, Protocol::Tcp); MAX_RULES + 1];
        let json = serde_json::to_string(&rules).unwrap();
        assert!(matches!(
            parse_rules(&json, Path::new("rules.json")),
            Err(Error::TooManyRules { .. })
        ));
    }

    #[test]
    fn test_append_returns_index() {
        let mut store = MemoryRuleStore::new(sample_rules());
        let index = store
            .append(rule(Action::Allow, "10.0.0.0/8", 443, Protocol::Tcp))
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(store.rules()[2].ip, "10.0.0.0/8");
    }

    #[test]
    fn test_remove_at_shifts_later_rules() {
        let mut store = MemoryRuleStore::new(sample_rules());
        let removed = store.remove_at(0).unwrap();
        assert_eq!(removed.ip, "192.168.1.0/24");
        assert_eq!(store.rules().len(), 1);
        assert_eq!(store.rules()[0].ip, "0.0.0.0/0");
    }

    #[test]
    fn test_remove_at_out_of_range_does_not_save() {
        let mut store = MemoryRuleStore::new(sample_rules());
        let err = store.remove_at(2).unwrap_err();
        assert!(matches!(err, Error::Index { index: 2, len: 2 }));
        assert_eq!(store.rules(), sample_rules().as_slice());
        assert_eq!(store.save_count(), 0);
    }
}
