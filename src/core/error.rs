use std::path::PathBuf;
use thiserror::Error;

/// Core error types for pfcheck
#[derive(Debug, Error)]
pub enum Error {
    /// Rule file does not exist (callers usually treat this as an empty rule set)
    #[error("Rule file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Rule file exists but does not contain valid rule records
    #[error("Malformed rule file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Rule file holds more records than [`crate::core::firewall::MAX_RULES`]
    #[error("Rule file contains {count} rules (max: {max})")]
    TooManyRules { count: usize, max: usize },

    /// Input validation failed
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// Positional index outside the rule list
    #[error("No rule at index {index} (rule count: {len})")]
    Index { index: usize, len: usize },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns a user-facing translation with suggestions for the CLI
    pub fn translate(&self) -> ErrorTranslation {
        match self {
            Error::MissingFile(path) => {
                ErrorTranslation::new(format!("No rule file at {}", path.display()))
                    .with_suggestion("Add a rule first: pfcheck add ALLOW 10.0.0.0/8 443 TCP")
            }
            Error::Format { path, source } => ErrorTranslation::new(format!(
                "Rule file {} is corrupt (line {}, column {})",
                path.display(),
                source.line(),
                source.column()
            ))
            .with_suggestion("Each rule needs the keys: action, ip, port, protocol")
            .with_suggestion("action must be ALLOW or DENY, protocol must be TCP or UDP")
            .with_suggestion("The file was left untouched; fix it by hand or remove it"),
            Error::TooManyRules { max, .. } => {
                ErrorTranslation::new(format!("Too many rules in rule file (max {max})"))
                    .with_suggestion("Delete unused rules or split them into separate files")
            }
            Error::Validation { field, message } => {
                let translation = ErrorTranslation::new(format!("Invalid {field}: {message}"));
                match field.as_str() {
                    "ip" => translation
                        .with_suggestion("Use an address like 192.168.1.1 or 2001:db8::1")
                        .with_suggestion("Or a network in CIDR notation like 192.168.1.0/24"),
                    "port" => translation.with_suggestion("Ports must be between 0 and 65535"),
                    "action" => translation.with_suggestion("Use ALLOW or DENY"),
                    "protocol" => translation.with_suggestion("Use TCP or UDP"),
                    "rules" => translation
                        .with_suggestion("Delete unused rules with 'pfcheck delete <INDEX>'"),
                    "index" => translation
                        .with_suggestion("Run 'pfcheck list' to see rule indexes"),
                    _ => translation,
                }
            }
            Error::Index { len, .. } => {
                let translation = ErrorTranslation::new(self.to_string());
                if *len == 0 {
                    translation.with_suggestion("The rule list is empty")
                } else {
                    translation
                        .with_suggestion(format!("Valid indexes are 0 to {}", len - 1))
                        .with_suggestion("Run 'pfcheck list' to see rule indexes")
                }
            }
            Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorTranslation::new("Permission denied accessing the rule file")
                    .with_suggestion("Check ownership of the rule file and its directory")
            }
            Error::Io(e) if e.kind() == std::io::ErrorKind::StorageFull => {
                ErrorTranslation::new("Disk full: cannot save rules")
                    .with_suggestion("Free up space and try again")
            }
            Error::Io(_) | Error::Serialization(_) => ErrorTranslation::new(self.to_string()),
        }
    }

    /// Whether the error comes from bad user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::Index { .. })
    }
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;
