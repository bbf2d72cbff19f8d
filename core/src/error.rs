//! Error types for option resolution and schema loading.

use thiserror::Error;

use crate::callback::CallbackError;
use crate::group::GroupError;
use crate::validate::SchemaError;

/// Coarse classification of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user must change a supplied value or drop an undeclared option.
    Validation,
    /// A required option was left unset.
    Missing,
    /// A group rule failed after resolution.
    Group,
    /// Not a user input problem: a callback or the prompt channel failed.
    Fault,
}

/// Errors that end the resolution of one invocation.
///
/// None of them is retried; the snapshot built so far is discarded.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An ALLOWED predicate rejected a supplied value.
    #[error("Invalid value for '--{option}': {reason}")]
    Validation {
        /// Offending option.
        option: String,
        /// Message of the failing predicate, e.g. `require '--a'`.
        reason: String,
    },

    /// A value did not coerce to the selected type.
    #[error("Invalid value for '--{option}': '{value}' is not a valid {expected}")]
    InvalidValue {
        /// Offending option.
        option: String,
        /// The rejected value.
        value: String,
        /// Selected type name.
        expected: String,
    },

    /// A required option has no value after default and prompt.
    #[error("Missing option '--{0}'")]
    Missing(String),

    /// A group constraint failed.
    #[error(transparent)]
    Group(#[from] GroupError),

    /// A user-supplied predicate, default or type function returned an error.
    #[error("constraint callback for '--{option}' failed: {source}")]
    Callback {
        /// Option whose constraint was being evaluated.
        option: String,
        /// The callback's error.
        #[source]
        source: CallbackError,
    },

    /// The prompt channel failed to produce an answer.
    #[error("failed to prompt for '--{option}': {source}")]
    Prompt {
        /// Option being prompted for.
        option: String,
        /// I/O failure from the prompter.
        #[source]
        source: std::io::Error,
    },

    /// The caller referred to an option the schema does not declare.
    #[error("No such option: '--{0}'")]
    UnknownOption(String),
}

impl ResolveError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Validation { .. }
            | ResolveError::InvalidValue { .. }
            | ResolveError::UnknownOption(_) => ErrorKind::Validation,
            ResolveError::Missing(_) => ErrorKind::Missing,
            ResolveError::Group(_) => ErrorKind::Group,
            ResolveError::Callback { .. } | ResolveError::Prompt { .. } => ErrorKind::Fault,
        }
    }

    /// Returns `true` for errors caused by user input rather than a fault.
    pub fn is_usage_error(&self) -> bool {
        self.kind() != ErrorKind::Fault
    }
}

/// Errors that can occur while loading a schema file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A group entry does not name exactly one rule.
    #[error("invalid group entry: {0}")]
    InvalidGroup(String),

    /// An option lists `choices` but its type is not `choice`.
    #[error("option '--{0}' lists choices but its type is not choice")]
    ChoicesWithoutChoiceType(String),

    /// The declared schema is invalid.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ResolveError::Validation {
            option: "b".into(),
            reason: "require '--a'".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for '--b': require '--a'");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ResolveError::Missing("b".into());
        assert_eq!(err.to_string(), "Missing option '--b'");
        assert!(err.is_usage_error());

        let err = ResolveError::Callback {
            option: "b".into(),
            source: "boom".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Fault);
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_unknown_option_is_a_usage_error() {
        let err = ResolveError::UnknownOption("colour".into());
        assert_eq!(err.to_string(), "No such option: '--colour'");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_usage_error());
    }
}
