use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, reading or writing descriptors
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed descriptor {}: {reason}", path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    #[error("Invalid {kind} value '{value}'")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: String,
    },

    #[error("Deferred value did not settle after {0} evaluations")]
    DeferredTooDeep(usize),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl DescriptorError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DescriptorError::MalformedDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
