use plugmeta_descriptor::DescriptorError;
use std::io;
use thiserror::Error;

/// Errors raised while loading a project file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse project file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported value for '{key}': {reason}")]
    UnsupportedValue { key: String, reason: String },

    #[error("Unknown key '{key}' in [{section}]")]
    UnknownKey { section: String, key: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl ConfigError {
    pub(crate) fn unsupported(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::UnsupportedValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
