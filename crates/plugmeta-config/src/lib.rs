//! Project configuration for plugmeta
//!
//! Loads `plugmeta.toml` into per-format `DescriptorSettings` and keeps the
//! project metadata that deferred defaults read when descriptors are built.

pub mod errors;
pub mod project;
pub mod project_file;

pub use errors::ConfigError;
pub use project::{default_settings, ProjectInfo, SharedProject};
pub use project_file::{starter_template, GenerateOptions, ProjectFile, PROJECT_FILE_NAME};
