//! Plugin descriptor generation
//!
//! This crate holds the core of plugmeta: the descriptor model shared by
//! Spigot `plugin.yml` and BungeeCord `bungee.yml`, the value resolver that
//! turns configured values into typed fields, the merge engine that folds
//! existing descriptor files into the configured one, and the codec that
//! reads and writes both formats.
//!
//! Settings are described with `DescriptorSettings`, built into a
//! `PluginDescriptor`, and written through a `FormatProfile`. The
//! `generate` module wires these steps together per format.

pub mod codec;
pub mod errors;
pub mod format;
pub mod generate;
pub mod merge;
pub mod settings;
pub mod types;
pub mod value;

pub use errors::DescriptorError;
pub use format::{AuthorStyle, Format, FormatProfile, BUNGEE, SPIGOT};
pub use generate::{assemble, generate, generate_all, GenerationJob, GenerationReport};
pub use merge::merge;
pub use settings::{
    CommandSettings, DependencySettings, DescriptorSettings, PermissionChildSettings,
    PermissionSettings,
};
pub use types::{
    Command, Dependency, DependencyType, Keyed, KeyedList, LoadStage, Permission,
    PermissionChild, PermissionDefault, PluginDescriptor,
};
pub use value::{
    resolve_bool, resolve_enum, resolve_list, resolve_string, resolve_string_list, ConfigValue,
    Deferred, EnumToken, TokenEnum, MAX_DEFERRED_DEPTH,
};
