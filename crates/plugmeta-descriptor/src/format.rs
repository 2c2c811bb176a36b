//! Descriptor formats and the profiles that drive the shared codec

use crate::types::DependencyType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target descriptor format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Spigot/Bukkit `plugin.yml`
    Spigot,
    /// BungeeCord `bungee.yml`
    Bungee,
}

impl Format {
    /// Generation order used by `generate_all`
    pub const ALL: [Format; 2] = [Format::Spigot, Format::Bungee];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Spigot => "spigot",
            Format::Bungee => "bungee",
        }
    }

    pub fn profile(self) -> &'static FormatProfile {
        match self {
            Format::Spigot => &SPIGOT,
            Format::Bungee => &BUNGEE,
        }
    }

    pub fn file_name(self) -> &'static str {
        self.profile().file_name
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spigot" | "bukkit" | "plugin.yml" => Ok(Format::Spigot),
            "bungee" | "bungeecord" | "bungee.yml" => Ok(Format::Bungee),
            other => Err(format!("unknown descriptor format '{}'", other)),
        }
    }
}

/// How the author list is laid out in a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorStyle {
    /// `authors:` sequence
    List,
    /// Single `author:` scalar; several authors are joined with `, `
    Joined,
}

/// Key names and optional fields of one descriptor format
#[derive(Debug)]
pub struct FormatProfile {
    pub format: Format,
    pub file_name: &'static str,
    pub author_style: AuthorStyle,
    pub supports_load: bool,
    pub supports_website: bool,
    pub supports_database: bool,
    pub supports_prefix: bool,
    /// Dependency blocks in output order
    pub dependency_keys: [(DependencyType, &'static str); 3],
}

impl FormatProfile {
    pub fn dependency_key(&self, kind: DependencyType) -> &'static str {
        self.dependency_keys
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or("depend", |(_, key)| *key)
    }
}

pub static SPIGOT: FormatProfile = FormatProfile {
    format: Format::Spigot,
    file_name: "plugin.yml",
    author_style: AuthorStyle::List,
    supports_load: true,
    supports_website: true,
    supports_database: true,
    supports_prefix: true,
    dependency_keys: [
        (DependencyType::Depend, "depend"),
        (DependencyType::Softdepend, "softdepend"),
        (DependencyType::Loadbefore, "loadbefore"),
    ],
};

pub static BUNGEE: FormatProfile = FormatProfile {
    format: Format::Bungee,
    file_name: "bungee.yml",
    author_style: AuthorStyle::Joined,
    supports_load: false,
    supports_website: false,
    supports_database: false,
    supports_prefix: false,
    dependency_keys: [
        (DependencyType::Depend, "depends"),
        (DependencyType::Softdepend, "softDepends"),
        (DependencyType::Loadbefore, "loadBefore"),
    ],
};
