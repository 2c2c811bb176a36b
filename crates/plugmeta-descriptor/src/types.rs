//! Descriptor model
//!
//! This module provides:
//! - `PluginDescriptor`, the aggregate root shared by both descriptor formats
//! - `KeyedList`, an insertion-ordered collection with get-or-create by name
//! - The enum members used by load stages, dependencies and permissions

use ahash::AHashMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

// =============================================================================
// KEYED LIST - Insertion order with O(1) lookup by name
// =============================================================================

/// Entry that is identified by its name inside a `KeyedList`
///
/// The name is set once by `with_key` and is read-only afterwards.
pub trait Keyed {
    /// Fresh entry for `name` carrying the type's defaults
    fn with_key(name: &str) -> Self;
}

/// Ordered collection that never holds two entries with the same name
#[derive(Debug, Clone)]
pub struct KeyedList<T> {
    entries: Vec<T>,
    index: AHashMap<String, usize>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        KeyedList {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<T: Keyed> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry named `name`, creating it with defaults if missing
    pub fn get_or_create(&mut self, name: &str) -> &mut T {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(T::with_key(name));
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

impl<T> KeyedList<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<'a, T> IntoIterator for &'a KeyedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Serialize> Serialize for KeyedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Server start phase in which a Spigot plugin is loaded
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadStage {
    Startup,
    Postworld,
}

impl LoadStage {
    pub const ALL: [LoadStage; 2] = [LoadStage::Startup, LoadStage::Postworld];

    pub fn as_str(self) -> &'static str {
        match self {
            LoadStage::Startup => "STARTUP",
            LoadStage::Postworld => "POSTWORLD",
        }
    }
}

/// How strongly a plugin depends on another one
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyType {
    #[default]
    Depend,
    Softdepend,
    Loadbefore,
}

impl DependencyType {
    pub const ALL: [DependencyType; 3] = [
        DependencyType::Depend,
        DependencyType::Softdepend,
        DependencyType::Loadbefore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Depend => "DEPEND",
            DependencyType::Softdepend => "SOFTDEPEND",
            DependencyType::Loadbefore => "LOADBEFORE",
        }
    }
}

/// Who is granted a permission when nothing else is configured
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionDefault {
    #[default]
    True,
    False,
    Op,
    Notop,
}

impl PermissionDefault {
    pub const ALL: [PermissionDefault; 4] = [
        PermissionDefault::True,
        PermissionDefault::False,
        PermissionDefault::Op,
        PermissionDefault::Notop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionDefault::True => "TRUE",
            PermissionDefault::False => "FALSE",
            PermissionDefault::Op => "OP",
            PermissionDefault::Notop => "NOTOP",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(LoadStage, DependencyType, PermissionDefault);

// =============================================================================
// ENTRIES
// =============================================================================

/// Another plugin this plugin depends on
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Dependency {
    name: String,
    #[serde(rename = "type")]
    pub kind: DependencyType,
}

impl Dependency {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Keyed for Dependency {
    fn with_key(name: &str) -> Self {
        Dependency {
            name: name.to_string(),
            kind: DependencyType::default(),
        }
    }
}

/// Command registered by the plugin
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Command {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub aliases: SmallVec<[String; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Keyed for Command {
    fn with_key(name: &str) -> Self {
        Command {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Child node of a permission; `value` grants or revokes the child
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PermissionChild {
    name: String,
    pub value: bool,
}

impl PermissionChild {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Keyed for PermissionChild {
    fn with_key(name: &str) -> Self {
        PermissionChild {
            name: name.to_string(),
            value: true,
        }
    }
}

/// Permission node declared by the plugin
#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default: PermissionDefault,
    #[serde(skip_serializing_if = "KeyedList::is_empty")]
    pub children: KeyedList<PermissionChild>,
}

impl Permission {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get or create the child `name` (defaults to granted)
    pub fn child(&mut self, name: &str) -> &mut PermissionChild {
        self.children.get_or_create(name)
    }
}

impl Keyed for Permission {
    fn with_key(name: &str) -> Self {
        Permission {
            name: name.to_string(),
            description: None,
            default: PermissionDefault::default(),
            children: KeyedList::new(),
        }
    }
}

// =============================================================================
// PLUGIN DESCRIPTOR - Aggregate root
// =============================================================================

/// Everything that ends up in a `plugin.yml` or `bungee.yml`
///
/// `name` is fixed at construction; every other scalar is optional and stays
/// `None` until something sets it.
#[derive(Debug, Clone, Serialize)]
pub struct PluginDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_stage: Option<LoadStage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_database: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "KeyedList::is_empty")]
    pub dependencies: KeyedList<Dependency>,
    #[serde(skip_serializing_if = "KeyedList::is_empty")]
    pub commands: KeyedList<Command>,
    #[serde(skip_serializing_if = "KeyedList::is_empty")]
    pub permissions: KeyedList<Permission>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        PluginDescriptor {
            name: name.into(),
            main: None,
            version: None,
            description: None,
            load_stage: None,
            authors: Vec::new(),
            website: None,
            uses_database: None,
            prefix: None,
            dependencies: KeyedList::new(),
            commands: KeyedList::new(),
            permissions: KeyedList::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get or create the dependency `name` (type `DEPEND` when created)
    pub fn dependency(&mut self, name: &str) -> &mut Dependency {
        self.dependencies.get_or_create(name)
    }

    pub fn command(&mut self, name: &str) -> &mut Command {
        self.commands.get_or_create(name)
    }

    pub fn permission(&mut self, name: &str) -> &mut Permission {
        self.permissions.get_or_create(name)
    }

    pub fn add_author(&mut self, author: impl Into<String>) {
        self.authors.push(author.into());
    }

    /// Dependencies of one type, in insertion order
    pub fn dependencies_of(&self, kind: DependencyType) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(move |dep| dep.kind == kind)
    }
}
