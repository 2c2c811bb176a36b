//! Configured descriptor settings
//!
//! `DescriptorSettings` is the configuration surface for one output format.
//! Every field holds an unresolved `ConfigValue`; `build` resolves them into a
//! fresh `PluginDescriptor`. Keyed sections (dependencies, commands,
//! permissions) use get-or-create by name, like the descriptor itself.

use crate::errors::DescriptorError;
use crate::types::{
    DependencyType, Keyed, KeyedList, LoadStage, PermissionDefault, PluginDescriptor,
};
use crate::value::{
    resolve_bool, resolve_enum, resolve_string, resolve_string_list, ConfigValue,
};

// =============================================================================
// NESTED SETTINGS
// =============================================================================

#[derive(Debug, Clone)]
pub struct DependencySettings {
    name: String,
    kind: ConfigValue,
}

impl DependencySettings {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_type(&mut self, kind: impl Into<ConfigValue>) -> &mut Self {
        self.kind = kind.into();
        self
    }

    pub fn kind(&self) -> Result<DependencyType, DescriptorError> {
        Ok(resolve_enum(Some(&self.kind))?.unwrap_or_default())
    }
}

impl Keyed for DependencySettings {
    fn with_key(name: &str) -> Self {
        DependencySettings {
            name: name.to_string(),
            kind: DependencyType::Depend.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandSettings {
    name: String,
    description: Option<ConfigValue>,
    aliases: Option<ConfigValue>,
    permission: Option<ConfigValue>,
    permission_message: Option<ConfigValue>,
    usage: Option<ConfigValue>,
}

impl CommandSettings {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_description(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.description = Some(value.into());
        self
    }

    /// Aliases are resolved as a list; a non-list value yields no aliases
    pub fn set_aliases(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.aliases = Some(value.into());
        self
    }

    pub fn set_permission(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.permission = Some(value.into());
        self
    }

    pub fn set_permission_message(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.permission_message = Some(value.into());
        self
    }

    pub fn set_usage(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.usage = Some(value.into());
        self
    }

    fn apply(&self, descriptor: &mut PluginDescriptor) -> Result<(), DescriptorError> {
        let description = resolve_string(self.description.as_ref())?;
        let aliases = resolve_string_list(self.aliases.as_ref())?;
        let permission = resolve_string(self.permission.as_ref())?;
        let permission_message = resolve_string(self.permission_message.as_ref())?;
        let usage = resolve_string(self.usage.as_ref())?;

        let command = descriptor.command(&self.name);
        command.description = description;
        command.aliases = aliases.into_iter().collect();
        command.permission = permission;
        command.permission_message = permission_message;
        command.usage = usage;
        Ok(())
    }
}

impl Keyed for CommandSettings {
    fn with_key(name: &str) -> Self {
        CommandSettings {
            name: name.to_string(),
            description: None,
            aliases: None,
            permission: None,
            permission_message: None,
            usage: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionChildSettings {
    name: String,
    value: ConfigValue,
}

impl PermissionChildSettings {
    pub fn set_value(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.value = value.into();
        self
    }
}

impl Keyed for PermissionChildSettings {
    fn with_key(name: &str) -> Self {
        PermissionChildSettings {
            name: name.to_string(),
            value: ConfigValue::Bool(true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionSettings {
    name: String,
    description: Option<ConfigValue>,
    default: ConfigValue,
    children: KeyedList<PermissionChildSettings>,
}

impl PermissionSettings {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_description(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.description = Some(value.into());
        self
    }

    pub fn set_default(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.default = value.into();
        self
    }

    /// Get or create the child `name`; new children are granted (`true`)
    pub fn child(&mut self, name: &str) -> &mut PermissionChildSettings {
        self.children.get_or_create(name)
    }

    fn apply(&self, descriptor: &mut PluginDescriptor) -> Result<(), DescriptorError> {
        let description = resolve_string(self.description.as_ref())?;
        let default: PermissionDefault = resolve_enum(Some(&self.default))?.unwrap_or_default();
        let mut children = Vec::with_capacity(self.children.len());
        for child in &self.children {
            // A child whose deferred value yields nothing keeps the default grant
            let value = resolve_bool(Some(&child.value))?.unwrap_or(true);
            children.push((child.name.as_str(), value));
        }

        let permission = descriptor.permission(&self.name);
        permission.description = description;
        permission.default = default;
        for (name, value) in children {
            permission.child(name).value = value;
        }
        Ok(())
    }
}

impl Keyed for PermissionSettings {
    fn with_key(name: &str) -> Self {
        PermissionSettings {
            name: name.to_string(),
            description: None,
            default: PermissionDefault::True.into(),
            children: KeyedList::new(),
        }
    }
}

// =============================================================================
// DESCRIPTOR SETTINGS
// =============================================================================

/// Configuration for one descriptor format, resolved lazily by `build`
#[derive(Debug, Clone, Default)]
pub struct DescriptorSettings {
    name: Option<ConfigValue>,
    main: Option<ConfigValue>,
    version: Option<ConfigValue>,
    description: Option<ConfigValue>,
    load: Option<ConfigValue>,
    authors: Vec<ConfigValue>,
    author: Option<ConfigValue>,
    website: Option<ConfigValue>,
    database: Option<ConfigValue>,
    prefix: Option<ConfigValue>,
    dependencies: KeyedList<DependencySettings>,
    commands: KeyedList<CommandSettings>,
    permissions: KeyedList<PermissionSettings>,
}

macro_rules! scalar_setting {
    ($($setter:ident => $field:ident),* $(,)?) => {
        $(pub fn $setter(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
            self.$field = Some(value.into());
            self
        })*
    };
}

impl DescriptorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    scalar_setting! {
        set_name => name,
        set_main => main,
        set_version => version,
        set_description => description,
        set_load => load,
        set_website => website,
        set_database => database,
        set_prefix => prefix,
    }

    /// Append one entry to the author list
    pub fn add_author(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.authors.push(value.into());
        self
    }

    /// Single author; when it resolves to a value it replaces the author list
    pub fn set_author(&mut self, value: impl Into<ConfigValue>) -> &mut Self {
        self.author = Some(value.into());
        self
    }

    pub fn dependency(&mut self, name: &str) -> &mut DependencySettings {
        self.dependencies.get_or_create(name)
    }

    pub fn command(&mut self, name: &str) -> &mut CommandSettings {
        self.commands.get_or_create(name)
    }

    pub fn permission(&mut self, name: &str) -> &mut PermissionSettings {
        self.permissions.get_or_create(name)
    }

    pub fn dependencies(&self) -> &KeyedList<DependencySettings> {
        &self.dependencies
    }

    pub fn name(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.name.as_ref())
    }

    pub fn main(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.main.as_ref())
    }

    pub fn version(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.version.as_ref())
    }

    pub fn description(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.description.as_ref())
    }

    pub fn load(&self) -> Result<Option<LoadStage>, DescriptorError> {
        resolve_enum(self.load.as_ref())
    }

    pub fn website(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.website.as_ref())
    }

    pub fn database(&self) -> Result<Option<bool>, DescriptorError> {
        resolve_bool(self.database.as_ref())
    }

    pub fn prefix(&self) -> Result<Option<String>, DescriptorError> {
        resolve_string(self.prefix.as_ref())
    }

    /// Resolved authors: the single `author` if set, otherwise the list
    pub fn authors(&self) -> Result<Vec<String>, DescriptorError> {
        if let Some(author) = resolve_string(self.author.as_ref())? {
            return Ok(vec![author]);
        }
        let mut authors = Vec::with_capacity(self.authors.len());
        for author in &self.authors {
            if let Some(author) = resolve_string(Some(author))? {
                authors.push(author);
            }
        }
        Ok(authors)
    }

    /// Resolve every setting into a new descriptor
    ///
    /// Deferred values are evaluated now, so two builds from the same
    /// settings can differ if the state they read has changed in between.
    pub fn build(&self) -> Result<PluginDescriptor, DescriptorError> {
        let name = self
            .name()?
            .ok_or(DescriptorError::MissingRequiredField("name"))?;
        let mut descriptor = PluginDescriptor::new(name);

        descriptor.main = self.main()?;
        descriptor.version = self.version()?;
        descriptor.description = self.description()?;
        descriptor.load_stage = self.load()?;
        descriptor.authors = self.authors()?;
        descriptor.website = self.website()?;
        descriptor.uses_database = self.database()?;
        descriptor.prefix = self.prefix()?;

        for dependency in &self.dependencies {
            descriptor.dependency(dependency.name()).kind = dependency.kind()?;
        }
        for command in &self.commands {
            command.apply(&mut descriptor)?;
        }
        for permission in &self.permissions {
            permission.apply(&mut descriptor)?;
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_build_keeps_absent_fields_absent() {
        let mut settings = DescriptorSettings::new();
        settings.set_name("TestPlugin").set_version("1.0-SNAPSHOT");

        let Ok(descriptor) = settings.build() else {
            panic!("build failed");
        };
        assert_eq!(descriptor.name(), "TestPlugin");
        assert_eq!(descriptor.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert!(descriptor.main.is_none());
        assert!(descriptor.uses_database.is_none());
        assert!(descriptor.load_stage.is_none());
        assert!(descriptor.authors.is_empty());
    }

    #[test]
    fn test_build_requires_name() {
        let settings = DescriptorSettings::new();
        assert!(matches!(
            settings.build(),
            Err(DescriptorError::MissingRequiredField("name"))
        ));

        let mut settings = DescriptorSettings::new();
        settings.set_name(ConfigValue::deferred(|| None));
        assert!(matches!(
            settings.build(),
            Err(DescriptorError::MissingRequiredField("name"))
        ));
    }

    #[test]
    fn test_build_resolves_typed_fields() {
        let mut settings = DescriptorSettings::new();
        settings
            .set_name("TestPlugin")
            .set_load("STARTUP")
            .set_database("False")
            .add_author("Zartec")
            .add_author("ghac");
        settings.dependency("test2").set_type("SOFTDEPEND");
        settings.dependency("test1");
        settings
            .command("hello")
            .set_description("Says hello")
            .set_aliases(ConfigValue::List(vec!["hi".into(), "hey".into()]));
        settings
            .permission("test.admin")
            .set_default(PermissionDefault::Op)
            .child("test.use")
            .set_value(false);

        let Ok(descriptor) = settings.build() else {
            panic!("build failed");
        };
        assert_eq!(descriptor.load_stage, Some(LoadStage::Startup));
        assert_eq!(descriptor.uses_database, Some(false));
        assert_eq!(descriptor.authors, vec!["Zartec", "ghac"]);

        let deps: Vec<(&str, DependencyType)> = descriptor
            .dependencies
            .iter()
            .map(|d| (d.name(), d.kind))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("test2", DependencyType::Softdepend),
                ("test1", DependencyType::Depend)
            ]
        );

        let command = descriptor.commands.get("hello");
        assert!(command.is_some_and(|c| c.aliases.as_slice() == ["hi", "hey"]));

        let permission = descriptor.permissions.get("test.admin");
        assert!(permission.is_some_and(|p| p.default == PermissionDefault::Op));
        assert!(permission
            .and_then(|p| p.children.get("test.use"))
            .is_some_and(|c| !c.value));
    }

    #[test]
    fn test_invalid_enum_surfaces_at_build() {
        let mut settings = DescriptorSettings::new();
        settings.set_name("TestPlugin");
        settings.dependency("test1").set_type("soft");
        assert!(matches!(
            settings.build(),
            Err(DescriptorError::InvalidEnumValue { kind: "dependency type", .. })
        ));
    }

    #[test]
    fn test_single_author_replaces_list() {
        let mut settings = DescriptorSettings::new();
        settings.set_name("TestPlugin").add_author("A").set_author("B");
        assert!(settings.authors().is_ok_and(|a| a == vec!["B"]));

        settings.set_author(ConfigValue::deferred(|| None));
        assert!(settings.authors().is_ok_and(|a| a == vec!["A"]));
    }

    #[test]
    fn test_repeated_dependency_keeps_one_entry() {
        let mut settings = DescriptorSettings::new();
        settings.dependency("test1").set_type(DependencyType::Loadbefore);
        settings.dependency("test1");
        assert_eq!(settings.dependencies().len(), 1);
        assert!(settings
            .dependencies()
            .get("test1")
            .is_some_and(|d| matches!(d.kind(), Ok(DependencyType::Loadbefore))));
    }

    #[test]
    fn test_deferred_reads_current_state() {
        let version = Arc::new(Mutex::new("1.0".to_string()));
        let source = Arc::clone(&version);
        let mut settings = DescriptorSettings::new();
        settings.set_name("TestPlugin").set_version(ConfigValue::deferred(move || {
            source.lock().ok().map(|v| ConfigValue::Str(v.clone()))
        }));

        assert!(settings
            .build()
            .is_ok_and(|d| d.version.as_deref() == Some("1.0")));
        if let Ok(mut v) = version.lock() {
            *v = "2.0".to_string();
        }
        assert!(settings
            .build()
            .is_ok_and(|d| d.version.as_deref() == Some("2.0")));
    }
}
