//! `plugmeta.toml` loading
//!
//! The `[project]` table becomes the shared ambient project state,
//! `[generate]` holds pipeline options, and `[spigot]`/`[bungee]` are applied
//! on top of the default settings of each format. Values outside what
//! descriptor settings accept (tables in scalar position, datetimes) are
//! rejected while loading.

use crate::errors::ConfigError;
use crate::project::{default_settings, ProjectInfo, SharedProject};
use plugmeta_descriptor::{ConfigValue, DescriptorSettings, Format};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default project file name looked up by the CLI
pub const PROJECT_FILE_NAME: &str = "plugmeta.toml";

// =============================================================================
// RAW FILE LAYOUT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProjectFile {
    #[serde(default)]
    project: RawProject,
    #[serde(default)]
    generate: GenerateOptions,
    spigot: Option<toml::Table>,
    bungee: Option<toml::Table>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

/// `[generate]` options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GenerateOptions {
    /// Fold existing descriptor files into the configured ones
    pub merge: bool,
    /// Formats to generate, in order
    pub formats: Vec<Format>,
    /// Directories scanned for existing descriptors, relative to the project root
    pub resources: Vec<PathBuf>,
    /// Output directory, relative to the project root
    pub output_dir: PathBuf,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            merge: true,
            formats: Format::ALL.to_vec(),
            resources: vec![PathBuf::from("src/main/resources")],
            output_dir: PathBuf::from("build/tmp/generateMetadata"),
        }
    }
}

// =============================================================================
// PROJECT FILE
// =============================================================================

/// A loaded project file
#[derive(Debug)]
pub struct ProjectFile {
    root: PathBuf,
    project: SharedProject,
    pub generate: GenerateOptions,
    spigot: DescriptorSettings,
    bungee: DescriptorSettings,
}

impl ProjectFile {
    /// Load a project file; its directory becomes the project root
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading project file {:?}", path);
        let content = fs::read_to_string(path)?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::parse(&content, &root)
    }

    /// Parse project file text with `root` as the project directory
    pub fn parse(content: &str, root: &Path) -> Result<Self, ConfigError> {
        let raw: RawProjectFile = toml::from_str(content)?;

        let name = match raw.project.name {
            Some(name) => name,
            None => directory_name(root).ok_or_else(|| {
                ConfigError::unsupported(
                    "project.name",
                    "not set and the project directory has no usable name",
                )
            })?,
        };
        let project = ProjectInfo {
            name,
            version: raw.project.version,
            description: raw.project.description,
            properties: raw.project.properties,
        }
        .into_shared();

        let mut spigot = default_settings(&project, Format::Spigot);
        if let Some(table) = &raw.spigot {
            apply_format_table(&mut spigot, Format::Spigot, table)?;
        }
        let mut bungee = default_settings(&project, Format::Bungee);
        if let Some(table) = &raw.bungee {
            apply_format_table(&mut bungee, Format::Bungee, table)?;
        }

        Ok(ProjectFile {
            root: root.to_path_buf(),
            project,
            generate: raw.generate,
            spigot,
            bungee,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &SharedProject {
        &self.project
    }

    pub fn settings(&self, format: Format) -> &DescriptorSettings {
        match format {
            Format::Spigot => &self.spigot,
            Format::Bungee => &self.bungee,
        }
    }

    /// Resource directories resolved against the project root
    pub fn resource_roots(&self) -> Vec<PathBuf> {
        self.generate
            .resources
            .iter()
            .map(|dir| self.root.join(dir))
            .collect()
    }

    /// Output path of `format`'s descriptor
    pub fn target(&self, format: Format) -> PathBuf {
        self.root
            .join(&self.generate.output_dir)
            .join(format.file_name())
    }
}

fn directory_name(root: &Path) -> Option<String> {
    let named = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    };
    named(root).or_else(|| root.canonicalize().ok().as_deref().and_then(named))
}

/// Starter project file written by `plugmeta init`
///
/// The name is emitted as a TOML string literal, so quotes and backslashes
/// in a directory name survive the round trip.
pub fn starter_template(name: &str) -> String {
    let quoted_name = toml::Value::from(name).to_string();
    let quoted_main = toml::Value::from(format!("com.example.{}", name)).to_string();
    format!(
        r#"[project]
name = {quoted_name}
version = "1.0.0"
description = "A new plugin"

[generate]
merge = true
resources = ["src/main/resources"]
output-dir = "build/tmp/generateMetadata"

[spigot]
main = {quoted_main}
authors = []

[spigot.commands]

[spigot.permissions]

[bungee]
main = {quoted_main}
"#
    )
}

// =============================================================================
// FORMAT TABLES
// =============================================================================

fn to_config_value(key: &str, value: &toml::Value) -> Result<ConfigValue, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(ConfigValue::Str(s.clone())),
        toml::Value::Integer(i) => Ok(ConfigValue::Int(*i)),
        toml::Value::Float(f) => Ok(ConfigValue::Float(*f)),
        toml::Value::Boolean(b) => Ok(ConfigValue::Bool(*b)),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| to_config_value(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(ConfigValue::List),
        toml::Value::Datetime(_) => {
            Err(ConfigError::unsupported(key, "datetimes are not supported"))
        }
        toml::Value::Table(_) => Err(ConfigError::unsupported(
            key,
            "expected a value, found a table",
        )),
    }
}

fn as_table<'a>(key: &str, value: &'a toml::Value) -> Result<&'a toml::Table, ConfigError> {
    value
        .as_table()
        .ok_or_else(|| ConfigError::unsupported(key, "expected a table"))
}

fn unknown(section: &str, key: &str) -> ConfigError {
    ConfigError::UnknownKey {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn apply_format_table(
    settings: &mut DescriptorSettings,
    format: Format,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    let section = format.as_str();
    let profile = format.profile();

    for (key, value) in table {
        let path = format!("{}.{}", section, key);
        let supported = match key.as_str() {
            "load" => profile.supports_load,
            "website" => profile.supports_website,
            "database" => profile.supports_database,
            "prefix" => profile.supports_prefix,
            _ => true,
        };
        if !supported {
            warn!("`{}` is not written to {}", path, profile.file_name);
        }

        match key.as_str() {
            "name" => {
                settings.set_name(to_config_value(&path, value)?);
            }
            "main" => {
                settings.set_main(to_config_value(&path, value)?);
            }
            "version" => {
                settings.set_version(to_config_value(&path, value)?);
            }
            "description" => {
                settings.set_description(to_config_value(&path, value)?);
            }
            "load" => {
                settings.set_load(to_config_value(&path, value)?);
            }
            "website" => {
                settings.set_website(to_config_value(&path, value)?);
            }
            "database" => {
                settings.set_database(to_config_value(&path, value)?);
            }
            "prefix" => {
                settings.set_prefix(to_config_value(&path, value)?);
            }
            "author" => {
                settings.set_author(to_config_value(&path, value)?);
            }
            "authors" => match value {
                toml::Value::Array(items) => {
                    for item in items {
                        settings.add_author(to_config_value(&path, item)?);
                    }
                }
                other => {
                    settings.add_author(to_config_value(&path, other)?);
                }
            },
            "dependencies" => apply_dependencies(settings, &path, as_table(&path, value)?)?,
            "commands" => apply_commands(settings, &path, as_table(&path, value)?)?,
            "permissions" => apply_permissions(settings, &path, as_table(&path, value)?)?,
            _ => return Err(unknown(section, key)),
        }
    }
    Ok(())
}

fn apply_dependencies(
    settings: &mut DescriptorSettings,
    section: &str,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let path = format!("{}.{}", section, name);
        let dependency = settings.dependency(name);
        match value {
            toml::Value::Table(fields) => {
                for (key, value) in fields {
                    match key.as_str() {
                        "type" => {
                            dependency.set_type(to_config_value(&path, value)?);
                        }
                        _ => return Err(unknown(&path, key)),
                    }
                }
            }
            other => {
                dependency.set_type(to_config_value(&path, other)?);
            }
        }
    }
    Ok(())
}

fn apply_commands(
    settings: &mut DescriptorSettings,
    section: &str,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let path = format!("{}.{}", section, name);
        let fields = as_table(&path, value)?;
        let command = settings.command(name);
        for (key, value) in fields {
            let value = to_config_value(&format!("{}.{}", path, key), value)?;
            match key.as_str() {
                "description" => command.set_description(value),
                "aliases" => command.set_aliases(value),
                "permission" => command.set_permission(value),
                "permission-message" => command.set_permission_message(value),
                "usage" => command.set_usage(value),
                _ => return Err(unknown(&path, key)),
            };
        }
    }
    Ok(())
}

fn apply_permissions(
    settings: &mut DescriptorSettings,
    section: &str,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let path = format!("{}.{}", section, name);
        let fields = as_table(&path, value)?;
        let permission = settings.permission(name);
        for (key, value) in fields {
            let key_path = format!("{}.{}", path, key);
            match key.as_str() {
                "description" => {
                    permission.set_description(to_config_value(&key_path, value)?);
                }
                "default" => {
                    permission.set_default(to_config_value(&key_path, value)?);
                }
                "children" => match value {
                    toml::Value::Table(children) => {
                        for (child, granted) in children {
                            let child_path = format!("{}.{}", key_path, child);
                            let granted = to_config_value(&child_path, granted)?;
                            permission.child(child).set_value(granted);
                        }
                    }
                    toml::Value::Array(children) => {
                        for child in children {
                            let Some(child) = child.as_str() else {
                                return Err(ConfigError::unsupported(
                                    key_path,
                                    "child names must be strings",
                                ));
                            };
                            permission.child(child);
                        }
                    }
                    _ => {
                        return Err(ConfigError::unsupported(
                            key_path,
                            "expected a table or a list of names",
                        ))
                    }
                },
                _ => return Err(unknown(&path, key)),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugmeta_descriptor::{DependencyType, DescriptorError, LoadStage, PermissionDefault};
    use tempfile::TempDir;

    const FULL: &str = r#"
[project]
name = "TestPlugin"
version = "1.0-SNAPSHOT"
description = "Test meta"
[project.properties]
url = "https://example.org/"

[generate]
merge = false
output-dir = "out"

[spigot]
main = "eu.example.Main"
load = "STARTUP"
authors = ["Zartec", "ghac"]
database = false
prefix = "TP"
[spigot.dependencies]
WorldEdit = "DEPEND"
Vault = "SOFTDEPEND"
Essentials = { type = "LOADBEFORE" }
[spigot.commands.hello]
description = "Says hello"
aliases = ["hi", "hey"]
permission-message = "Nope"
[spigot.permissions."example.admin"]
default = "OP"
children = { "example.use" = true, "example.ban" = false }

[bungee]
author = "Zartec"
"#;

    fn parse(content: &str) -> Result<ProjectFile, ConfigError> {
        ProjectFile::parse(content, Path::new("/tmp/project"))
    }

    #[test]
    fn test_full_project_file() {
        let result = parse(FULL);
        let Ok(file) = result else {
            panic!("parse failed: {:?}", result.err());
        };
        assert!(!file.generate.merge);
        assert_eq!(file.generate.formats, Format::ALL.to_vec());
        assert_eq!(
            file.target(Format::Bungee),
            PathBuf::from("/tmp/project/out/bungee.yml")
        );

        let result = file.settings(Format::Spigot).build();
        let Ok(spigot) = result else {
            panic!("build failed: {:?}", result.err());
        };
        assert_eq!(spigot.name(), "TestPlugin");
        assert_eq!(spigot.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert_eq!(spigot.website.as_deref(), Some("https://example.org/"));
        assert_eq!(spigot.load_stage, Some(LoadStage::Startup));
        assert_eq!(spigot.uses_database, Some(false));
        assert_eq!(spigot.authors, vec!["Zartec", "ghac"]);

        let deps: Vec<(&str, DependencyType)> = spigot
            .dependencies
            .iter()
            .map(|d| (d.name(), d.kind))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("WorldEdit", DependencyType::Depend),
                ("Vault", DependencyType::Softdepend),
                ("Essentials", DependencyType::Loadbefore),
            ]
        );
        assert!(spigot
            .commands
            .get("hello")
            .is_some_and(|c| c.aliases.as_slice() == ["hi", "hey"]
                && c.permission_message.as_deref() == Some("Nope")));
        let Some(admin) = spigot.permissions.get("example.admin") else {
            panic!("permission missing");
        };
        assert_eq!(admin.default, PermissionDefault::Op);
        assert!(admin.children.get("example.ban").is_some_and(|c| !c.value));

        let result = file.settings(Format::Bungee).build();
        let Ok(bungee) = result else {
            panic!("build failed: {:?}", result.err());
        };
        assert_eq!(bungee.authors, vec!["Zartec"]);
        assert!(bungee.website.is_none());
        assert!(bungee.dependencies.is_empty());
    }

    #[test]
    fn test_generate_defaults() {
        let Ok(file) = parse("[project]\nname = \"X\"\n") else {
            panic!("parse failed");
        };
        assert_eq!(file.generate, GenerateOptions::default());
        assert_eq!(
            file.resource_roots(),
            vec![PathBuf::from("/tmp/project/src/main/resources")]
        );
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        let Ok(file) = parse("") else {
            panic!("parse failed");
        };
        assert_eq!(file.project().read().name, "project");
        assert!(file
            .settings(Format::Spigot)
            .name()
            .is_ok_and(|n| n.as_deref() == Some("project")));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            parse("[spigot]\nmian = \"x\"\n"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(matches!(
            parse("[spigot.commands.hello]\nalias = [\"x\"]\n"),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(matches!(parse("[velocity]\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unsupported_values_rejected() {
        assert!(matches!(
            parse("[spigot]\nmain = { class = \"x\" }\n"),
            Err(ConfigError::UnsupportedValue { .. })
        ));
        assert!(matches!(
            parse("[spigot]\nversion = 1979-05-27T07:32:00Z\n"),
            Err(ConfigError::UnsupportedValue { .. })
        ));
        assert!(matches!(
            parse("[spigot]\ncommands = \"hello\"\n"),
            Err(ConfigError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn test_invalid_enum_surfaces_at_build() {
        let Ok(file) = parse("[spigot.dependencies]\nVault = \"soft\"\n") else {
            panic!("parse failed");
        };
        assert!(matches!(
            file.settings(Format::Spigot).build(),
            Err(DescriptorError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join(PROJECT_FILE_NAME);
        let Ok(()) = fs::write(&path, FULL) else {
            return;
        };
        let loaded = ProjectFile::load(&path);
        assert!(loaded.is_ok_and(|f| f.root() == temp_dir.path()
            && f.target(Format::Spigot) == temp_dir.path().join("out").join("plugin.yml")));
    }

    #[test]
    fn test_starter_template_parses() {
        let template = starter_template("Demo");
        let result = parse(&template);
        let Ok(file) = result else {
            panic!("starter template invalid: {:?}", result.err());
        };
        assert!(file
            .settings(Format::Spigot)
            .build()
            .is_ok_and(|d| d.name() == "Demo" && d.main.as_deref() == Some("com.example.Demo")));
    }

    #[test]
    fn test_starter_template_escapes_name() {
        let name = r#"odd\dir "quoted""#;
        let result = parse(&starter_template(name));
        let Ok(file) = result else {
            panic!("starter template invalid: {:?}", result.err());
        };
        assert_eq!(file.project().read().name, name);
        assert!(file
            .settings(Format::Bungee)
            .main()
            .is_ok_and(|m| m == Some(format!("com.example.{}", name))));
    }

    #[test]
    fn test_keys_the_format_does_not_write_are_accepted() {
        let result = parse("[project]\nname = \"Proxy\"\n[bungee]\nload = \"STARTUP\"\n");
        let Ok(file) = result else {
            panic!("parse failed: {:?}", result.err());
        };
        let Ok(descriptor) = file.settings(Format::Bungee).build() else {
            panic!("build failed");
        };
        let rendered = Format::Bungee.profile().render(&descriptor);
        assert!(rendered
            .is_ok_and(|text| text.contains("name: Proxy") && !text.contains("load:")));
    }
}
