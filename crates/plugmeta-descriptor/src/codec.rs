//! Reading and writing descriptor files
//!
//! Both formats are YAML with a fixed root key order. The writer builds an
//! ordered `serde_yaml::Mapping` following the format profile and prefixes it
//! with a two line header. The reader is lenient about shapes the servers
//! themselves accept (a single string where a list is expected, the usual
//! permission default spellings) and strict about everything else.

use crate::errors::DescriptorError;
use crate::format::{AuthorStyle, FormatProfile};
use crate::types::{Dependency, LoadStage, PermissionDefault, PluginDescriptor};
use crate::value::TokenEnum;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

const HEADER_NOTICE: &str = "# Changes to this file are overwritten on every build";

// =============================================================================
// WRITING
// =============================================================================

fn put(map: &mut Mapping, key: &str, value: Value) {
    map.insert(Value::String(key.to_string()), value);
}

fn put_opt(map: &mut Mapping, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        put(map, key, Value::String(value.to_string()));
    }
}

fn string_seq<'a>(items: impl IntoIterator<Item = &'a str>) -> Value {
    Value::Sequence(
        items
            .into_iter()
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

fn permission_default_value(default: PermissionDefault) -> Value {
    match default {
        PermissionDefault::True => Value::Bool(true),
        PermissionDefault::False => Value::Bool(false),
        PermissionDefault::Op => Value::String("op".to_string()),
        PermissionDefault::Notop => Value::String("notop".to_string()),
    }
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()
}

impl FormatProfile {
    /// Build the ordered YAML mapping for `descriptor`
    fn to_mapping(&self, descriptor: &PluginDescriptor) -> Mapping {
        let mut root = Mapping::new();

        put(&mut root, "name", Value::String(descriptor.name().to_string()));
        put_opt(&mut root, "version", descriptor.version.as_deref());
        put_opt(&mut root, "description", descriptor.description.as_deref());
        // `main` is the one field written even when absent
        put(
            &mut root,
            "main",
            descriptor
                .main
                .as_ref()
                .map_or(Value::Null, |main| Value::String(main.clone())),
        );

        if self.supports_load {
            if let Some(load) = descriptor.load_stage {
                put(&mut root, "load", Value::String(load.as_str().to_string()));
            }
        }
        if !descriptor.authors.is_empty() {
            match self.author_style {
                AuthorStyle::List => put(
                    &mut root,
                    "authors",
                    string_seq(descriptor.authors.iter().map(String::as_str)),
                ),
                AuthorStyle::Joined => put(
                    &mut root,
                    "author",
                    Value::String(descriptor.authors.join(", ")),
                ),
            }
        }
        if self.supports_website {
            put_opt(&mut root, "website", descriptor.website.as_deref());
        }
        if self.supports_database {
            if let Some(database) = descriptor.uses_database {
                put(&mut root, "database", Value::Bool(database));
            }
        }
        if self.supports_prefix {
            put_opt(&mut root, "prefix", descriptor.prefix.as_deref());
        }

        for (kind, key) in self.dependency_keys {
            let mut names = descriptor
                .dependencies_of(kind)
                .map(Dependency::name)
                .peekable();
            if names.peek().is_some() {
                put(&mut root, key, string_seq(names));
            }
        }

        if !descriptor.commands.is_empty() {
            let mut commands = Mapping::new();
            for command in &descriptor.commands {
                let mut entry = Mapping::new();
                put_opt(&mut entry, "description", command.description.as_deref());
                if !command.aliases.is_empty() {
                    put(
                        &mut entry,
                        "aliases",
                        string_seq(command.aliases.iter().map(String::as_str)),
                    );
                }
                put_opt(&mut entry, "permission", command.permission.as_deref());
                put_opt(
                    &mut entry,
                    "permission-message",
                    command.permission_message.as_deref(),
                );
                put_opt(&mut entry, "usage", command.usage.as_deref());
                put(&mut commands, command.name(), Value::Mapping(entry));
            }
            put(&mut root, "commands", Value::Mapping(commands));
        }

        if !descriptor.permissions.is_empty() {
            let mut permissions = Mapping::new();
            for permission in &descriptor.permissions {
                let mut entry = Mapping::new();
                put_opt(&mut entry, "description", permission.description.as_deref());
                put(
                    &mut entry,
                    "default",
                    permission_default_value(permission.default),
                );
                if !permission.children.is_empty() {
                    let mut children = Mapping::new();
                    for child in &permission.children {
                        put(&mut children, child.name(), Value::Bool(child.value));
                    }
                    put(&mut entry, "children", Value::Mapping(children));
                }
                put(&mut permissions, permission.name(), Value::Mapping(entry));
            }
            put(&mut root, "permissions", Value::Mapping(permissions));
        }

        root
    }

    /// Render `descriptor` as the text of this format's descriptor file
    pub fn render(&self, descriptor: &PluginDescriptor) -> Result<String, DescriptorError> {
        if descriptor.name().trim().is_empty() {
            return Err(DescriptorError::MissingRequiredField("name"));
        }
        let body = serde_yaml::to_string(&Value::Mapping(self.to_mapping(descriptor)))?;
        Ok(format!(
            "# Generated by plugmeta {}\n{}\n{}",
            env!("CARGO_PKG_VERSION"),
            HEADER_NOTICE,
            body
        ))
    }

    /// Write `descriptor` to `path`, creating parent directories
    ///
    /// The text goes to a sibling temp file first and is renamed into place,
    /// so a failed write never leaves a truncated target behind.
    pub fn write(&self, path: &Path, descriptor: &PluginDescriptor) -> Result<(), DescriptorError> {
        debug!("Writing {} to {:?}", self.file_name, path);
        let content = self.render(descriptor)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("yml.tmp");
        if let Err(err) = write_file(&temp_path, &content) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        info!("Descriptor written to {:?}", path);
        Ok(())
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// Read and parse an existing descriptor file of this format
    pub fn read(&self, path: &Path) -> Result<PluginDescriptor, DescriptorError> {
        debug!("Reading existing {} from {:?}", self.file_name, path);
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(DescriptorError::malformed(path, "file is not valid UTF-8"));
            }
            Err(err) => return Err(err.into()),
        };
        self.parse(&content, path)
    }

    /// Parse descriptor text; `path` is only used for error reporting
    pub fn parse(&self, content: &str, path: &Path) -> Result<PluginDescriptor, DescriptorError> {
        let reader = Reader { path };
        let root: Value =
            serde_yaml::from_str(content).map_err(|e| reader.malformed(e.to_string()))?;
        let Value::Mapping(root) = root else {
            return Err(reader.malformed("top level is not a mapping"));
        };

        let name = reader
            .scalar("name", root.get("name"))?
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| reader.malformed("missing `name`"))?;
        let mut descriptor = PluginDescriptor::new(name);

        descriptor.main = reader.scalar("main", root.get("main"))?;
        descriptor.version = reader.scalar("version", root.get("version"))?;
        descriptor.description = reader.scalar("description", root.get("description"))?;

        if let Some(author) = reader.scalar("author", root.get("author"))? {
            descriptor.add_author(author);
        }
        for author in reader.string_list("authors", root.get("authors"))? {
            descriptor.add_author(author);
        }

        if self.supports_load {
            descriptor.load_stage = match reader.scalar("load", root.get("load"))? {
                Some(load) => Some(
                    LoadStage::from_member_name(&load)
                        .ok_or_else(|| reader.malformed(format!("unknown load stage '{}'", load)))?,
                ),
                None => None,
            };
        }
        if self.supports_website {
            descriptor.website = reader.scalar("website", root.get("website"))?;
        }
        if self.supports_database {
            descriptor.uses_database = reader.boolean("database", root.get("database"))?;
        }
        if self.supports_prefix {
            descriptor.prefix = reader.scalar("prefix", root.get("prefix"))?;
        }

        for (kind, key) in self.dependency_keys {
            for name in reader.string_list(key, root.get(key))? {
                // The first block a name appears in decides its type
                if !descriptor.dependencies.contains(&name) {
                    descriptor.dependency(&name).kind = kind;
                }
            }
        }

        reader.commands(&mut descriptor, root.get("commands"))?;
        reader.permissions(&mut descriptor, root.get("permissions"))?;

        Ok(descriptor)
    }
}

/// Shape checks for one descriptor file
struct Reader<'a> {
    path: &'a Path,
}

impl Reader<'_> {
    fn malformed(&self, reason: impl Into<String>) -> DescriptorError {
        DescriptorError::malformed(self.path, reason)
    }

    fn key_name(&self, key: &Value) -> Result<String, DescriptorError> {
        match key {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.malformed("mapping keys must be scalars")),
        }
    }

    fn scalar(&self, key: &str, value: Option<&Value>) -> Result<Option<String>, DescriptorError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(self.malformed(format!("`{}` must be a scalar", key))),
        }
    }

    fn string_list(
        &self,
        key: &str,
        value: Option<&Value>,
    ) -> Result<Vec<String>, DescriptorError> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Sequence(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match self.scalar(key, Some(item))? {
                        Some(item) => out.push(item),
                        None => {
                            return Err(
                                self.malformed(format!("`{}` contains a null entry", key))
                            )
                        }
                    }
                }
                Ok(out)
            }
            Some(Value::Mapping(_)) | Some(Value::Tagged(_)) => {
                Err(self.malformed(format!("`{}` must be a list", key)))
            }
            Some(other) => Ok(self.scalar(key, Some(other))?.into_iter().collect()),
        }
    }

    fn boolean(&self, key: &str, value: Option<&Value>) -> Result<Option<bool>, DescriptorError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(_) => Err(self.malformed(format!("`{}` must be a boolean", key))),
        }
    }

    fn permission_default(
        &self,
        value: Option<&Value>,
    ) -> Result<PermissionDefault, DescriptorError> {
        let token = match value {
            None | Some(Value::Null) => return Ok(PermissionDefault::default()),
            Some(Value::Bool(true)) => return Ok(PermissionDefault::True),
            Some(Value::Bool(false)) => return Ok(PermissionDefault::False),
            Some(Value::String(s)) => s.to_ascii_lowercase(),
            Some(_) => return Err(self.malformed("permission `default` must be a scalar")),
        };
        match token.as_str() {
            "true" => Ok(PermissionDefault::True),
            "false" => Ok(PermissionDefault::False),
            "op" | "isop" | "operator" | "isoperator" | "admin" | "isadmin" => {
                Ok(PermissionDefault::Op)
            }
            "notop" | "!op" | "not op" | "isnotop" | "!operator" | "notoperator" | "!admin"
            | "notadmin" => Ok(PermissionDefault::Notop),
            _ => Err(self.malformed(format!("unknown permission default '{}'", token))),
        }
    }

    fn section<'v>(
        &self,
        key: &str,
        value: Option<&'v Value>,
    ) -> Result<Option<&'v Mapping>, DescriptorError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Mapping(map)) => Ok(Some(map)),
            Some(_) => Err(self.malformed(format!("`{}` must be a mapping", key))),
        }
    }

    fn commands(
        &self,
        descriptor: &mut PluginDescriptor,
        value: Option<&Value>,
    ) -> Result<(), DescriptorError> {
        let Some(commands) = self.section("commands", value)? else {
            return Ok(());
        };
        for (key, body) in commands {
            let name = self.key_name(key)?;
            let body = self.section(&format!("commands.{}", name), Some(body))?;

            let command = descriptor.command(&name);
            let Some(body) = body else {
                continue;
            };
            command.description = self.scalar("description", body.get("description"))?;
            command.aliases = self
                .string_list("aliases", body.get("aliases"))?
                .into_iter()
                .collect();
            command.permission = self.scalar("permission", body.get("permission"))?;
            command.permission_message =
                self.scalar("permission-message", body.get("permission-message"))?;
            command.usage = self.scalar("usage", body.get("usage"))?;
        }
        Ok(())
    }

    fn permissions(
        &self,
        descriptor: &mut PluginDescriptor,
        value: Option<&Value>,
    ) -> Result<(), DescriptorError> {
        let Some(permissions) = self.section("permissions", value)? else {
            return Ok(());
        };
        for (key, body) in permissions {
            let name = self.key_name(key)?;
            let body = self.section(&format!("permissions.{}", name), Some(body))?;

            let permission = descriptor.permission(&name);
            let Some(body) = body else {
                continue;
            };
            permission.description = self.scalar("description", body.get("description"))?;
            permission.default = self.permission_default(body.get("default"))?;

            match body.get("children") {
                None | Some(Value::Null) => {}
                // A plain list grants every named child
                Some(Value::Sequence(_)) => {
                    for child in self.string_list("children", body.get("children"))? {
                        permission.child(&child).value = true;
                    }
                }
                Some(Value::Mapping(children)) => {
                    for (child, granted) in children {
                        let child = self.key_name(child)?;
                        let granted = self.boolean("children", Some(granted))?.unwrap_or(true);
                        permission.child(&child).value = granted;
                    }
                }
                Some(_) => {
                    return Err(self.malformed(format!(
                        "`permissions.{}.children` must be a mapping or a list",
                        name
                    )))
                }
            }
        }
        Ok(())
    }
}
