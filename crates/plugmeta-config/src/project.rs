//! Ambient project state and the default descriptor settings derived from it
//!
//! Defaults that depend on the project (version, description, website) are
//! deferred reads of the shared state, so changing the project after the
//! settings were created still changes the next build.

use parking_lot::RwLock;
use plugmeta_descriptor::{ConfigValue, DescriptorSettings, Format};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Project metadata read by deferred configuration values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Free-form project properties such as `url`
    pub properties: BTreeMap<String, String>,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        ProjectInfo {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn into_shared(self) -> SharedProject {
        Arc::new(RwLock::new(self))
    }
}

/// Project state shared between the loader and deferred values
pub type SharedProject = Arc<RwLock<ProjectInfo>>;

fn deferred_read<F>(project: &SharedProject, read: F) -> ConfigValue
where
    F: Fn(&ProjectInfo) -> Option<String> + Send + Sync + 'static,
{
    let project = Arc::clone(project);
    ConfigValue::deferred(move || read(&project.read()).map(ConfigValue::Str))
}

/// Settings every generated descriptor starts from
///
/// The name is taken from the project right away; version and description
/// follow the project lazily. Spigot descriptors also default their website
/// to the `url` property, falling back to `website`.
pub fn default_settings(project: &SharedProject, format: Format) -> DescriptorSettings {
    let mut settings = DescriptorSettings::new();
    settings
        .set_name(project.read().name.clone())
        .set_version(deferred_read(project, |p| p.version.clone()))
        .set_description(deferred_read(project, |p| p.description.clone()));

    if format == Format::Spigot {
        settings.set_website(deferred_read(project, |p| {
            p.property("url").or_else(|| p.property("website")).map(str::to_string)
        }));
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> SharedProject {
        let mut info = ProjectInfo::new("TestPlugin");
        info.version = Some("1.0-SNAPSHOT".to_string());
        info.description = Some("Test meta".to_string());
        info.into_shared()
    }

    #[test]
    fn test_defaults_follow_project() {
        let project = project();
        let settings = default_settings(&project, Format::Spigot);

        let Ok(first) = settings.build() else {
            panic!("build failed");
        };
        assert_eq!(first.name(), "TestPlugin");
        assert_eq!(first.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert_eq!(first.description.as_deref(), Some("Test meta"));
        assert!(first.website.is_none());

        project.write().version = Some("1.1-SNAPSHOT".to_string());
        assert!(settings
            .build()
            .is_ok_and(|d| d.version.as_deref() == Some("1.1-SNAPSHOT")));
    }

    #[test]
    fn test_website_prefers_url_property() {
        let project = project();
        project
            .write()
            .properties
            .insert("website".to_string(), "https://fallback.example/".to_string());
        let settings = default_settings(&project, Format::Spigot);
        assert!(settings
            .website()
            .is_ok_and(|w| w.as_deref() == Some("https://fallback.example/")));

        project
            .write()
            .properties
            .insert("url".to_string(), "https://example.org/".to_string());
        assert!(settings
            .website()
            .is_ok_and(|w| w.as_deref() == Some("https://example.org/")));
    }

    #[test]
    fn test_bungee_has_no_website_default() {
        let project = project();
        project
            .write()
            .properties
            .insert("url".to_string(), "https://example.org/".to_string());
        let settings = default_settings(&project, Format::Bungee);
        assert!(settings.website().is_ok_and(|w| w.is_none()));
    }
}
