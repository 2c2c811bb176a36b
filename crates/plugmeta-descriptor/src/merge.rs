//! Folding on-disk descriptors into the configured one
//!
//! Scalars are gap-filled: a value already present on the base is kept and
//! only missing values are taken from the addition. Folding several files in
//! order therefore lets the first present value win. A non-empty author list
//! replaces the base's list. Keyed collections are never merged.

use crate::types::PluginDescriptor;

fn fill<T>(slot: &mut Option<T>, addition: Option<T>) {
    if slot.is_none() {
        *slot = addition;
    }
}

impl PluginDescriptor {
    /// Fold `addition` into `self` in place
    pub fn absorb(&mut self, addition: PluginDescriptor) {
        fill(&mut self.main, addition.main);
        fill(&mut self.version, addition.version);
        fill(&mut self.description, addition.description);
        fill(&mut self.load_stage, addition.load_stage);
        fill(&mut self.website, addition.website);
        fill(&mut self.uses_database, addition.uses_database);
        fill(&mut self.prefix, addition.prefix);

        if !addition.authors.is_empty() {
            self.authors = addition.authors;
        }
    }
}

/// Combine an optional base with one more descriptor
///
/// Without a base the addition is returned unchanged and becomes the base
/// for the rest of the fold.
pub fn merge(base: Option<PluginDescriptor>, addition: PluginDescriptor) -> PluginDescriptor {
    match base {
        Some(mut base) => {
            base.absorb(addition);
            base
        }
        None => addition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dependency, DependencyType, LoadStage};

    #[test]
    fn test_absent_never_overwrites_present() {
        let mut base = PluginDescriptor::new("X");
        base.version = Some("1.0".to_string());

        let mut addition = PluginDescriptor::new("Y");
        addition.main = Some("eu.x.Main".to_string());

        let merged = merge(Some(base), addition);
        assert_eq!(merged.name(), "X");
        assert_eq!(merged.version.as_deref(), Some("1.0"));
        assert_eq!(merged.main.as_deref(), Some("eu.x.Main"));
    }

    #[test]
    fn test_configured_value_wins_over_file() {
        let mut configured = PluginDescriptor::new("TestPlugin");
        configured.version = Some("1.1-SNAPSHOT".to_string());

        let mut on_disk = PluginDescriptor::new("TestPlugin");
        on_disk.version = Some("1.0-SNAPSHOT".to_string());
        on_disk.main = Some("eu.hexagonmc.Main".to_string());
        on_disk.load_stage = Some(LoadStage::Postworld);

        let merged = merge(Some(configured), on_disk);
        assert_eq!(merged.version.as_deref(), Some("1.1-SNAPSHOT"));
        assert_eq!(merged.main.as_deref(), Some("eu.hexagonmc.Main"));
        assert_eq!(merged.load_stage, Some(LoadStage::Postworld));
    }

    #[test]
    fn test_first_present_value_wins_across_fold() {
        let mut first = PluginDescriptor::new("A");
        first.prefix = Some("first".to_string());
        let mut second = PluginDescriptor::new("B");
        second.prefix = Some("second".to_string());
        second.uses_database = Some(true);

        let merged = [first, second]
            .into_iter()
            .fold(None, |base, next| Some(merge(base, next)));
        let Some(merged) = merged else {
            panic!("fold produced nothing");
        };
        assert_eq!(merged.name(), "A");
        assert_eq!(merged.prefix.as_deref(), Some("first"));
        assert_eq!(merged.uses_database, Some(true));
    }

    #[test]
    fn test_authors_replace_not_append() {
        let mut base = PluginDescriptor::new("X");
        base.add_author("A");

        let mut addition = PluginDescriptor::new("X");
        addition.add_author("B");
        addition.add_author("C");
        let merged = merge(Some(base), addition);
        assert_eq!(merged.authors, vec!["B", "C"]);

        let merged = merge(Some(merged), PluginDescriptor::new("X"));
        assert_eq!(merged.authors, vec!["B", "C"]);
    }

    #[test]
    fn test_keyed_collections_come_from_base() {
        let mut base = PluginDescriptor::new("X");
        base.dependency("Vault");

        let mut addition = PluginDescriptor::new("X");
        addition.dependency("WorldEdit").kind = DependencyType::Softdepend;
        addition.command("hello");
        addition.permission("x.use");

        let merged = merge(Some(base), addition);
        let names: Vec<&str> = merged.dependencies.iter().map(Dependency::name).collect();
        assert_eq!(names, vec!["Vault"]);
        assert!(merged.commands.is_empty());
        assert!(merged.permissions.is_empty());
    }

    #[test]
    fn test_missing_base_takes_addition_whole() {
        let mut addition = PluginDescriptor::new("OnDisk");
        addition.command("hello");
        let merged = merge(None, addition);
        assert_eq!(merged.name(), "OnDisk");
        assert_eq!(merged.commands.len(), 1);
    }
}
