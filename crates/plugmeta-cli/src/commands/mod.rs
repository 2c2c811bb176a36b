pub mod generate;
pub mod init;
pub mod show;

use crate::discovery::discover;
use crate::logger;
use anyhow::{Context, Result};
use plugmeta_config::ProjectFile;
use plugmeta_descriptor::GenerationJob;
use std::path::Path;

/// Load the project file, with the path in the error
pub(crate) fn load_project(path: &Path) -> Result<ProjectFile> {
    logger::debug(&format!("Loading project file: {}", path.display()));
    ProjectFile::load(path)
        .with_context(|| format!("Failed to load project file {}", path.display()))
}

/// One job per configured format, in configured order
pub(crate) fn build_jobs(project: &ProjectFile) -> Vec<GenerationJob> {
    let roots = project.resource_roots();
    project
        .generate
        .formats
        .iter()
        .map(|&format| {
            let discovered = discover(&roots, format);
            logger::step(&format!(
                "{}: {} existing file(s), merge {}",
                format,
                discovered.len(),
                if project.generate.merge { "on" } else { "off" }
            ));
            GenerationJob {
                format,
                settings: Some(project.settings(format).clone()),
                discovered,
                merge: project.generate.merge,
                target: project.target(format),
            }
        })
        .collect()
}
