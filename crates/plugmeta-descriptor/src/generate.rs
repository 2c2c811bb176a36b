//! Generation pipeline: build, fold, write
//!
//! Each format runs independently. The configured settings produce the base
//! descriptor, every discovered file of the same format is parsed and folded
//! into it in discovery order, and the result is written to the target. All
//! files are parsed before anything is written, so a malformed file leaves
//! the target untouched.

use crate::errors::DescriptorError;
use crate::format::Format;
use crate::merge::merge;
use crate::settings::DescriptorSettings;
use crate::types::PluginDescriptor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One format's generation request
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub format: Format,
    /// Configured settings; `None` when the project does not configure this format
    pub settings: Option<DescriptorSettings>,
    /// Existing descriptor files, folded in this order
    pub discovered: Vec<PathBuf>,
    pub merge: bool,
    pub target: PathBuf,
}

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub format: Format,
    pub target: PathBuf,
    /// Number of on-disk descriptors folded into the result
    pub merged_sources: usize,
}

/// Build the final descriptor for `format` without writing it
pub fn assemble(
    format: Format,
    settings: Option<&DescriptorSettings>,
    discovered: &[PathBuf],
    merge_enabled: bool,
) -> Result<PluginDescriptor, DescriptorError> {
    let profile = format.profile();
    let mut descriptor = settings.map(DescriptorSettings::build).transpose()?;

    if merge_enabled {
        for path in discovered {
            let addition = profile.read(path)?;
            debug!("Merging {:?} into {} descriptor", path, format);
            descriptor = Some(merge(descriptor, addition));
        }
    } else if !discovered.is_empty() {
        debug!(
            "Merging disabled, ignoring {} existing {}",
            discovered.len(),
            profile.file_name
        );
    }

    descriptor.ok_or(DescriptorError::MissingRequiredField("name"))
}

/// Run one format pipeline and write the result to `target`
pub fn generate(
    format: Format,
    settings: Option<&DescriptorSettings>,
    discovered: &[PathBuf],
    merge_enabled: bool,
    target: &Path,
) -> Result<GenerationReport, DescriptorError> {
    info!("Generating {} for {}", format.file_name(), format);
    let descriptor = assemble(format, settings, discovered, merge_enabled)?;
    format.profile().write(target, &descriptor)?;

    Ok(GenerationReport {
        format,
        target: target.to_path_buf(),
        merged_sources: if merge_enabled { discovered.len() } else { 0 },
    })
}

/// Run every job in order, stopping at the first failure
///
/// Targets written by jobs that already finished are kept.
pub fn generate_all(jobs: &[GenerationJob]) -> Result<Vec<GenerationReport>, DescriptorError> {
    let mut reports = Vec::with_capacity(jobs.len());
    for job in jobs {
        let report = generate(
            job.format,
            job.settings.as_ref(),
            &job.discovered,
            job.merge,
            &job.target,
        )?;
        reports.push(report);
    }
    Ok(reports)
}
