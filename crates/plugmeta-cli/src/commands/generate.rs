use super::{build_jobs, load_project};
use crate::logger;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Args;
use plugmeta_config::PROJECT_FILE_NAME;
use plugmeta_descriptor::generate_all;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Project file to read
    #[arg(short, long, default_value = PROJECT_FILE_NAME)]
    pub project: PathBuf,

    /// Ignore existing descriptor files in the resource directories
    #[arg(long)]
    pub no_merge: bool,

    /// Output directory, relative to the project root
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Resource directories to scan, relative to the project root (repeatable)
    #[arg(short, long = "resources", value_name = "DIR")]
    pub resources: Vec<PathBuf>,
}

/// Generate every configured descriptor and write it to the output directory
pub fn handle_generate(cmd: GenerateCommand, _opts: &GlobalOpts) -> Result<()> {
    let mut project = load_project(&cmd.project)?;
    if cmd.no_merge {
        project.generate.merge = false;
    }
    if let Some(output_dir) = cmd.output_dir {
        project.generate.output_dir = output_dir;
    }
    if !cmd.resources.is_empty() {
        project.generate.resources = cmd.resources;
    }

    let jobs = build_jobs(&project);
    let reports = generate_all(&jobs).context("Failed to generate plugin descriptors")?;

    for report in reports {
        let merged = match report.merged_sources {
            0 => String::new(),
            1 => " (merged 1 existing file)".to_string(),
            n => format!(" (merged {} existing files)", n),
        };
        logger::success(&format!(
            "Generated {}{}",
            report.target.display(),
            merged
        ));
    }
    Ok(())
}
