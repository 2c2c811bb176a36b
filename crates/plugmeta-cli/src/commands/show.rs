use super::load_project;
use crate::discovery::discover;
use crate::logger;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Args;
use plugmeta_config::PROJECT_FILE_NAME;
use plugmeta_descriptor::{assemble, Format};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ShowCommand {
    /// Descriptor format: spigot (plugin.yml) or bungee (bungee.yml)
    pub format: Format,

    /// Project file to read
    #[arg(short, long, default_value = PROJECT_FILE_NAME)]
    pub project: PathBuf,

    /// Ignore existing descriptor files in the resource directories
    #[arg(long)]
    pub no_merge: bool,

    /// Print the descriptor as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Print the descriptor that `generate` would write for one format
pub fn handle_show(cmd: ShowCommand, _opts: &GlobalOpts) -> Result<()> {
    let project = load_project(&cmd.project)?;
    let merge = project.generate.merge && !cmd.no_merge;
    let discovered = if merge {
        discover(&project.resource_roots(), cmd.format)
    } else {
        Vec::new()
    };
    logger::debug(&format!(
        "Showing {} with {} existing file(s)",
        cmd.format.file_name(),
        discovered.len()
    ));

    let descriptor = assemble(
        cmd.format,
        Some(project.settings(cmd.format)),
        &discovered,
        merge,
    )
    .with_context(|| format!("Failed to assemble {}", cmd.format.file_name()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        print!("{}", cmd.format.profile().render(&descriptor)?);
    }
    Ok(())
}
