use crate::logger;
use crate::GlobalOpts;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use plugmeta_config::{starter_template, PROJECT_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "MyPlugin";

#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Project file to create (default: plugmeta.toml)
    pub file: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Plugin name suggested for a new project: the directory it lives in
fn suggested_name(target: &Path) -> String {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    dir.canonicalize()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Write a starter project file
pub fn handle_init(cmd: InitCommand, _opts: &GlobalOpts) -> Result<()> {
    let target = cmd.file.unwrap_or_else(|| PathBuf::from(PROJECT_FILE_NAME));
    logger::debug(&format!("Target file: {}", target.display()));

    if target.exists() && !cmd.force {
        bail!(
            "File '{}' already exists (use --force to overwrite)",
            target.display()
        );
    }

    let name = suggested_name(&target);
    fs::write(&target, starter_template(&name))
        .with_context(|| format!("Failed to create project file {}", target.display()))?;

    logger::success(&format!("Created project file: {}", target.display()));
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} with your plugin metadata",
        target.display().to_string().bold()
    );
    println!("  2. Preview the result: plugmeta show spigot");
    println!("  3. Write the descriptors: plugmeta generate");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let target = temp_dir.path().join(PROJECT_FILE_NAME);
        let Ok(()) = fs::write(&target, "# keep me\n") else {
            return;
        };

        let cmd = InitCommand {
            file: Some(target.clone()),
            force: false,
        };
        assert!(handle_init(cmd, &GlobalOpts::default()).is_err());
        assert!(fs::read_to_string(&target).is_ok_and(|c| c == "# keep me\n"));

        let cmd = InitCommand {
            file: Some(target.clone()),
            force: true,
        };
        assert!(handle_init(cmd, &GlobalOpts::default()).is_ok());
        assert!(fs::read_to_string(&target).is_ok_and(|c| c.contains("[project]")));
    }

    #[test]
    fn test_suggested_name_uses_directory() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let project_dir = temp_dir.path().join("CoolPlugin");
        let Ok(()) = fs::create_dir_all(&project_dir) else {
            return;
        };
        assert_eq!(
            suggested_name(&project_dir.join(PROJECT_FILE_NAME)),
            "CoolPlugin"
        );
    }
}
