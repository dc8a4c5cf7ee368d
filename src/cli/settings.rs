//! The `settings` group of CLI commands.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Commands for inspecting and editing the settings file
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in an editor
    Edit,
    /// Print where the settings file is read from
    Path,
    /// Print a default `settings.toml` to the console
    DumpDefault,
}

impl SettingsSubcommands {
    /// Run the chosen settings command
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => edit_settings(),
            Self::Path => {
                println!("{}", get_settings_file_path().display());
                Ok(())
            }
            Self::DumpDefault => {
                print!("{}", Settings::default_file_contents());
                Ok(())
            }
        }
    }
}

/// Open the settings file in the user's editor, creating it first if needed
fn edit_settings() -> Result<()> {
    let file_path = get_settings_file_path();
    ensure_settings_file_exists(&file_path)?;

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(&file_path)?;

    Ok(())
}

/// Create the settings file with default contents if it is not there yet
fn ensure_settings_file_exists(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        return Ok(());
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }

    fs::write(file_path, Settings::default_file_contents())?;

    Ok(())
}
