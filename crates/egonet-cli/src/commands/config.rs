use anyhow::{Context, Result};
use egonet_config::EgonetConfig;
use std::path::PathBuf;

use crate::cli::ConfigCommands;

/// Execute config subcommand
pub fn execute(cmd: ConfigCommands, effective: &EgonetConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path, force),
        ConfigCommands::Show => show(effective),
    }
}

/// Write the example config file
fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => EgonetConfig::default_config_path()
            .context("Could not determine config file path")?,
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    EgonetConfig::create_example(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created config file at: {}", config_path.display());
    Ok(())
}

/// Print the configuration after file, environment and flag overrides
fn show(effective: &EgonetConfig) -> Result<()> {
    print!("{}", effective.to_toml_string()?);
    Ok(())
}
