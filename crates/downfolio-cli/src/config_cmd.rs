//! `downfolio config` subcommands. Values are always printed masked since the
//! store mostly holds API keys.

use anyhow::{Result, bail};

use downfolio_store::{ConfigStore, Profile};

use crate::ConfigCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub fn run_config_command(command: ConfigCommands, profile: &Profile) -> Result<()> {
    let config = ConfigStore::for_profile(profile);
    match command {
        ConfigCommands::Set { key, value } => {
            config.set_value(&key, &value)?;
            println!("Config {key:?} set.");
        }
        ConfigCommands::Update { key, value } => {
            let Some(current) = config.get_value(&key) else {
                bail!("config {key:?} not found; use `downfolio config set` to add it");
            };
            println!("Current value: {}", mask(&current));
            config.set_value(&key, &value)?;
            println!("Config {key:?} updated.");
        }
        ConfigCommands::Get { key } => match config.get_value(&key) {
            Some(value) => println!("{key}: {}", mask(&value)),
            None => bail!("config {key:?} not found"),
        },
        ConfigCommands::List => {
            let all = config.all();
            if all.is_empty() {
                println!("No configuration found. Use `downfolio config set` to add a value.");
                return Ok(());
            }
            println!("Configuration ({}):", config.path().display());
            for (key, value) in &all {
                println!("  {key}: {}", mask(value));
            }
        }
    }
    Ok(())
}

/// One `*` per character of `value`.
fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}
