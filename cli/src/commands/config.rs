//! Config commands

use std::path::Path;

use crate::config;
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, path: &Path) -> Result<(), String> {
    match action {
        ConfigCommands::Init => {
            if path.exists() {
                return Err(format!("{} already exists", path.display()));
            }
            config::save(&Default::default(), path)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let current = config::load(path)?;
            let updated = config::set(&current, &key, &value)?;
            config::save(&updated, path)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let current = config::load(path)?;
            println!("{}: {}", key, config::get(&current, &key)?);
        }
        ConfigCommands::List => {
            let current = config::load(path)?;
            for (key, value) in config::entries(&current)? {
                println!("{}: {}", key, value);
            }
        }
    }
    Ok(())
}
