//! Configuration management commands.

use clap::Subcommand;
use tidyroom_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration
    Show,
    /// Get a value by dot-separated key
    Get {
        /// Key, e.g. session.daily_target
        key: String,
    },
    /// Set a value by dot-separated key
    Set {
        /// Key, e.g. session.daily_target
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
