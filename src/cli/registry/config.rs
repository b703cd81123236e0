use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};

/// Preferences for the registry CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rows per page when `search` gets a page without a limit
    pub page_size: u32,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 10,
            pretty: true,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_default().join("business-registry")
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self, io::Error> {
        let config_dir = config_dir();
        let config_path = config_dir.join("cli.toml");

        if !config_path.exists() {
            // Create default config if it doesn't exist
            fs::create_dir_all(&config_dir)?;
            let default_config = Self::default();
            let toml = toml::to_string_pretty(&default_config)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            fs::write(&config_path, toml)?;
            return Ok(default_config);
        }

        let config_str = fs::read_to_string(&config_path)?;
        Self::parse(&config_str)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), io::Error> {
        let config_dir = config_dir();
        fs::create_dir_all(&config_dir)?;
        let toml = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(config_dir.join("cli.toml"), toml)?;

        Ok(())
    }

    fn parse(config_str: &str) -> Result<Self, io::Error> {
        toml::from_str::<Config>(config_str).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
