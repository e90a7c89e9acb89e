use config::{Config, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use super::error::Result;

lazy_static! {
    // Global configuration state, written once at startup and on explicit set().
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

/// Logging section of the application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

/// Mirror section - defaults for the reconciliation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Seconds between reconciliation passes.
    pub interval: u64,
    /// Compare file content by digest instead of modification time.
    pub checksum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub debug: bool,
    pub log: LogConfig,
    pub mirror: MirrorConfig,
}

impl AppConfig {
    /// Initialize the global configuration from the embedded defaults.
    /// Environment variables prefixed with `APP` override file values.
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut builder = Config::builder();

        if let Some(contents) = default_config {
            builder = builder.add_source(File::from_str(contents, FileFormat::Toml));
        }

        builder = builder.add_source(Environment::with_prefix("APP").separator("_"));

        let settings = builder.build()?;
        *CONFIG.write()? = settings;

        Ok(())
    }

    /// Merge an additional configuration file over the current state.
    pub fn merge_config(config_file: Option<&str>) -> Result<()> {
        if let Some(path) = config_file {
            let current = CONFIG.read()?.clone();
            let settings = Config::builder()
                .add_source(current)
                .add_source(File::with_name(path))
                .build()?;
            *CONFIG.write()? = settings;
        }

        Ok(())
    }

    /// Set a single configuration value by dotted key.
    pub fn set(key: &str, value: &str) -> Result<()> {
        let current = CONFIG.read()?.clone();
        let settings = Config::builder()
            .add_source(current)
            .set_override(key, value)?
            .build()?;
        *CONFIG.write()? = settings;

        Ok(())
    }

    /// Get a single configuration value by dotted key.
    pub fn get<'de, T>(key: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        Ok(CONFIG.read()?.get::<T>(key)?)
    }

    /// Deserialize the whole configuration into a typed struct.
    pub fn fetch() -> Result<AppConfig> {
        Ok(CONFIG.read()?.clone().try_deserialize()?)
    }
}
