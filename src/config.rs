use failure::Fail;
use log::LevelFilter;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

/// Application configuration, read from a TOML file.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub storage: Storage,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub logging: Logging,
    pub database: Option<Database>,
    /// When set, error responses include detailed exception text.
    #[serde(default)]
    pub devel: bool,
}

pub fn load(path: &str) -> crate::Result<Config> {
    let data = fs::read_to_string(path).map_err(ReadConfigurationError)?;
    let config: Config = toml::from_str(&data).map_err(ConfigurationError)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate configuration correctness.
    pub fn validate(&self) -> Result<(), failure::Error> {
        if self.storage.path.as_os_str().is_empty() {
            return Err(InvalidStorageError.into());
        }

        Ok(())
    }
}

/// Where uploaded files (cover images, gallery images, profile photos)
/// are kept.
#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
    /// Path to the root of the upload directory.
    pub path: PathBuf,
}

/// Document renderer assets.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Render {
    /// Watermark logo stamped on cover pages. Rendering proceeds without
    /// it when the file is missing.
    pub logo: Option<PathBuf>,
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Logging {
    /// Default logging level.
    #[serde(default = "default_level_filter")]
    pub level: LevelFilter,
    /// Custom per-module filters.
    #[serde(default)]
    pub filters: HashMap<String, LevelFilter>,
}

impl Default for Logging {
    fn default() -> Logging {
        Logging {
            level: default_level_filter(),
            filters: HashMap::new(),
        }
    }
}

/// Configure the global logger from the `[logging]` section.
pub fn setup_logging(config: &Logging) -> crate::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(config.level);

    for (module, level) in &config.filters {
        builder.filter_module(module, *level);
    }

    builder.try_init()?;
    Ok(())
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot read configuration file")]
pub struct ReadConfigurationError(#[fail(cause)] std::io::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: {}", _0)]
pub struct ConfigurationError(#[fail(cause)] toml::de::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: storage path is empty")]
pub struct InvalidStorageError;

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}
