//! Loads the public asset directory settings from a TOML file.
//!
//! ```toml
//! public_dir = "public"
//! cache_control = "public, max-age=3600"
//! gzip = true
//! brotli = false
//! buffer_size = 65536
//! ```
//!
//! Every key is optional; missing keys take the same defaults as `FileOptions`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::handler::{AssetError, FileHandler, FileOptions};

/// Errors raised while loading an `AssetConfig` or building its `FileHandler`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file couldn't be read.
    #[error("unable to read {path:?}: {source}")]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration isn't valid TOML, or has values of the wrong type.
    #[error("invalid asset configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured public directory can't be served.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Settings for the public asset directory.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    /// The directory static routes serve files from.
    pub public_dir: PathBuf,
    /// The `Cache-Control` header sent with every file.
    pub cache_control: String,
    /// Serve `.gz` variants to clients accepting gzip.
    pub gzip: bool,
    /// Serve `.br` variants to clients accepting brotli.
    pub brotli: bool,
    /// Read buffer size. When unset, the filesystem block size is used.
    pub buffer_size: Option<usize>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let options = FileOptions::new("public");
        AssetConfig {
            public_dir: options.root().to_path_buf(),
            cache_control: options.cache_control().to_owned(),
            gzip: false,
            brotli: false,
            buffer_size: None,
        }
    }
}

impl AssetConfig {
    /// Parses the configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<AssetConfig, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads the configuration from the TOML file at `path`. A relative `public_dir` is taken
    /// relative to the directory holding the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AssetConfig, ConfigError> {
        let path = path.as_ref();
        debug!(" loading asset configuration from {:?}", path);

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = AssetConfig::from_toml_str(&contents)?;
        if config.public_dir.is_relative() {
            if let Some(dir) = path.parent() {
                config.public_dir = dir.join(&config.public_dir);
            }
        }
        Ok(config)
    }

    /// The `FileOptions` described by this configuration.
    pub fn file_options(&self) -> FileOptions {
        let mut options = FileOptions::new(&self.public_dir);
        options
            .with_cache_control(&self.cache_control)
            .with_gzip(self.gzip)
            .with_brotli(self.brotli);
        if let Some(buffer_size) = self.buffer_size {
            options.with_buffer_size(buffer_size);
        }
        options
    }

    /// Creates the `FileHandler` for the configured public directory, which must exist.
    pub fn file_handler(&self) -> Result<FileHandler, ConfigError> {
        Ok(FileHandler::new(self.file_options())?)
    }
}
