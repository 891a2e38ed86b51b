use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Looked up next to the working directory; it is fine for it to be missing.
pub const DEFAULT_FILE: &str = "axquery";
pub const ENV_PREFIX: &str = "AXQUERY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Append a dump of the searched subtree to search failures.
    pub debug: bool,
    /// Filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Layers, lowest precedence first: built-in defaults, `axquery.toml` (or
    /// any format `config` recognises), the file given in `path`, and
    /// `AXQUERY_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_FILE).required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
