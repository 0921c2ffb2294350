use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;

use crate::error::Error;
use crate::project::DEFAULT_INDENT;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Wait for ENTER before the process exits.
    pub pause_on_exit: bool,
    /// Relaunch elevated once when an artifact directory cannot be deleted.
    pub elevate_on_access_denied: bool,
    /// Spaces per nesting level when project files are written back.
    pub indent_width: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pause_on_exit: true,
            elevate_on_access_denied: true,
            indent_width: DEFAULT_INDENT,
        }
    }
}

/// Loads `VSUnbind.toml` (optional) and `VSUNBIND_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("VSUnbind").required(false))
        .add_source(Environment::with_prefix("VSUNBIND").try_parsing(true))
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}
