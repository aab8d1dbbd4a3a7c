pub mod address;
pub mod checksum;
pub mod config;
pub mod replay;
pub mod resolve;

use std::path::Path;

use avp_core::AvpConfig;
use tracing::debug;

/// Load the explicit config file, else the default one if it exists.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<AvpConfig> {
    if let Some(path) = config_path {
        return Ok(AvpConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(AvpConfig::from_file(&default_path)?)
    } else {
        Ok(AvpConfig::default())
    }
}
