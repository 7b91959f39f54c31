use anyhow::{Context, Result};
use async_std::{fs, path::Path};
use tracing::{error, info, warn};

use crate::{conf, persisted};

/// Loads the configuration from a YAML file.
///
/// A missing or invalid file is replaced by the default configuration which
/// is returned. Failure to write the file is only logged.
pub async fn load_conf(path: &Path) -> conf::Configuration {
    match try_load_conf(path).await {
        Ok(Some(conf)) => return conf,
        Ok(None) => info!(
            "Configuration does not exist or is not a file, using defaults: {}",
            path.to_string_lossy()
        ),
        Err(err) => warn!(
            "Invalid configuration {}, using defaults: {:?}",
            path.to_string_lossy(),
            err
        ),
    }

    if let Err(err) = store_conf(path, &persisted::Configuration::default()).await {
        error!("Failed to store default configuration: {:?}", err);
    }
    conf::Configuration::default()
}

async fn try_load_conf(path: &Path) -> Result<Option<conf::Configuration>> {
    match load_conf_text(path).await? {
        Some(text) => {
            let persistent: persisted::Configuration =
                serde_yaml::from_str(text.as_str()).context("Failed to parse configuration")?;
            conf::Configuration::try_from(persistent).map(Some)
        }
        None => Ok(None),
    }
}

/// Loads configuration file to a string. Returns Ok(None) if the configuration
/// file does not exist.
async fn load_conf_text(path: &Path) -> Result<Option<String>> {
    if path.is_file().await {
        info!("Loading configuration from {}", path.to_string_lossy());
        fs::read_to_string(path).await.map(Some).with_context(|| {
            format!(
                "Could not load configuration file: {}",
                path.to_string_lossy(),
            )
        })
    } else {
        Ok(None)
    }
}

async fn store_conf(path: &Path, conf: &persisted::Configuration) -> Result<()> {
    let text = serde_yaml::to_string(conf).context("Failed to serialize configuration")?;
    fs::write(path, text).await.with_context(|| {
        format!(
            "Could not write configuration file: {}",
            path.to_string_lossy()
        )
    })?;
    info!("Configuration stored to {}", path.to_string_lossy());
    Ok(())
}
