// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use cardsync_core::{APP_NAME, SyncConfig, get_config_dir};
use tokio::fs;

const CARDSYNC_CONFIG_ENV: &str = "CARDSYNC_CONFIG";

/// File name of the local card database inside the state directory.
const DATABASE_FILE: &str = "cardsync.db";

#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<SyncConfig, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(CARDSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    let mut config = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()?
        .core;
    config.normalize()?;
    Ok(config)
}

/// Path of the local card database, `None` for an in-memory one.
pub fn database_path(config: &SyncConfig) -> Option<PathBuf> {
    config.state_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
}

#[derive(Debug, serde::Deserialize)]
struct ConfigRaw {
    core: SyncConfig,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
