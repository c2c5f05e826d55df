// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, sync::Arc};

use cardsync_core::{ContentsClient, LocalDb, SyncConfig, SyncEngine};

use crate::config::database_path;
use crate::prompt::DeletionPrompt;

/// The local database and the engine working on it.
#[derive(Debug)]
pub struct Session {
    pub db: Arc<LocalDb>,
    pub engine: Arc<SyncEngine>,
}

impl Session {
    /// Opens the database in the state directory and builds the engine.
    #[tracing::instrument(skip_all, fields(repository = %config.repository))]
    pub async fn open(config: SyncConfig, assume_yes: bool) -> Result<Self, Box<dyn Error>> {
        let path = database_path(&config);
        if let Some(dir) = path.as_ref().and_then(|p| p.parent()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| format!("Failed to create state directory {}: {e}", dir.display()))?;
        }
        let db = Arc::new(LocalDb::open(path.as_deref()).await?);

        let client = ContentsClient::new(config.remote_config())
            .map_err(|e| format!("Invalid remote configuration: {e}"))?;
        let engine = SyncEngine::new(config, Arc::new(client), db.clone(), db.clone())
            .await?
            .with_confirmation(Arc::new(DeletionPrompt::new(assume_yes)));

        Ok(Self {
            db,
            engine: Arc::new(engine),
        })
    }

    /// Persists the engine state and closes the database.
    pub async fn close(self) -> Result<(), Box<dyn Error>> {
        self.engine.flush().await?;
        LocalDb::clone(&self.db).close().await
    }
}
