//! File-based silent restore flag
//!
//! Persists the once-per-install silent-restore marker as a small JSON file
//! in the application data directory. Uninstalling the app removes the data
//! directory and with it the flag.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use pg_core::ports::SilentRestoreFlagPort;

pub const DEFAULT_RESTORE_FLAG_FILE: &str = ".silent_restore_state";

#[derive(Debug, Default, Serialize, Deserialize)]
struct RestoreFlagState {
    silent_restore_attempted: bool,
}

pub struct FileSilentRestoreFlagRepository {
    state_file_path: PathBuf,
}

impl FileSilentRestoreFlagRepository {
    /// Create repository with custom file path
    pub fn new(state_file_path: PathBuf) -> Self {
        Self { state_file_path }
    }

    /// Create repository with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            state_file_path: base_dir.join(DEFAULT_RESTORE_FLAG_FILE),
        }
    }

    /// Forget the flag, as a reinstall would.
    pub async fn reset(&self) -> anyhow::Result<()> {
        if fs::try_exists(&self.state_file_path).await? {
            fs::remove_file(&self.state_file_path).await?;
        }
        Ok(())
    }

    async fn read_state(&self) -> anyhow::Result<RestoreFlagState> {
        if !fs::try_exists(&self.state_file_path).await? {
            return Ok(RestoreFlagState::default());
        }

        let content = fs::read_to_string(&self.state_file_path).await?;
        if content.trim().is_empty() {
            return Ok(RestoreFlagState::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse silent restore state: {}", e))
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.state_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SilentRestoreFlagPort for FileSilentRestoreFlagRepository {
    async fn is_attempted(&self) -> anyhow::Result<bool> {
        Ok(self.read_state().await?.silent_restore_attempted)
    }

    async fn mark_attempted(&self) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let state = RestoreFlagState {
            silent_restore_attempted: true,
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| anyhow::anyhow!("Failed to serialize silent restore state: {}", e))?;

        let mut file = fs::File::create(&self.state_file_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create state file: {}", e))?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write state file: {}", e))?;

        file.sync_all()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to sync state file: {}", e))?;

        debug!(path = %self.state_file_path.display(), "Silent restore flag persisted");
        Ok(())
    }
}
