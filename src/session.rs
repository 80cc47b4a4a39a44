use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{AppError, AppResult};

/// Flags kept between runs. Unknown or missing keys read as defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFlags {
    pub is_logged_in: bool,
    pub token: Option<String>,
    pub dark_mode: bool,
    pub logged_in_at: Option<DateTime<Utc>>,
}

/// JSON file holding [`SessionFlags`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is a fresh session.
    pub async fn load(&self) -> AppResult<SessionFlags> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(AppError::SessionFormat),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SessionFlags::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save(&self, flags: &SessionFlags) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(flags).map_err(AppError::SessionFormat)?;
        fs::write(&self.path, raw).await?;
        tracing::debug!(path = %self.path.display(), logged_in = flags.is_logged_in, "session saved");
        Ok(())
    }

    /// Loads, applies `change` and writes the result back.
    pub async fn update<F>(&self, change: F) -> AppResult<SessionFlags>
    where
        F: FnOnce(&mut SessionFlags),
    {
        let mut flags = self.load().await?;
        change(&mut flags);
        self.save(&flags).await?;
        Ok(flags)
    }
}
