//! Single-slot stores for the last fetched rate.
//!
//! Stores never fail the caller: an unreadable slot is a miss and a failed
//! write is logged.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::rate::FxRate;

#[async_trait]
pub trait RateCache: Send + Sync {
    /// The stored rate, if any, regardless of age.
    async fn load(&self) -> Option<FxRate>;

    /// Replace the stored rate. Last write wins.
    async fn store(&self, rate: &FxRate);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryRateCache {
    slot: RwLock<Option<FxRate>>,
}

impl MemoryRateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateCache for MemoryRateCache {
    async fn load(&self) -> Option<FxRate> {
        self.slot.read().await.clone()
    }

    async fn store(&self, rate: &FxRate) {
        *self.slot.write().await = Some(rate.clone());
    }
}

/// JSON file store that survives restarts.
#[derive(Debug, Clone)]
pub struct FileRateCache {
    path: PathBuf,
}

impl FileRateCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, rate: &FxRate) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(rate)?;
        tokio::fs::write(&self.path, body).await
    }
}

#[async_trait]
impl RateCache for FileRateCache {
    async fn load(&self) -> Option<FxRate> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read FX cache");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(rate) => Some(rate),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt FX cache");
                None
            }
        }
    }

    async fn store(&self, rate: &FxRate) {
        if let Err(e) = self.write(rate).await {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write FX cache");
        }
    }
}
