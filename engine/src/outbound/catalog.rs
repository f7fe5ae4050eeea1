//! Achievement catalog backed by a fixed list of definitions.
//!
//! Definitions are usually loaded from a JSON array through `cap_std`. The
//! catalog can be switched offline to exercise degraded completions.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::warn;

use crate::domain::AchievementDefinition;
use crate::domain::ports::{AchievementCatalog, AchievementCatalogError};

/// Failures while loading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("catalog path {path} has no file name")]
    InvalidPath { path: String },
    #[error("failed to read achievement catalog: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse achievement catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-process [`AchievementCatalog`].
#[derive(Debug)]
pub struct StaticAchievementCatalog {
    definitions: Vec<AchievementDefinition>,
    available: AtomicBool,
}

impl StaticAchievementCatalog {
    pub fn new(definitions: Vec<AchievementDefinition>) -> Self {
        let mut seen = BTreeSet::new();
        for definition in &definitions {
            if !seen.insert(&definition.id) {
                warn!(
                    achievement_id = %definition.id,
                    "duplicate achievement id; only the first definition is evaluated"
                );
            }
        }
        Self {
            definitions,
            available: AtomicBool::new(true),
        }
    }

    /// Parse a JSON array of definitions.
    pub fn from_json(raw: &str) -> Result<Self, CatalogLoadError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    /// Read and parse a JSON catalog file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogLoadError> {
        let file_name = path.file_name().ok_or_else(|| CatalogLoadError::InvalidPath {
            path: path.display().to_string(),
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        let raw = directory.read_to_string(Path::new(file_name))?;
        Self::from_json(&raw)
    }

    /// Every definition, active or not.
    pub fn definitions(&self) -> &[AchievementDefinition] {
        &self.definitions
    }

    /// Simulate the catalog going offline or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl AchievementCatalog for StaticAchievementCatalog {
    async fn list_active(&self) -> Result<Vec<AchievementDefinition>, AchievementCatalogError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(AchievementCatalogError::unavailable("catalog offline"));
        }
        Ok(self
            .definitions
            .iter()
            .filter(|definition| definition.is_active)
            .cloned()
            .collect())
    }
}
