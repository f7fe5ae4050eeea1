//! Process-local adapters for every driven port.
//!
//! Each repository enforces optimistic versioning exactly as a database
//! adapter would, so services observe real version conflicts.

mod challenges;
mod sessions;
mod snapshots;
mod store;
mod unlocks;

use std::sync::Arc;

pub use challenges::InMemoryChallengeRepository;
pub use sessions::InMemoryPracticeSessionRepository;
pub use snapshots::InMemoryStatSnapshotRepository;
pub use unlocks::InMemoryAchievementUnlockRepository;

use crate::domain::ProgressPorts;
use crate::domain::ports::AchievementCatalog;

/// One shared instance of each in-memory repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepositories {
    pub sessions: Arc<InMemoryPracticeSessionRepository>,
    pub snapshots: Arc<InMemoryStatSnapshotRepository>,
    pub challenges: Arc<InMemoryChallengeRepository>,
    pub unlocks: Arc<InMemoryAchievementUnlockRepository>,
}

impl InMemoryRepositories {
    /// Coordinator ports backed by these repositories and `catalog`.
    pub fn progress_ports(&self, catalog: Arc<dyn AchievementCatalog>) -> ProgressPorts {
        ProgressPorts::new(
            self.snapshots.clone(),
            self.challenges.clone(),
            catalog,
            self.unlocks.clone(),
        )
    }
}
