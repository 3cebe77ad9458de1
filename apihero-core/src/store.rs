// Shared holder for the current site map. Builds happen outside the lock;
// only the final pointer swap is exclusive.

use crate::error::SourceError;
use crate::index::{BuildReport, SiteIndex};
use crate::source::RecordSource;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A completed, immutable build
#[derive(Debug, Default)]
pub struct Snapshot {
    index: SiteIndex,
    report: BuildReport,
    generation: u64,
    source: Option<String>,
}

impl Snapshot {
    pub fn index(&self) -> &SiteIndex {
        &self.index
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// 0 for the initial empty index, then +1 per installed build
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

pub struct IndexStore {
    current: RwLock<Arc<Snapshot>>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore {
    /// A store holding an empty but valid index
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// The installed snapshot. Holding the `Arc` keeps a consistent view for
    /// as long as the caller needs it, even across later installs.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a finished index
    pub fn install(
        &self,
        index: SiteIndex,
        report: BuildReport,
        source: Option<String>,
    ) -> Arc<Snapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = Arc::new(Snapshot {
            index,
            report,
            generation: guard.generation + 1,
            source,
        });
        *guard = Arc::clone(&snapshot);
        snapshot
    }

    /// Pull a snapshot from `source`, build, and install.
    ///
    /// When the source is unavailable the previous index stays installed and
    /// the error is handed back for the caller to surface.
    pub fn rebuild(&self, source: &dyn RecordSource) -> Result<Arc<Snapshot>, SourceError> {
        let name = source.name();
        let entries = source.fetch().map_err(|e| {
            warn!("Keeping previous site map, {} unavailable: {}", name, e);
            e
        })?;

        let (index, report) = SiteIndex::build(entries);
        let snapshot = self.install(index, report, Some(name));
        info!(
            "Installed site map generation {} from {}",
            snapshot.generation(),
            snapshot.source().unwrap_or("unknown")
        );
        Ok(snapshot)
    }

    /// `rebuild` on the blocking pool, leaving the caller's thread free to
    /// keep serving the current snapshot. The build always runs to the end;
    /// dropping the handle only discards the result.
    pub fn spawn_rebuild(
        self: &Arc<Self>,
        source: Box<dyn RecordSource>,
    ) -> JoinHandle<Result<Arc<Snapshot>, SourceError>> {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || store.rebuild(source.as_ref()))
    }
}
