use crate::error::SyncResult;
use crate::models::MinecraftProcess;
use crate::repository::Repository;
use crate::state::StateStore;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lists running game processes.
pub trait ProcessEnumerator: Send + Sync {
    fn fetch(&self) -> SyncResult<Vec<MinecraftProcess>>;
}

/// Keeps the live process map and the persisted history in step.
#[derive(Clone)]
pub struct ProcessHistoryTracker {
    repository: Repository,
    store: StateStore,
    observing: Arc<Mutex<()>>,
}

impl ProcessHistoryTracker {
    pub fn new(repository: Repository, store: StateStore) -> Self {
        Self {
            repository,
            store,
            observing: Arc::new(Mutex::new(())),
        }
    }

    /// Record a fresh snapshot of running processes.
    ///
    /// Processes not in the live map (same pid and start time) and not
    /// already running with weave attached are appended to history. The live
    /// map is then replaced by the snapshot. If the history write fails,
    /// neither the map nor the history changes, so the next scan retries.
    ///
    /// Returns how many history entries were added.
    pub async fn observe(&self, snapshot: Vec<MinecraftProcess>) -> SyncResult<usize> {
        let _guard = self.observing.lock().await;

        let fresh: Vec<MinecraftProcess> = self.store.read(|state| {
            snapshot
                .iter()
                .filter(|p| !p.weave_attached)
                .filter(|p| {
                    !state
                        .processes
                        .get(&p.pid)
                        .is_some_and(|known| known.is_same_lifetime(p))
                })
                .cloned()
                .collect()
        });

        let mut added = 0;
        let mut history = None;
        if !fresh.is_empty() {
            let (updated, count) = self.repository.append_process_history(fresh).await?;
            added = count;
            history = Some(updated);
        }

        let processes: IndexMap<u32, MinecraftProcess> =
            snapshot.into_iter().map(|p| (p.pid, p)).collect();
        self.store.update(|state| {
            state.processes = processes;
            if let Some(history) = history {
                state.process_history = history;
            }
        });

        if added > 0 {
            tracing::info!("Recorded {} new process(es)", added);
        }
        Ok(added)
    }

    /// Enumerate running processes and observe them.
    pub async fn scan(&self, enumerator: &dyn ProcessEnumerator) -> SyncResult<usize> {
        let snapshot = enumerator.fetch()?;
        tracing::debug!("Enumerated {} process(es)", snapshot.len());
        self.observe(snapshot).await
    }
}
