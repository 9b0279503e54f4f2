// State management module
//
// StateStore wraps SyncState with thread-safe access using Arc<RwLock<T>>
// and broadcasts change events to subscribers.

use crate::models::{SyncState, UpdateStatus};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the store is modified.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    ModsChanged { enabled: usize, total: usize },

    AgentsChanged { enabled: usize, total: usize },

    ModProfilesChanged { count: usize },

    LaunchProfilesChanged { count: usize },

    /// The live process map was replaced by a new scan
    ProcessesChanged { running: usize },

    HistoryChanged { entries: usize },

    SettingsChanged,

    UpdateStatusChanged(UpdateStatus),

    /// A single file could not be read during a scan
    ScanIssue { path: String, message: String },

    /// The owning context is shutting down
    Shutdown,
}

/// Process-wide reactive store.
///
/// - [`snapshot()`](Self::snapshot) / [`read()`](Self::read) for reads
/// - [`update()`](Self::update) for mutations; emits one event per changed area
/// - [`subscribe()`](Self::subscribe) to listen for changes
///
/// Engines publish here only after the filesystem operation that backs a
/// change has succeeded.
pub struct StateStore {
    state: Arc<RwLock<SyncState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateStore {
    /// Empty store with a broadcast buffer of 100 events
    pub fn new() -> Self {
        Self::with_state(SyncState::default())
    }

    pub fn with_state(initial: SyncState) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(initial)),
            state_tx,
        }
    }

    /// Clone of the whole state.
    pub fn snapshot(&self) -> SyncState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// ```ignore
    /// let enabled = store.read(|state| state.enabled_mods().len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SyncState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Apply `update_fn`, detect what changed and broadcast it.
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SyncState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = detect_changes(&old_state, &state);
        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Broadcast an event that is not derived from a state diff.
    pub fn publish(&self, change: StateChange) {
        let _ = self.state_tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    pub fn set_update_status(&self, status: UpdateStatus) -> Vec<StateChange> {
        self.update(|state| state.update_status = status)
    }
}

fn detect_changes(old: &SyncState, new: &SyncState) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if old.mods != new.mods {
        changes.push(StateChange::ModsChanged {
            enabled: new.mods.iter().filter(|m| !m.disabled).count(),
            total: new.mods.len(),
        });
    }

    if old.agents != new.agents {
        changes.push(StateChange::AgentsChanged {
            enabled: new.agents.iter().filter(|a| !a.disabled).count(),
            total: new.agents.len(),
        });
    }

    if old.mod_profiles != new.mod_profiles {
        changes.push(StateChange::ModProfilesChanged {
            count: new.mod_profiles.len(),
        });
    }

    if old.launch_profiles != new.launch_profiles {
        changes.push(StateChange::LaunchProfilesChanged {
            count: new.launch_profiles.len(),
        });
    }

    if old.processes != new.processes {
        changes.push(StateChange::ProcessesChanged {
            running: new.processes.len(),
        });
    }

    if old.process_history != new.process_history {
        changes.push(StateChange::HistoryChanged {
            entries: new.process_history.history.len(),
        });
    }

    if old.settings != new.settings {
        changes.push(StateChange::SettingsChanged);
    }

    if old.update_status != new.update_status {
        changes.push(StateChange::UpdateStatusChanged(new.update_status.clone()));
    }

    changes
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state and channel
impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
