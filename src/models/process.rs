use super::profile::MinecraftInfo;
use serde::{Deserialize, Serialize};

/// A running game process as reported by the process enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinecraftProcess {
    pub pid: u32,
    pub start_time: u64,
    pub info: MinecraftInfo,
    pub weave_attached: bool,
}

impl MinecraftProcess {
    /// Pids are reused by the OS; the start time tells two lifetimes apart.
    pub fn is_same_lifetime(&self, other: &MinecraftProcess) -> bool {
        self.pid == other.pid && self.start_time == other.start_time
    }
}

/// Append-only log of observed processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHistory {
    pub history: Vec<MinecraftProcess>,
}

impl ProcessHistory {
    pub fn contains(&self, process: &MinecraftProcess) -> bool {
        self.history.iter().any(|p| p.is_same_lifetime(process))
    }

    /// Append processes not already logged. Returns how many were added.
    pub fn extend_unique(&mut self, processes: impl IntoIterator<Item = MinecraftProcess>) -> usize {
        let before = self.history.len();
        for process in processes {
            if !self.contains(&process) {
                self.history.push(process);
            }
        }
        self.history.len() - before
    }
}
