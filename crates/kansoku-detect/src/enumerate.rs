use tracing::debug;

use crate::platform::{Platform, ProcessEntry};

/// One complete pass over the running processes and their windows.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Sorted by process id; each process's windows sorted by handle.
    pub entries: Vec<ProcessEntry>,
    /// Processes that could not be read.
    pub skipped: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drain the platform's process list into a snapshot. Unreadable processes
/// are logged and left out.
pub fn enumerate(platform: &dyn Platform) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for item in platform.processes() {
        match item {
            Ok(mut entry) => {
                entry.windows.sort_by_key(|w| w.handle);
                snapshot.entries.push(entry);
            }
            Err(skip) => {
                debug!(pid = skip.pid, reason = %skip.reason, "Skipping process");
                snapshot.skipped += 1;
            }
        }
    }
    snapshot.entries.sort_by_key(|e| e.process.id);
    snapshot
}
