use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EnumerationSkip, StrategyMiss};
use crate::model::{MediaInfo, Player, Process, Window};
use crate::platform::{Platform, ProcessEntry};

#[derive(Debug, Clone)]
enum Item {
    Entry(ProcessEntry),
    Skip { pid: u32, reason: String },
}

#[derive(Debug, Clone)]
enum OpenFiles {
    Paths(Vec<PathBuf>),
    Denied,
}

/// A fixed, in-memory snapshot of processes, windows, open files and
/// automation answers.
///
/// Useful for replaying a snapshot captured elsewhere and for exercising the
/// engine without touching the live system.
#[derive(Debug, Default)]
pub struct StaticPlatform {
    items: Vec<Item>,
    open_files: HashMap<u32, OpenFiles>,
    automation: HashMap<u64, Vec<MediaInfo>>,
    open_files_calls: AtomicUsize,
    automation_calls: AtomicUsize,
}

impl StaticPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a process with its windows.
    pub fn with_process(mut self, process: Process, windows: Vec<Window>) -> Self {
        self.items.push(Item::Entry(ProcessEntry { process, windows }));
        self
    }

    /// Add a process that fails to enumerate.
    pub fn with_skipped(mut self, pid: u32, reason: &str) -> Self {
        self.items.push(Item::Skip {
            pid,
            reason: reason.to_string(),
        });
        self
    }

    /// Files reported open by process `pid`.
    pub fn with_open_files<I, P>(mut self, pid: u32, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths = paths.into_iter().map(Into::into).collect();
        self.open_files.insert(pid, OpenFiles::Paths(paths));
        self
    }

    /// Make open file queries for `pid` fail with access denied.
    pub fn with_open_files_denied(mut self, pid: u32) -> Self {
        self.open_files.insert(pid, OpenFiles::Denied);
        self
    }

    /// Automation answer for the window with `handle`.
    pub fn with_automation(mut self, handle: u64, info: Vec<MediaInfo>) -> Self {
        self.automation.insert(handle, info);
        self
    }

    pub fn open_files_calls(&self) -> usize {
        self.open_files_calls.load(Ordering::Relaxed)
    }

    pub fn automation_calls(&self) -> usize {
        self.automation_calls.load(Ordering::Relaxed)
    }
}

impl Platform for StaticPlatform {
    fn processes(&self) -> Box<dyn Iterator<Item = Result<ProcessEntry, EnumerationSkip>> + '_> {
        Box::new(self.items.iter().map(|item| match item {
            Item::Entry(entry) => Ok(entry.clone()),
            Item::Skip { pid, reason } => Err(EnumerationSkip::new(*pid, reason.clone())),
        }))
    }

    fn open_files(&self, process: &Process) -> Result<Vec<PathBuf>, StrategyMiss> {
        self.open_files_calls.fetch_add(1, Ordering::Relaxed);
        match self.open_files.get(&process.id) {
            Some(OpenFiles::Paths(paths)) => Ok(paths.clone()),
            Some(OpenFiles::Denied) => Err(StrategyMiss::AccessDenied),
            None => Err(StrategyMiss::NotFound),
        }
    }

    fn automation(
        &self,
        _player: &Player,
        _process: &Process,
        window: &Window,
    ) -> Result<Vec<MediaInfo>, StrategyMiss> {
        self.automation_calls.fetch_add(1, Ordering::Relaxed);
        self.automation
            .get(&window.handle)
            .cloned()
            .ok_or(StrategyMiss::NotFound)
    }
}
