//! OS backends: process and window enumeration plus the privileged queries
//! the strategies need.

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub mod windows_handles;

#[cfg(target_os = "windows")]
pub mod windows_uia;

pub mod fixed;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{DetectError, EnumerationSkip, StrategyMiss};
use crate::model::{MediaInfo, Player, Process, Window};

pub use fixed::StaticPlatform;

/// A process and its top-level visible windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub process: Process,
    pub windows: Vec<Window>,
}

/// Read-only view of the running system.
///
/// Implementations must not signal, suspend or otherwise affect the processes
/// they inspect. Anything they return is only valid for the current call.
pub trait Platform: Send + Sync {
    /// Every running process with its windows. A process that cannot be read
    /// yields a skip instead of failing the scan.
    fn processes(&self) -> Box<dyn Iterator<Item = Result<ProcessEntry, EnumerationSkip>> + '_>;

    /// Paths of the files `process` currently has open.
    fn open_files(&self, process: &Process) -> Result<Vec<PathBuf>, StrategyMiss>;

    /// Media information exposed by the automation surface of `window`.
    fn automation(
        &self,
        player: &Player,
        process: &Process,
        window: &Window,
    ) -> Result<Vec<MediaInfo>, StrategyMiss>;
}

/// The backend for the current OS.
pub fn system() -> Result<Arc<dyn Platform>, DetectError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(linux::LinuxPlatform::new()?))
    }
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsPlatform::new()?))
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Err(DetectError::EngineUnavailable(format!(
            "no detection backend for {}",
            std::env::consts::OS
        )))
    }
}
