//! Windows backend: ToolHelp process snapshots and top-level window
//! enumeration.

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::PathBuf;

use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, BOOL, HANDLE, HWND, LPARAM, TRUE};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
    IsWindowVisible,
};

use crate::error::{DetectError, EnumerationSkip, StrategyMiss};
use crate::model::{MediaInfo, Player, Process, Window};
use crate::platform::{windows_handles, windows_uia, Platform, ProcessEntry};

pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Result<Self, DetectError> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| DetectError::EngineUnavailable(format!("process snapshot failed: {e}")))?;
        drop(HandleGuard(snapshot));
        Ok(Self)
    }
}

impl Platform for WindowsPlatform {
    fn processes(&self) -> Box<dyn Iterator<Item = Result<ProcessEntry, EnumerationSkip>> + '_> {
        let processes = match process_snapshot() {
            Ok(processes) => processes,
            Err(e) => {
                tracing::warn!("Process snapshot failed: {e}");
                return Box::new(std::iter::empty());
            }
        };
        let mut windows = top_level_windows();

        let known: Vec<u32> = processes.iter().map(|p| p.id).collect();
        for pid in windows.keys().filter(|pid| !known.contains(pid)) {
            debug!(pid, "Window owner missing from process snapshot");
        }

        Box::new(processes.into_iter().map(move |process| {
            if process.name.is_empty() {
                return Err(EnumerationSkip::new(process.id, "no executable name"));
            }
            let windows = windows.remove(&process.id).unwrap_or_default();
            Ok(ProcessEntry { process, windows })
        }))
    }

    fn open_files(&self, process: &Process) -> Result<Vec<PathBuf>, StrategyMiss> {
        windows_handles::open_files(process.id)
    }

    fn automation(
        &self,
        player: &Player,
        _process: &Process,
        window: &Window,
    ) -> Result<Vec<MediaInfo>, StrategyMiss> {
        windows_uia::media_info(player, hwnd(window.handle))
    }
}

/// Closes a kernel handle on drop.
pub(crate) struct HandleGuard(pub(crate) HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            let _ = unsafe { CloseHandle(self.0) };
        }
    }
}

pub(crate) fn hwnd(handle: u64) -> HWND {
    HWND(handle as usize as *mut c_void)
}

/// Decode a NUL-terminated UTF-16 buffer.
pub(crate) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|c| *c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn process_snapshot() -> windows::core::Result<Vec<Process>> {
    let snapshot = HandleGuard(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)? });
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut processes = Vec::new();
    unsafe { Process32FirstW(snapshot.0, &mut entry)? };
    loop {
        processes.push(Process {
            id: entry.th32ProcessID,
            name: from_wide(&entry.szExeFile),
        });
        if unsafe { Process32NextW(snapshot.0, &mut entry) }.is_err() {
            break;
        }
    }
    Ok(processes)
}

/// Visible top-level windows grouped by owning pid, in z-order.
fn top_level_windows() -> HashMap<u32, Vec<Window>> {
    let mut windows: HashMap<u32, Vec<Window>> = HashMap::new();
    let result = unsafe {
        EnumWindows(
            Some(collect_window),
            LPARAM(&mut windows as *mut HashMap<u32, Vec<Window>> as isize),
        )
    };
    if let Err(e) = result {
        tracing::warn!("EnumWindows failed: {e}");
    }
    windows
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut HashMap<u32, Vec<Window>>);

    if !IsWindowVisible(hwnd).as_bool() {
        return TRUE;
    }

    let mut pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    if pid == 0 {
        return TRUE;
    }

    let mut class_name = [0u16; 256];
    let len = GetClassNameW(hwnd, &mut class_name);
    let class_name = String::from_utf16_lossy(&class_name[..len.max(0) as usize]);

    let mut text = vec![0u16; GetWindowTextLengthW(hwnd).max(0) as usize + 1];
    let len = GetWindowTextW(hwnd, &mut text);
    let text = String::from_utf16_lossy(&text[..len.max(0) as usize]);

    windows.entry(pid).or_default().push(Window {
        handle: hwnd.0 as usize as u64,
        class_name,
        text,
    });
    TRUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wide_stops_at_nul() {
        let buf: Vec<u16> = "mpc-hc64.exe\0garbage".encode_utf16().collect();
        assert_eq!(from_wide(&buf), "mpc-hc64.exe");
        let buf: Vec<u16> = "vlc.exe".encode_utf16().collect();
        assert_eq!(from_wide(&buf), "vlc.exe");
    }

    #[test]
    fn test_own_process_is_enumerated() {
        let platform = WindowsPlatform::new().unwrap();
        let me = std::process::id();
        assert!(platform
            .processes()
            .filter_map(Result::ok)
            .any(|entry| entry.process.id == me));
    }
}
