//! Open files of another process, read from the system handle table.
//!
//! Each file handle owned by the target is duplicated into this process and
//! resolved with `GetFinalPathNameByHandleW`. The target is never suspended
//! or written to.

use std::ffi::c_void;
use std::path::PathBuf;

use tracing::trace;
use windows::Wdk::System::SystemInformation::{NtQuerySystemInformation, SYSTEM_INFORMATION_CLASS};
use windows::Win32::Foundation::{DuplicateHandle, DUPLICATE_SAME_ACCESS, HANDLE, NTSTATUS};
use windows::Win32::Storage::FileSystem::{
    GetFileType, GetFinalPathNameByHandleW, FILE_NAME_NORMALIZED, FILE_TYPE_DISK,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcess, PROCESS_DUP_HANDLE};

use super::windows::{from_wide, HandleGuard};
use crate::error::StrategyMiss;

const SYSTEM_EXTENDED_HANDLE_INFORMATION: SYSTEM_INFORMATION_CLASS = SYSTEM_INFORMATION_CLASS(64);
const STATUS_INFO_LENGTH_MISMATCH: NTSTATUS = NTSTATUS(0xC000_0004_u32 as i32);

/// Access mask of synchronous named pipe handles. Resolving their name blocks
/// until the pipe is written to.
const BLOCKING_PIPE_ACCESS: u32 = 0x0012_019f;

const MAX_TABLE_BYTES: usize = 512 << 20;

#[allow(dead_code)]
#[repr(C)]
struct HandleEntry {
    object: *mut c_void,
    unique_process_id: usize,
    handle_value: usize,
    granted_access: u32,
    creator_back_trace_index: u16,
    object_type_index: u16,
    handle_attributes: u32,
    reserved: u32,
}

#[allow(dead_code)]
#[repr(C)]
struct HandleTable {
    number_of_handles: usize,
    reserved: usize,
    handles: [HandleEntry; 1],
}

/// Paths of the disk files `pid` has open.
pub fn open_files(pid: u32) -> Result<Vec<PathBuf>, StrategyMiss> {
    let process = unsafe { OpenProcess(PROCESS_DUP_HANDLE, false, pid) }
        .map(HandleGuard)
        .map_err(|_| StrategyMiss::AccessDenied)?;

    let table = handle_table()?;
    let handles = owned_handles(&table, pid);
    trace!(pid, count = handles.len(), "Inspecting process handles");

    let mut paths = Vec::new();
    for handle in handles {
        if let Some(path) = resolve(process.0, handle) {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Snapshot of every handle in the system, as raw words so the table is
/// pointer-aligned.
fn handle_table() -> Result<Vec<usize>, StrategyMiss> {
    let mut buf: Vec<usize> = vec![0; (1 << 20) / std::mem::size_of::<usize>()];
    loop {
        let bytes = buf.len() * std::mem::size_of::<usize>();
        let mut needed = 0u32;
        let status = unsafe {
            NtQuerySystemInformation(
                SYSTEM_EXTENDED_HANDLE_INFORMATION,
                buf.as_mut_ptr().cast(),
                bytes as u32,
                &mut needed,
            )
        };
        if status == STATUS_INFO_LENGTH_MISMATCH {
            // The table grows between calls.
            let next = (needed as usize).max(bytes * 2);
            if next > MAX_TABLE_BYTES {
                return Err(StrategyMiss::Query("handle table too large".into()));
            }
            buf = vec![0; next.div_ceil(std::mem::size_of::<usize>())];
            continue;
        }
        status
            .ok()
            .map_err(|e| StrategyMiss::Query(format!("handle table query failed: {e}")))?;
        return Ok(buf);
    }
}

fn owned_handles(table: &[usize], pid: u32) -> Vec<HANDLE> {
    let header = table.as_ptr() as *const HandleTable;
    let capacity = (table.len() * std::mem::size_of::<usize>()
        - std::mem::offset_of!(HandleTable, handles))
        / std::mem::size_of::<HandleEntry>();

    let entries = unsafe {
        let count = (*header).number_of_handles.min(capacity);
        std::slice::from_raw_parts((*header).handles.as_ptr(), count)
    };
    entries
        .iter()
        .filter(|e| e.unique_process_id == pid as usize)
        .filter(|e| e.granted_access != BLOCKING_PIPE_ACCESS)
        .map(|e| HANDLE(e.handle_value as *mut c_void))
        .collect()
}

fn resolve(process: HANDLE, handle: HANDLE) -> Option<PathBuf> {
    let mut local = HANDLE::default();
    unsafe {
        DuplicateHandle(
            process,
            handle,
            GetCurrentProcess(),
            &mut local,
            0,
            false,
            DUPLICATE_SAME_ACCESS,
        )
    }
    .ok()?;
    let local = HandleGuard(local);

    if unsafe { GetFileType(local.0) } != FILE_TYPE_DISK {
        return None;
    }

    let mut buf = [0u16; 1024];
    let len = unsafe { GetFinalPathNameByHandleW(local.0, &mut buf, FILE_NAME_NORMALIZED) } as usize;
    if len == 0 || len >= buf.len() {
        return None;
    }
    Some(PathBuf::from(strip_verbatim(&from_wide(&buf[..len]))))
}

/// Drop the `\\?\` prefix `GetFinalPathNameByHandleW` puts on every path.
fn strip_verbatim(path: &str) -> String {
    if let Some(rest) = path.strip_prefix(r"\\?\UNC\") {
        format!(r"\\{rest}")
    } else if let Some(rest) = path.strip_prefix(r"\\?\") {
        rest.to_string()
    } else {
        path.to_string()
    }
}
