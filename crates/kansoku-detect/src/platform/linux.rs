//! Linux backend.
//!
//! Processes come from `/proc`. Linux has no portable notion of top-level
//! windows, so the window surface is the set of MPRIS sessions on the session
//! bus, each attributed to the process that owns its bus name. The window
//! class is the MPRIS bus name and the window text the current track title.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zbus::blocking::fdo::DBusProxy;
use zbus::blocking::Connection;
use zbus::names::BusName;
use zbus::proxy;
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedValue;

use crate::error::{DetectError, EnumerationSkip, StrategyMiss};
use crate::model::{MediaInfo, MediaInfoType, Player, Process, Window};
use crate::platform::{Platform, ProcessEntry};

const PROC: &str = "/proc";
const MPRIS_BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";

#[proxy(
    interface = "org.mpris.MediaPlayer2",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2 {
    #[zbus(property)]
    fn identity(&self) -> zbus::Result<String>;
}

#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2Player {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;
}

pub struct LinuxPlatform;

impl LinuxPlatform {
    pub fn new() -> Result<Self, DetectError> {
        fs::read_dir(PROC)
            .map_err(|e| DetectError::EngineUnavailable(format!("cannot read {PROC}: {e}")))?;
        Ok(Self)
    }
}

impl Platform for LinuxPlatform {
    fn processes(&self) -> Box<dyn Iterator<Item = Result<ProcessEntry, EnumerationSkip>> + '_> {
        let mut windows = match SessionBus::connect() {
            Ok(bus) => bus.mpris_windows(),
            Err(e) => {
                warn!("Failed to connect to D-Bus: {e}");
                HashMap::new()
            }
        };

        let dir = match fs::read_dir(PROC) {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Failed to list {PROC}: {e}");
                return Box::new(std::iter::empty());
            }
        };

        let pids = dir.filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<u32>().ok());
        Box::new(pids.map(move |pid| {
            let name = process_name(pid).map_err(|e| EnumerationSkip::new(pid, e.to_string()))?;
            Ok(ProcessEntry {
                process: Process { id: pid, name },
                windows: windows.remove(&pid).unwrap_or_default(),
            })
        }))
    }

    fn open_files(&self, process: &Process) -> Result<Vec<PathBuf>, StrategyMiss> {
        let fd_dir = Path::new(PROC).join(process.id.to_string()).join("fd");
        let entries = fs::read_dir(&fd_dir).map_err(io_miss)?;

        let mut paths = Vec::new();
        for entry in entries.flatten() {
            // Descriptors close while we walk the directory.
            let Ok(target) = fs::read_link(entry.path()) else {
                continue;
            };
            if !target.is_absolute() || target.to_string_lossy().ends_with(" (deleted)") {
                continue;
            }
            paths.push(target);
        }
        Ok(paths)
    }

    fn automation(
        &self,
        _player: &Player,
        _process: &Process,
        window: &Window,
    ) -> Result<Vec<MediaInfo>, StrategyMiss> {
        if !window.class_name.starts_with(MPRIS_BUS_PREFIX) {
            return Err(StrategyMiss::Unsupported);
        }
        let bus = SessionBus::connect().map_err(|e| StrategyMiss::Query(e.to_string()))?;
        let metadata = bus
            .metadata(&window.class_name)
            .map_err(|e| StrategyMiss::Query(e.to_string()))?;
        Ok(metadata_info(&metadata))
    }
}

/// Blocking connection to the session bus.
struct SessionBus {
    conn: Connection,
}

impl SessionBus {
    fn connect() -> zbus::Result<Self> {
        Ok(Self {
            conn: Connection::session()?,
        })
    }

    /// MPRIS sessions keyed by the pid owning their bus name.
    fn mpris_windows(&self) -> HashMap<u32, Vec<Window>> {
        let mut windows: HashMap<u32, Vec<Window>> = HashMap::new();

        let dbus = match DBusProxy::new(&self.conn) {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!("Failed to create D-Bus proxy: {e}");
                return windows;
            }
        };
        let names = match dbus.list_names() {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to list D-Bus names: {e}");
                return windows;
            }
        };

        let sessions = names
            .iter()
            .map(|n| n.as_str())
            .filter(|n| n.starts_with(MPRIS_BUS_PREFIX));
        for (i, bus_name) in sessions.enumerate() {
            let Some(pid) = BusName::try_from(bus_name)
                .ok()
                .and_then(|name| dbus.get_connection_unix_process_id(name).ok())
            else {
                debug!(bus = %bus_name, "Could not resolve MPRIS session owner");
                continue;
            };

            let title = self
                .metadata(bus_name)
                .ok()
                .and_then(|m| string_entry(&m, "xesam:title"))
                .filter(|t| !t.trim().is_empty());
            let text = match title {
                Some(title) => title,
                None => self.identity(bus_name).unwrap_or_default(),
            };

            debug!(pid, bus = %bus_name, title = %text, "Found MPRIS session");
            windows.entry(pid).or_default().push(Window {
                handle: i as u64 + 1,
                class_name: bus_name.to_string(),
                text,
            });
        }
        windows
    }

    fn metadata(&self, bus_name: &str) -> zbus::Result<HashMap<String, OwnedValue>> {
        MediaPlayer2PlayerProxyBlocking::builder(&self.conn)
            .destination(bus_name.to_string())?
            .cache_properties(CacheProperties::No)
            .build()?
            .metadata()
    }

    fn identity(&self, bus_name: &str) -> zbus::Result<String> {
        MediaPlayer2ProxyBlocking::builder(&self.conn)
            .destination(bus_name.to_string())?
            .cache_properties(CacheProperties::No)
            .build()?
            .identity()
    }
}

fn string_entry(metadata: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    metadata.get(key)?.downcast_ref::<String>().ok()
}

/// Track title and location from MPRIS metadata.
fn metadata_info(metadata: &HashMap<String, OwnedValue>) -> Vec<MediaInfo> {
    let mut info = Vec::new();
    if let Some(title) = string_entry(metadata, "xesam:title") {
        let title = title.trim();
        if !title.is_empty() {
            info.push(MediaInfo::new(MediaInfoType::Title, title));
        }
    }
    if let Some(url) = string_entry(metadata, "xesam:url") {
        if let Some(location) = url_info(&url) {
            info.push(location);
        }
    }
    info
}

fn url_info(url: &str) -> Option<MediaInfo> {
    if url.is_empty() {
        return None;
    }
    match url.strip_prefix("file://") {
        Some(path) => urlencoding_decode(path).map(|p| MediaInfo::new(MediaInfoType::File, p)),
        None => Some(MediaInfo::new(MediaInfoType::Url, url)),
    }
}

/// Executable name of `pid`: the file name of argv[0], or `comm` for
/// processes without a command line (kernel threads, zombies).
fn process_name(pid: u32) -> io::Result<String> {
    let base = Path::new(PROC).join(pid.to_string());
    let cmdline = fs::read(base.join("cmdline"))?;
    let argv0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
    let argv0 = String::from_utf8_lossy(argv0);
    // Some programs rewrite argv into one space-separated string.
    let argv0 = argv0.split(" --").next().unwrap_or_default();

    if let Some(name) = Path::new(argv0).file_name().and_then(|n| n.to_str()) {
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
    let comm = fs::read_to_string(base.join("comm"))?;
    Ok(comm.trim_end().to_string())
}

fn io_miss(e: io::Error) -> StrategyMiss {
    match e.kind() {
        io::ErrorKind::PermissionDenied => StrategyMiss::AccessDenied,
        io::ErrorKind::NotFound => StrategyMiss::NotFound,
        _ => StrategyMiss::Query(e.to_string()),
    }
}

/// Simple percent-decoding for file paths.
fn urlencoding_decode(s: &str) -> Option<String> {
    let mut result = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(byte) = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                result.push(byte);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(result).ok()
}
