use tracing::debug;

use crate::enumerate::Snapshot;
use crate::model::{Player, Process, Window};
use crate::pattern::Pattern;

/// A window of a process attributed to a configured player.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub player: &'a Player,
    pub process: &'a Process,
    pub window: &'a Window,
}

/// Whether an executable pattern accepts a process name.
///
/// Patterns without an extension also accept the name with a trailing
/// `.exe`, so `mpc-hc64` matches `mpc-hc64.exe`.
pub fn executable_matches(pattern: &Pattern, name: &str) -> bool {
    if pattern.is_match(name) {
        return true;
    }
    if pattern.has_extension() {
        return false;
    }
    let Some(cut) = name.len().checked_sub(4) else {
        return false;
    };
    match (name.get(..cut), name.get(cut..)) {
        (Some(stem), Some(ext)) => ext.eq_ignore_ascii_case(".exe") && pattern.is_match(stem),
        _ => false,
    }
}

/// The first player, in configuration order, whose executables accept
/// `process`.
pub fn find_player<'a>(players: &'a [Player], process: &Process) -> Option<&'a Player> {
    players.iter().find(|player| {
        player
            .executables
            .iter()
            .any(|pattern| executable_matches(pattern, &process.name))
    })
}

fn window_matches(player: &Player, window: &Window) -> bool {
    player.windows.is_empty()
        || player
            .windows
            .iter()
            .any(|pattern| pattern.is_match(&window.class_name))
}

/// Pair every window of every recognised process with its player.
/// Processes no player claims are dropped.
pub fn match_players<'a>(players: &'a [Player], snapshot: &'a Snapshot) -> Vec<MatchedPair<'a>> {
    let mut pairs = Vec::new();
    for entry in &snapshot.entries {
        let Some(player) = find_player(players, &entry.process) else {
            continue;
        };
        let before = pairs.len();
        pairs.extend(
            entry
                .windows
                .iter()
                .filter(|window| window_matches(player, window))
                .map(|window| MatchedPair {
                    player,
                    process: &entry.process,
                    window,
                }),
        );
        debug!(
            player = %player.name,
            pid = entry.process.id,
            process = %entry.process.name,
            windows = pairs.len() - before,
            "Matched process"
        );
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ProcessEntry;
    use crate::player_db::PlayerDatabase;

    fn players(text: &str) -> Vec<Player> {
        PlayerDatabase::parse(text).unwrap().players
    }

    fn entry(id: u32, name: &str, windows: &[(u64, &str)]) -> ProcessEntry {
        ProcessEntry {
            process: Process {
                id,
                name: name.to_string(),
            },
            windows: windows
                .iter()
                .map(|(handle, class)| Window {
                    handle: *handle,
                    class_name: class.to_string(),
                    text: "Some Title".into(),
                })
                .collect(),
        }
    }

    fn snapshot(entries: Vec<ProcessEntry>) -> Snapshot {
        Snapshot {
            entries,
            skipped: 0,
        }
    }

    #[test]
    fn test_executable_matches() {
        let bare = Pattern::executable("mpc-hc64").unwrap();
        assert!(executable_matches(&bare, "mpc-hc64"));
        assert!(executable_matches(&bare, "mpc-hc64.exe"));
        assert!(executable_matches(&bare, "MPC-HC64.EXE"));
        assert!(!executable_matches(&bare, "mpc-hc64.dll"));
        assert!(!executable_matches(&bare, "mpc-hc"));

        let with_ext = Pattern::executable("vlc.exe").unwrap();
        assert!(executable_matches(&with_ext, "VLC.exe"));
        assert!(!executable_matches(&with_ext, "vlc"));

        let glob = Pattern::executable("potplayer*").unwrap();
        assert!(executable_matches(&glob, "PotPlayerMini64.exe"));
    }

    #[test]
    fn test_first_player_in_config_order_wins() {
        let players = players(
            "Specific\n\texecutables:\n\t\tmpv\n\tstrategies:\n\t\twindow_title\n\
             Generic\n\texecutables:\n\t\tmp*\n\tstrategies:\n\t\twindow_title\n",
        );
        let snapshot = snapshot(vec![
            entry(1, "mpv", &[(1, "mpv")]),
            entry(2, "mplayer", &[(2, "MPlayer")]),
        ]);

        let pairs = match_players(&players, &snapshot);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].player.name, "Specific");
        assert_eq!(pairs[1].player.name, "Generic");
    }

    #[test]
    fn test_window_classes_narrow_pairs() {
        let players = players(
            "VLC\n\texecutables:\n\t\tvlc\n\twindows:\n\t\tQt5QWindowIcon\n\tstrategies:\n\t\twindow_title\n",
        );
        let snapshot = snapshot(vec![entry(
            7,
            "vlc.exe",
            &[(1, "Qt5QWindowIcon"), (2, "ToolTip"), (3, "qt5qwindowicon")],
        )]);

        let pairs = match_players(&players, &snapshot);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].window.handle, 1);
        assert_eq!(pairs[0].process.id, 7);
    }

    #[test]
    fn test_no_window_patterns_pairs_every_window() {
        let players = players("P\n\texecutables:\n\t\tp\n\tstrategies:\n\t\twindow_title\n");
        let snapshot = snapshot(vec![entry(1, "p", &[(1, "A"), (2, "B")])]);
        assert_eq!(match_players(&players, &snapshot).len(), 2);
    }

    #[test]
    fn test_unmatched_processes_dropped() {
        let players = players("P\n\texecutables:\n\t\tp\n\tstrategies:\n\t\twindow_title\n");
        let snapshot = snapshot(vec![
            entry(1, "explorer.exe", &[(1, "CabinetWClass")]),
            entry(2, "p", &[]),
        ]);
        assert!(match_players(&players, &snapshot).is_empty());
    }
}
