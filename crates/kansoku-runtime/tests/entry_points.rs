use std::path::Path;
use std::sync::Arc;

use kansoku_detect::model::{MediaInfoType, Process, Window};
use kansoku_detect::{ConfigError, StaticPlatform};
use kansoku_runtime::{
    get_media_results, get_media_results_async, get_player_list, DetectError, DetectOptions,
    Engine, MediaInfo,
};

const PLAYERS: &str = "\
# Test players
Sample
\texecutables:
\t\tsample.exe
\tstrategies:
\t\twindow_title
\twindow_title_format:
\t\t%title% - %artist%

Clip Viewer
\texecutables:
\t\tclipview
\tstrategies:
\t\topen_files
\t\twindow_title

Tabby
\texecutables:
\t\ttabby
\ttype:
\t\tweb_browser
\tstrategies:
\t\tui_automation
\t\twindow_title
\tstrategy_policy:
\t\tfirst_match
";

fn write_config(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn window(handle: u64, text: &str) -> Window {
    Window {
        handle,
        class_name: "MainWindow".into(),
        text: text.to_string(),
    }
}

fn process(id: u32, name: &str) -> Process {
    Process {
        id,
        name: name.to_string(),
    }
}

fn snapshot() -> Arc<StaticPlatform> {
    Arc::new(
        StaticPlatform::new()
            .with_process(process(42, "sample.exe"), vec![window(1, "Nocturne - Chopin")])
            .with_process(process(7, "clipview"), vec![window(3, "Clip Viewer")])
            .with_open_files(7, ["/home/user/Videos/ep01.mkv", "/home/user/notes.txt"])
            .with_process(process(99, "tabby"), vec![window(5, "Watching - Site")])
            .with_automation(
                5,
                vec![
                    MediaInfo::new(MediaInfoType::Url, "https://example.com/watch/1"),
                    MediaInfo::new(MediaInfoType::Tab, "Watching"),
                ],
            )
            .with_process(process(100, "explorer.exe"), vec![window(9, "Desktop")]),
    )
}

#[test]
fn test_missing_file_is_config_error_from_both_entry_points() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("players.conf");

    let err = get_media_results(Some(missing.as_path())).unwrap_err();
    assert!(matches!(err, DetectError::Config(ConfigError::Read { .. })));

    let err = get_player_list(Some(missing.as_path())).unwrap_err();
    assert!(matches!(err, DetectError::Config(ConfigError::Read { .. })));
}

#[test]
fn test_empty_path_is_config_error() {
    let err = get_player_list(Some(Path::new(""))).unwrap_err();
    assert!(matches!(err, DetectError::Config(ConfigError::EmptyPath)));

    let err = get_media_results(Some(Path::new(""))).unwrap_err();
    assert!(matches!(err, DetectError::Config(ConfigError::EmptyPath)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "bad.conf",
        "Broken\n\texecutables:\n\t\tbroken\n\tstrategies:\n\t\tteleport\n",
    );
    let err = get_media_results(Some(path.as_path())).unwrap_err();
    assert!(matches!(
        err,
        DetectError::Config(ConfigError::UnknownStrategy { line: 5, .. })
    ));
}

#[test]
fn test_player_list_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "players.conf", PLAYERS);

    let list = get_player_list(Some(path.as_path())).unwrap();
    assert_eq!(list.players, vec!["Sample", "Clip Viewer"]);
    assert_eq!(list.browsers, vec!["Tabby"]);
}

#[test]
fn test_bundled_player_list() {
    let list = get_player_list(None).unwrap();
    assert!(list.players.iter().any(|n| n == "mpv"));
    assert!(list.browsers.iter().any(|n| n == "Google Chrome"));
}

#[test]
fn test_engine_on_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "players.conf", PLAYERS);

    let results = Engine::with_config(&path)
        .with_platform(snapshot())
        .media_results()
        .unwrap();

    let summary: Vec<(&str, u32)> = results
        .iter()
        .map(|r| (r.player.name.as_str(), r.process.id))
        .collect();
    assert_eq!(summary, vec![("Clip Viewer", 7), ("Sample", 42), ("Tabby", 99)]);

    assert_eq!(
        results[0].media[0].information,
        vec![
            MediaInfo::new(MediaInfoType::File, "/home/user/Videos/ep01.mkv"),
            MediaInfo::new(MediaInfoType::Title, "Clip Viewer"),
        ]
    );
    assert_eq!(
        results[1].media[0].information,
        vec![MediaInfo::new(MediaInfoType::Title, "Nocturne")]
    );
    // First match: automation answered, so the window title is never parsed.
    assert_eq!(
        results[2].media[0].information,
        vec![
            MediaInfo::new(MediaInfoType::Url, "https://example.com/watch/1"),
            MediaInfo::new(MediaInfoType::Tab, "Watching"),
        ]
    );
}

#[test]
fn test_engine_media_filter_and_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "players.conf", PLAYERS);

    let mut options = DetectOptions::default();
    options.engine.workers = 1;
    let results = Engine::with_config(&path)
        .with_platform(snapshot())
        .with_options(options)
        .with_media_filter(|info| info.info_type == MediaInfoType::File)
        .media_results()
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].player.name, "Clip Viewer");
}

#[test]
fn test_engine_overrides_replace_and_append() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_config(&dir, "players.conf", PLAYERS);
    let user = write_config(
        &dir,
        "user.conf",
        "Sample\n\texecutables:\n\t\tsample.exe\n\tstrategies:\n\t\twindow_title\n\
         Extra\n\texecutables:\n\t\textra\n\tstrategies:\n\t\twindow_title\n",
    );

    let engine = Engine::with_config(&base).with_overrides(&user);
    let list = engine.player_list().unwrap();
    assert_eq!(list.players, vec!["Sample", "Clip Viewer", "Extra"]);

    // The override has no title format, so the whole title is reported.
    let results = engine.with_platform(snapshot()).media_results().unwrap();
    let sample = results.iter().find(|r| r.player.name == "Sample").unwrap();
    assert_eq!(
        sample.media[0].information,
        vec![MediaInfo::new(MediaInfoType::Title, "Nocturne - Chopin")]
    );
}

#[test]
fn test_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "players.conf", PLAYERS);
    let results = Engine::with_config(&path)
        .with_platform(snapshot())
        .media_results()
        .unwrap();

    let json = serde_json::to_value(&results[1]).unwrap();
    assert_eq!(json["player"]["name"], "Sample");
    assert_eq!(json["player"]["type"], "Default");
    assert_eq!(json["player"]["strategies"][0], "WindowTitle");
    assert_eq!(json["process"]["id"], 42);
    assert_eq!(json["window"]["className"], "MainWindow");
    assert_eq!(json["window"]["text"], "Nocturne - Chopin");
    assert_eq!(json["media"][0]["state"], "Unknown");
    assert_eq!(json["media"][0]["information"][0]["type"], "Title");
    assert_eq!(json["media"][0]["information"][0]["value"], "Nocturne");
}

#[tokio::test]
async fn test_async_matches_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "players.conf", PLAYERS);
    let engine = Engine::with_config(&path).with_platform(snapshot());

    let sync = engine.media_results().unwrap();
    let async_results = engine.media_results_async().await.unwrap();
    assert_eq!(sync.len(), async_results.len());
    for (a, b) in sync.iter().zip(&async_results) {
        assert_eq!(a.player.name, b.player.name);
        assert_eq!(a.media, b.media);
    }
}

#[tokio::test]
async fn test_async_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = get_media_results_async(Some(dir.path().join("nope.conf")))
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::Config(_)));
}

#[cfg(target_os = "linux")]
#[test]
fn test_real_backend_with_unknown_players_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "players.conf",
        "Nothing\n\texecutables:\n\t\tno-such-player-kansoku\n\tstrategies:\n\t\twindow_title\n",
    );
    assert!(get_media_results(Some(path.as_path())).unwrap().is_empty());
}
