use std::sync::Arc;

use crate::error::StrategyMiss;
use crate::model::{MediaInfo, MediaInfoType};
use crate::options::OpenFilesOptions;
use crate::platform::Platform;
use crate::strategy::{Extractor, Target};

/// Reports the media files the player process has open.
pub struct OpenFiles {
    platform: Arc<dyn Platform>,
    options: OpenFilesOptions,
}

impl OpenFiles {
    pub fn new(platform: Arc<dyn Platform>, options: OpenFilesOptions) -> Self {
        Self { platform, options }
    }
}

impl Extractor for OpenFiles {
    fn extract(&self, target: &Target<'_>) -> Result<Vec<MediaInfo>, StrategyMiss> {
        let paths = self.platform.open_files(target.process)?;

        let mut info: Vec<MediaInfo> = Vec::new();
        for path in paths.iter().filter(|p| self.options.is_media_path(p)) {
            let file = MediaInfo::new(MediaInfoType::File, path.to_string_lossy());
            if !info.contains(&file) {
                info.push(file);
            }
        }
        if info.is_empty() {
            return Err(StrategyMiss::NotFound);
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, Process, Window};
    use crate::options::DetectOptions;
    use crate::platform::StaticPlatform;
    use crate::player_db::PlayerDatabase;

    fn fixture() -> (Player, Process, Window) {
        let player = PlayerDatabase::parse("P\n\texecutables:\n\t\tp\n\tstrategies:\n\t\topen_files\n")
            .unwrap()
            .players
            .remove(0);
        let process = Process {
            id: 5,
            name: "p".into(),
        };
        let window = Window {
            handle: 1,
            class_name: "C".into(),
            text: String::new(),
        };
        (player, process, window)
    }

    #[test]
    fn test_media_files_filtered_and_deduplicated() {
        let platform = StaticPlatform::new().with_open_files(
            5,
            [
                "/home/user/.config/p/p.conf",
                "/home/user/Videos/b.mkv",
                "/usr/share/sounds/click.ogg",
                "/home/user/Videos/a.mp4",
                "/home/user/Videos/b.mkv",
            ],
        );
        let extractor = OpenFiles::new(Arc::new(platform), DetectOptions::default().open_files);
        let (player, process, window) = fixture();

        let info = extractor
            .extract(&Target {
                player: &player,
                process: &process,
                window: &window,
            })
            .unwrap();
        assert_eq!(
            info,
            vec![
                MediaInfo::new(MediaInfoType::File, "/home/user/Videos/b.mkv"),
                MediaInfo::new(MediaInfoType::File, "/home/user/Videos/a.mp4"),
            ]
        );
    }

    #[test]
    fn test_denied_and_empty_are_misses() {
        let (player, process, window) = fixture();
        let target = Target {
            player: &player,
            process: &process,
            window: &window,
        };

        let denied = OpenFiles::new(
            Arc::new(StaticPlatform::new().with_open_files_denied(5)),
            DetectOptions::default().open_files,
        );
        assert!(matches!(denied.extract(&target), Err(StrategyMiss::AccessDenied)));

        let nothing = OpenFiles::new(
            Arc::new(StaticPlatform::new().with_open_files(5, ["/tmp/log.txt"])),
            DetectOptions::default().open_files,
        );
        assert!(matches!(nothing.extract(&target), Err(StrategyMiss::NotFound)));
    }
}
