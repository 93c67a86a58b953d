use std::sync::Arc;

use crate::error::StrategyMiss;
use crate::model::{MediaInfo, MediaInfoType, Player};
use crate::platform::Platform;
use crate::strategy::{Extractor, Target};

/// Asks the platform's automation surface about the window.
pub struct UiAutomation {
    platform: Arc<dyn Platform>,
}

impl UiAutomation {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }
}

impl Extractor for UiAutomation {
    fn extract(&self, target: &Target<'_>) -> Result<Vec<MediaInfo>, StrategyMiss> {
        let info: Vec<MediaInfo> = self
            .platform
            .automation(target.player, target.process, target.window)?
            .into_iter()
            .filter_map(|info| {
                let value = info.value.trim();
                (!value.is_empty()).then(|| MediaInfo::new(info.info_type, value))
            })
            .collect();
        if info.is_empty() {
            return Err(StrategyMiss::NotFound);
        }
        Ok(info)
    }
}

/// Title information in an accessible window name.
///
/// The name usually repeats the caption, so it goes through the player's
/// title format and yields nothing when the format does not match.
pub fn caption_info(player: &Player, caption: &str) -> Vec<MediaInfo> {
    match &player.window_title_format {
        Some(format) => format.extract(caption, MediaInfoType::Title),
        None => {
            let caption = caption.trim();
            if caption.is_empty() {
                Vec::new()
            } else {
                vec![MediaInfo::new(MediaInfoType::Title, caption)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Process, Window};
    use crate::platform::StaticPlatform;
    use crate::player_db::PlayerDatabase;

    fn player(text: &str) -> Player {
        PlayerDatabase::parse(text).unwrap().players.remove(0)
    }

    fn run(platform: StaticPlatform) -> Result<Vec<MediaInfo>, StrategyMiss> {
        let player = player("P\n\texecutables:\n\t\tp\n\tstrategies:\n\t\tui_automation\n");
        let process = Process {
            id: 3,
            name: "p".into(),
        };
        let window = Window {
            handle: 8,
            class_name: "C".into(),
            text: String::new(),
        };
        UiAutomation::new(Arc::new(platform)).extract(&Target {
            player: &player,
            process: &process,
            window: &window,
        })
    }

    #[test]
    fn test_values_trimmed_and_blanks_dropped() {
        let platform = StaticPlatform::new().with_automation(
            8,
            vec![
                MediaInfo::new(MediaInfoType::Url, "  https://example.com/v  "),
                MediaInfo::new(MediaInfoType::Tab, "   "),
                MediaInfo::new(MediaInfoType::Title, "\tSong\n"),
            ],
        );
        assert_eq!(
            run(platform).unwrap(),
            vec![
                MediaInfo::new(MediaInfoType::Url, "https://example.com/v"),
                MediaInfo::new(MediaInfoType::Title, "Song"),
            ]
        );
    }

    #[test]
    fn test_only_blank_values_is_not_found() {
        let platform = StaticPlatform::new()
            .with_automation(8, vec![MediaInfo::new(MediaInfoType::Title, " ")]);
        assert!(matches!(run(platform), Err(StrategyMiss::NotFound)));
    }

    #[test]
    fn test_platform_miss_is_passed_through() {
        let platform = StaticPlatform::new();
        assert!(matches!(run(platform), Err(StrategyMiss::NotFound)));
        let platform = StaticPlatform::new().with_automation(8, Vec::new());
        assert!(matches!(run(platform), Err(StrategyMiss::NotFound)));
    }

    #[test]
    fn test_caption_parsed_with_title_format() {
        let vlc = player(
            "VLC\n\texecutables:\n\t\tvlc\n\twindow_title_format:\n\t\t%title% - VLC media player\n",
        );
        assert_eq!(
            caption_info(&vlc, "Song - Artist - VLC media player"),
            vec![MediaInfo::new(MediaInfoType::Title, "Song - Artist")]
        );
        assert!(caption_info(&vlc, "VLC media player").is_empty());
    }

    #[test]
    fn test_caption_without_format_is_whole_title() {
        let plain = player("P\n\texecutables:\n\t\tp\n");
        assert_eq!(
            caption_info(&plain, "  Song  "),
            vec![MediaInfo::new(MediaInfoType::Title, "Song")]
        );
        assert!(caption_info(&plain, "   ").is_empty());
    }

    #[test]
    fn test_bundled_media_player_caption() {
        let db = PlayerDatabase::embedded().unwrap();
        let player = db.find("Media Player").unwrap();
        assert_eq!(
            caption_info(player, "Heroes - Media Player"),
            vec![MediaInfo::new(MediaInfoType::Title, "Heroes")]
        );
        assert!(caption_info(player, "Media Player").is_empty());
    }
}
