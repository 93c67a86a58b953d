use crate::error::StrategyMiss;
use crate::model::{MediaInfo, MediaInfoType};
use crate::strategy::{Extractor, Target};

/// Parses the window text with the player's title format.
pub struct WindowTitle;

impl Extractor for WindowTitle {
    fn extract(&self, target: &Target<'_>) -> Result<Vec<MediaInfo>, StrategyMiss> {
        let text = &target.window.text;
        if text.trim().is_empty() {
            return Err(StrategyMiss::NotFound);
        }

        // Browser titles name the active tab rather than the media.
        let whole = if target.player.is_browser() {
            MediaInfoType::Tab
        } else {
            MediaInfoType::Title
        };

        let info = match &target.player.window_title_format {
            Some(format) => format.extract(text, whole),
            None => vec![MediaInfo::new(whole, text.trim())],
        };
        if info.is_empty() {
            return Err(StrategyMiss::NotFound);
        }
        Ok(info)
    }
}
