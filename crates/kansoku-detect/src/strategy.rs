//! Extraction strategies and the per-player policy that combines them.

mod open_files;
mod ui_automation;
mod window_title;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::StrategyMiss;
use crate::model::{Media, MediaInfo, Strategy, StrategyPolicy};
use crate::options::OpenFilesOptions;
use crate::platform::Platform;

pub use crate::matcher::MatchedPair as Target;
pub use open_files::OpenFiles;
pub use ui_automation::{caption_info, UiAutomation};
pub use window_title::WindowTitle;

/// One extraction technique.
pub trait Extractor: Send + Sync {
    fn extract(&self, target: &Target<'_>) -> Result<Vec<MediaInfo>, StrategyMiss>;
}

/// Caller-supplied predicate deciding which media information is kept.
pub type MediaFilter = dyn Fn(&MediaInfo) -> bool + Send + Sync;

/// Handlers indexed by [`Strategy`].
pub struct StrategyTable {
    handlers: [Box<dyn Extractor>; 3],
}

impl StrategyTable {
    pub fn new(platform: Arc<dyn Platform>, options: OpenFilesOptions) -> Self {
        Self {
            handlers: [
                Box::new(WindowTitle),
                Box::new(OpenFiles::new(platform.clone(), options)),
                Box::new(UiAutomation::new(platform)),
            ],
        }
    }

    pub fn handler(&self, strategy: Strategy) -> &dyn Extractor {
        self.handlers[strategy.index()].as_ref()
    }

    /// Run the player's strategies against one window.
    pub fn extract(&self, target: &Target<'_>, filter: &MediaFilter) -> Media {
        let player = target.player;
        let mut media = Media::default();

        for &strategy in &player.strategies {
            let found = match self.handler(strategy).extract(target) {
                Ok(found) => found,
                Err(miss) => {
                    debug!(
                        player = %player.name,
                        pid = target.process.id,
                        ?strategy,
                        %miss,
                        "Strategy found nothing"
                    );
                    continue;
                }
            };

            let before = media.information.len();
            for info in found {
                if filter(&info) && !media.information.contains(&info) {
                    media.information.push(info);
                }
            }
            let added = media.information.len() - before;
            trace!(player = %player.name, ?strategy, added, "Strategy finished");

            if added > 0 && player.strategy_policy == StrategyPolicy::FirstMatch {
                break;
            }
        }
        media
    }
}
