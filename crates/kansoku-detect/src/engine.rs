use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::enumerate::enumerate;
use crate::error::DetectError;
use crate::matcher::{match_players, MatchedPair};
use crate::model::{DetectionResult, Media, MediaInfo, Player};
use crate::options::DetectOptions;
use crate::platform::{self, Platform};
use crate::strategy::{MediaFilter, StrategyTable};

/// Runs detection calls against one platform backend.
///
/// Every call takes a fresh snapshot; nothing is cached between calls.
pub struct Detector {
    platform: Arc<dyn Platform>,
    options: DetectOptions,
    filter: Arc<MediaFilter>,
}

impl Detector {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            options: DetectOptions::default(),
            filter: Arc::new(|_: &MediaInfo| true),
        }
    }

    /// Detector for the running OS.
    pub fn system() -> Result<Self, DetectError> {
        Ok(Self::new(platform::system()?))
    }

    pub fn with_options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }

    /// Only keep media information accepted by `filter`.
    pub fn with_media_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MediaInfo) -> bool + Send + Sync + 'static,
    {
        self.filter = Arc::new(filter);
        self
    }

    /// Find what the configured players are currently showing.
    pub fn detect(&self, players: &[Player]) -> Vec<DetectionResult> {
        let started = Instant::now();

        let snapshot = enumerate(self.platform.as_ref());
        let pairs = match_players(players, &snapshot);
        let table = StrategyTable::new(self.platform.clone(), self.options.open_files.clone());
        let media = self.extract_all(&table, &pairs);
        let results = aggregate(&pairs, media);

        info!(
            processes = snapshot.len(),
            skipped = snapshot.skipped,
            pairs = pairs.len(),
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detection finished"
        );
        results
    }

    /// Media for every pair, in pair order.
    fn extract_all(&self, table: &StrategyTable, pairs: &[MatchedPair<'_>]) -> Vec<Media> {
        let filter: &MediaFilter = self.filter.as_ref();
        let workers = self.options.worker_count(pairs.len());
        if workers <= 1 || pairs.len() <= 1 {
            return pairs.iter().map(|pair| table.extract(pair, filter)).collect();
        }

        let next = AtomicUsize::new(0);
        let work = || {
            let mut done = Vec::new();
            loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                let Some(pair) = pairs.get(i) else {
                    break;
                };
                done.push((i, table.extract(pair, filter)));
            }
            done
        };

        let mut slots: Vec<Option<Media>> = vec![None; pairs.len()];
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .filter_map(|n| {
                    std::thread::Builder::new()
                        .name(format!("kansoku-extract-{n}"))
                        .spawn_scoped(scope, &work)
                        .map_err(|e| warn!("Failed to spawn extraction worker: {e}"))
                        .ok()
                })
                .collect();
            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (i, media) in done {
                            slots[i] = Some(media);
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        // Pairs left over when no worker could be spawned run here.
        slots
            .into_iter()
            .zip(pairs)
            .map(|(slot, pair)| slot.unwrap_or_else(|| table.extract(pair, filter)))
            .collect()
    }
}
