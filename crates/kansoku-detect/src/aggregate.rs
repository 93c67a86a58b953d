use crate::matcher::MatchedPair;
use crate::model::{DetectionResult, Media, Player, PlayerList};

/// One result per pair that yielded media, in pair order.
///
/// `media` must line up with `pairs`.
pub fn aggregate(pairs: &[MatchedPair<'_>], media: Vec<Media>) -> Vec<DetectionResult> {
    pairs
        .iter()
        .zip(media)
        .filter(|(_, media)| !media.is_empty())
        .map(|(pair, media)| DetectionResult {
            player: pair.player.clone(),
            process: pair.process.clone(),
            window: pair.window.clone(),
            media: vec![media],
        })
        .collect()
}

/// Names of the configured players and browsers, in configuration order.
pub fn list_names(players: &[Player]) -> PlayerList {
    let (browsers, players): (Vec<&Player>, Vec<&Player>) =
        players.iter().partition(|p| p.is_browser());
    PlayerList {
        players: players.into_iter().map(|p| p.name.clone()).collect(),
        browsers: browsers.into_iter().map(|p| p.name.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaInfo, MediaInfoType, Process, Window};
    use crate::player_db::PlayerDatabase;

    #[test]
    fn test_list_names_partitions_in_order() {
        let db = PlayerDatabase::embedded().unwrap();
        let list = list_names(&db.players);

        assert_eq!(list.players.len() + list.browsers.len(), db.len());
        assert!(list.players.iter().all(|n| !list.browsers.contains(n)));
        assert!(list.browsers.contains(&"Mozilla Firefox".to_string()));
        assert!(list.players.contains(&"VLC media player".to_string()));

        let expected: Vec<&str> = db
            .players
            .iter()
            .filter(|p| !p.is_browser())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(list.players, expected);
    }

    #[test]
    fn test_empty_media_dropped() {
        let players = PlayerDatabase::parse("P\n\texecutables:\n\t\tp\n\tstrategies:\n\t\twindow_title\n")
            .unwrap()
            .players;
        let process = Process {
            id: 1,
            name: "p".into(),
        };
        let windows: Vec<Window> = (1..=2)
            .map(|handle| Window {
                handle,
                class_name: "C".into(),
                text: String::new(),
            })
            .collect();
        let pairs: Vec<MatchedPair> = windows
            .iter()
            .map(|window| MatchedPair {
                player: &players[0],
                process: &process,
                window,
            })
            .collect();

        let found = Media {
            information: vec![MediaInfo::new(MediaInfoType::Title, "x")],
            ..Media::default()
        };
        let results = aggregate(&pairs, vec![Media::default(), found.clone()]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].window.handle, 2);
        assert_eq!(results[0].media, vec![found]);
    }
}
