use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tracing::{info, instrument};

use snakesweeper_common::models::ScoreEntry;

pub type Scores = Arc<ScoreBoard>;

/// How many entries a leaderboard query returns at most.
pub const TOP_LIMIT: usize = 50;

/// A won game on its way to the leaderboard. Only preset modes produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub mode_id: u8,
    pub seconds: u64,
}

/// In-memory leaderboard, sharded by mode. Lives for the process lifetime;
/// scores are not persisted across restarts.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    by_mode: DashMap<u8, Vec<ScoreEntry>>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn submit(&self, player: &str, submission: ScoreSubmission) {
        let submitted_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let entry = ScoreEntry {
            player: player.to_string(),
            mode_id: submission.mode_id,
            seconds: submission.seconds,
            submitted_at,
        };
        info!(
            player,
            mode_id = submission.mode_id,
            seconds = submission.seconds,
            "score recorded"
        );
        self.by_mode
            .entry(submission.mode_id)
            .or_default()
            .push(entry);
    }

    /// The fastest entries, the most recent submission winning ties. Without
    /// a mode filter all modes are merged into one list; the player filter
    /// matches names case-insensitively.
    pub fn top(&self, mode_id: Option<u8>, player: Option<&str>) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = match mode_id {
            Some(id) => self
                .by_mode
                .get(&id)
                .map(|entries| entries.value().clone())
                .unwrap_or_default(),
            None => self
                .by_mode
                .iter()
                .flat_map(|entries| entries.value().clone())
                .collect(),
        };
        if let Some(player) = player {
            entries.retain(|entry| entry.player.eq_ignore_ascii_case(player));
        }
        entries.sort_by_key(|entry| (entry.seconds, Reverse(entry.submitted_at)));
        entries.truncate(TOP_LIMIT);
        entries
    }
}
