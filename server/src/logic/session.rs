use std::time::Instant;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use snakesweeper_common::{
    models::{ConfigError, GameConfig, GameStatus, TileView},
    protocol::{ClickKind, TileUpdate},
};

use crate::data::{Board, GameSession, Phase};
use crate::logic::board::RevealOutcome;
use crate::scores::ScoreSubmission;

/// Everything a click changed, ready to go out to clients.
#[derive(Debug)]
pub struct ClickReport {
    pub updates: Vec<TileUpdate>,
    pub status: GameStatus,
    pub flags: isize,
    pub elapsed: Option<u64>,
    /// Present exactly once, on the click that wins a preset-mode game.
    pub score: Option<ScoreSubmission>,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::PreGame,
            board: None,
            remaining: config.tile_count(),
            flags: 0,
        })
    }

    pub fn status(&self) -> GameStatus {
        match self.phase {
            Phase::PreGame => GameStatus::PreGame,
            Phase::InGame { .. } => GameStatus::InGame,
            Phase::Won { .. } => GameStatus::Won,
            Phase::Lost => GameStatus::Lost,
        }
    }

    /// Mines minus placed flags. Negative when the player overflags.
    pub fn flags_left(&self) -> isize {
        self.config.mines as isize - self.flags as isize
    }

    pub fn elapsed(&self) -> Option<u64> {
        match self.phase {
            Phase::Won { elapsed } => Some(elapsed),
            _ => None,
        }
    }

    /// Row-major view of the board. Before the first reveal no board exists,
    /// so every tile reads as hidden.
    pub fn board_rows(&self) -> Vec<Vec<TileView>> {
        match &self.board {
            Some(board) => board.rows(),
            None => vec![vec![TileView::Hidden; self.config.width]; self.config.height],
        }
    }

    /// Applies one classified click. Finished games ignore everything; before
    /// the first reveal only a left click does anything, because it is what
    /// summons the board with the safe zone under it.
    #[instrument(level = "trace", skip(self, rng))]
    pub fn click(&mut self, index: usize, kind: ClickKind, rng: &mut impl Rng) -> ClickReport {
        let mut updates = Vec::new();
        let mut score = None;

        match (self.phase, kind) {
            (Phase::Won { .. } | Phase::Lost, _) => {
                debug!(index, "ignoring click on finished game");
            }
            (Phase::PreGame, ClickKind::Left) => {
                if index < self.config.tile_count() {
                    self.board = Some(Board::generate(&self.config, index, rng));
                    let started_at = Instant::now();
                    self.phase = Phase::InGame { started_at };
                    info!(index, "board generated on first reveal");
                    score = self.resolve_reveal(index, false, started_at, &mut updates);
                } else {
                    warn!(index, "reveal outside the board");
                }
            }
            (Phase::PreGame, _) => {
                debug!(index, ?kind, "ignoring click before the first reveal");
            }
            (Phase::InGame { started_at }, ClickKind::Left) => {
                score = self.resolve_reveal(index, false, started_at, &mut updates);
            }
            (Phase::InGame { started_at }, ClickKind::LeftRight) => {
                score = self.resolve_reveal(index, true, started_at, &mut updates);
            }
            (Phase::InGame { .. }, ClickKind::Right) => {
                if let Some(board) = &mut self.board {
                    match board.toggle_flag(index, &mut updates) {
                        Some(true) => self.flags += 1,
                        Some(false) => self.flags -= 1,
                        None => debug!(index, "flag toggle ignored"),
                    }
                }
            }
        }

        ClickReport {
            updates,
            status: self.status(),
            flags: self.flags_left(),
            elapsed: self.elapsed(),
            score,
        }
    }

    fn resolve_reveal(
        &mut self,
        index: usize,
        chord: bool,
        started_at: Instant,
        updates: &mut Vec<TileUpdate>,
    ) -> Option<ScoreSubmission> {
        let Some(board) = &mut self.board else {
            return None;
        };

        let outcome = if chord {
            board.reveal_adjacent(index, updates)
        } else {
            board.reveal_tile(index, updates)
        };

        match outcome {
            RevealOutcome::Ignored => None,
            RevealOutcome::HitMine => {
                info!(index, "mine hit, game lost");
                board.reveal_mines(updates);
                self.phase = Phase::Lost;
                None
            }
            RevealOutcome::Revealed(opened) => {
                self.remaining -= opened;
                debug!(index, opened, remaining = self.remaining, "tiles revealed");
                if self.remaining == self.config.mines {
                    let elapsed = started_at.elapsed().as_secs();
                    self.phase = Phase::Won { elapsed };
                    info!(elapsed, "all safe tiles revealed, game won");
                    return self
                        .config
                        .mode_id
                        .map(|mode_id| ScoreSubmission { mode_id, seconds: elapsed });
                }
                None
            }
        }
    }

    /// Drops the board and every bit of progress. The next left click starts
    /// a fresh game with a fresh safe zone.
    #[instrument(level = "trace", skip(self))]
    pub fn reset(&mut self) {
        info!("session reset");
        self.phase = Phase::PreGame;
        self.board = None;
        self.remaining = self.config.tile_count();
        self.flags = 0;
    }
}
