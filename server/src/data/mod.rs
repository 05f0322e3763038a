use std::time::Instant;

use snakesweeper_common::models::GameConfig;

/// What a tile holds once the board exists. `Near(0)` is an open tile, the
/// kind that cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileContent {
    Mine,
    Near(u8),
}

impl TileContent {
    pub fn is_mine(self) -> bool {
        matches!(self, TileContent::Mine)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub content: TileContent,
    pub revealed: bool,
    pub flagged: bool,
}

impl Tile {
    pub fn hidden(content: TileContent) -> Self {
        Self {
            content,
            revealed: false,
            flagged: false,
        }
    }
}

#[derive(Debug)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub tiles: Vec<Tile>,
}

/// Lifecycle of one session. The timer starts when the board is generated on
/// the first reveal, not when the session is created.
#[derive(Debug, Clone, Copy)]
pub enum Phase {
    PreGame,
    InGame { started_at: Instant },
    Won { elapsed: u64 },
    Lost,
}

/// One playable game. `board` stays empty until the first left click so the
/// safe zone can be centered on it. `remaining` counts unrevealed tiles and
/// hits `config.mines` exactly when every safe tile is open.
#[derive(Debug)]
pub struct GameSession {
    pub config: GameConfig,
    pub phase: Phase,
    pub board: Option<Board>,
    pub remaining: usize,
    pub flags: usize,
}
