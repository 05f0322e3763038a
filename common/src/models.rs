use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modes::Gamemode;

/// Largest accepted board edge. The biggest preset is 40x40; the cap keeps
/// cascade work and message sizes bounded for custom configs.
pub const MAX_BOARD_EDGE: usize = 64;

/// What a connected client is allowed to see of one tile.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum TileView {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { near: u8 },
    #[serde(rename = "mine")]
    Mine,
    #[serde(rename = "wrong_flag")]
    WrongFlag,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum GameStatus {
    #[serde(rename = "pre_game")]
    PreGame,
    #[serde(rename = "in_game")]
    InGame,
    #[serde(rename = "won")]
    Won,
    #[serde(rename = "lost")]
    Lost,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Board dimensions and mine count for one session. `mode_id` ties the config
/// to a leaderboard mode; custom boards leave it unset and never score, and a
/// label that does not sit on its preset's exact board fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub mode_id: Option<u8>,
}

impl Default for GameConfig {
    fn default() -> Self {
        // Beginner's board. No mode label: those come from the preset table
        // only, so a wire config that omits `mode_id` stays unranked.
        Self {
            width: 9,
            height: 9,
            mines: 10,
            mode_id: None,
        }
    }
}

impl GameConfig {
    /// Area reserved around the first click; mines are never placed there.
    /// Edge compensation keeps the zone this size wherever the click lands,
    /// so validity does not depend on the click position.
    pub fn safe_zone_area(&self) -> usize {
        self.width.min(3) * self.height.min(3)
    }

    pub fn tile_count(&self) -> usize {
        self.width * self.height
    }

    /// Rejects configs the generator could not honor, and mode labels that do
    /// not match their preset. Runs before any board exists; generation itself
    /// never spills mines into the safe zone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if self.width > MAX_BOARD_EDGE || self.height > MAX_BOARD_EDGE {
            return Err(ConfigError::Oversized {
                limit: MAX_BOARD_EDGE,
            });
        }
        if self.mines == 0 {
            return Err(ConfigError::NoMines);
        }
        let max = self.tile_count() - self.safe_zone_area();
        if self.mines > max {
            return Err(ConfigError::TooManyMines {
                mines: self.mines,
                max,
            });
        }
        if let Some(mode_id) = self.mode_id {
            let Some(mode) = Gamemode::from_mode_id(mode_id) else {
                return Err(ConfigError::UnknownMode { mode_id });
            };
            let preset = mode.config();
            if (self.width, self.height, self.mines) != (preset.width, preset.height, preset.mines)
            {
                return Err(ConfigError::ModeMismatch { mode_id });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    EmptyBoard,
    Oversized { limit: usize },
    NoMines,
    TooManyMines { mines: usize, max: usize },
    UnknownMode { mode_id: u8 },
    ModeMismatch { mode_id: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBoard => write!(f, "board must have at least one row and column"),
            Self::Oversized { limit } => {
                write!(f, "board edges are capped at {limit} tiles")
            }
            Self::NoMines => write!(f, "a board needs at least one mine"),
            Self::TooManyMines { mines, max } => write!(
                f,
                "{mines} mines do not fit outside the first-click safe zone (max {max})"
            ),
            Self::UnknownMode { mode_id } => {
                write!(f, "mode id {mode_id} does not name a preset")
            }
            Self::ModeMismatch { mode_id } => {
                write!(f, "board does not match the preset behind mode id {mode_id}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateRequest {
    #[serde(flatten)]
    pub config: GameConfig,
    #[serde(default)]
    pub player: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}

/// One leaderboard row. Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player: String,
    pub mode_id: u8,
    pub seconds: u64,
    pub submitted_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoresResponse {
    pub scores: Vec<ScoreEntry>,
}
