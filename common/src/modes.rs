//! Preset difficulty modes. Leaderboards are keyed by mode id, so the
//! dimensions behind an id must never change.

use serde::{Deserialize, Serialize};

use crate::models::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamemode {
    EzMode,
    Beginner,
    Intermediate,
    Expert,
    Why,
}

impl Gamemode {
    pub const ALL: [Gamemode; 5] = [
        Gamemode::EzMode,
        Gamemode::Beginner,
        Gamemode::Intermediate,
        Gamemode::Expert,
        Gamemode::Why,
    ];

    pub fn mode_id(self) -> u8 {
        match self {
            Gamemode::EzMode => 0,
            Gamemode::Beginner => 1,
            Gamemode::Intermediate => 2,
            Gamemode::Expert => 3,
            Gamemode::Why => 4,
        }
    }

    pub fn from_mode_id(id: u8) -> Option<Gamemode> {
        Gamemode::ALL.into_iter().find(|mode| mode.mode_id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Gamemode::EzMode => "EZMode",
            Gamemode::Beginner => "Beginner",
            Gamemode::Intermediate => "Intermediate",
            Gamemode::Expert => "Expert",
            Gamemode::Why => "Why",
        }
    }

    pub fn config(self) -> GameConfig {
        let (width, height, mines) = match self {
            Gamemode::EzMode => (9, 9, 3),
            Gamemode::Beginner => (9, 9, 10),
            Gamemode::Intermediate => (16, 16, 40),
            Gamemode::Expert => (30, 16, 99),
            Gamemode::Why => (40, 40, 666),
        };
        GameConfig {
            width,
            height,
            mines,
            mode_id: Some(self.mode_id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_ids_round_trip() {
        for mode in Gamemode::ALL {
            assert_eq!(Gamemode::from_mode_id(mode.mode_id()), Some(mode));
        }
        assert_eq!(Gamemode::from_mode_id(200), None);
    }

    #[test]
    fn every_preset_validates() {
        for mode in Gamemode::ALL {
            let config = mode.config();
            assert!(config.validate().is_ok(), "{} should be playable", mode.label());
            assert_eq!(config.mode_id, Some(mode.mode_id()));
        }
    }

    #[test]
    fn default_config_is_an_unlabeled_beginner_board() {
        let beginner = Gamemode::Beginner.config();
        let config = GameConfig::default();
        assert_eq!(
            (config.width, config.height, config.mines),
            (beginner.width, beginner.height, beginner.mines)
        );
        // Only the preset table hands out mode labels.
        assert_eq!(config.mode_id, None);
    }
}
