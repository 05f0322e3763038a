use serde::{Deserialize, Serialize};

use crate::models::{GameConfig, GameStatus, TileView};

/// Meaning of a completed click gesture. Clients collapse their raw button
/// events into one of these before anything goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickKind {
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "left_right")]
    LeftRight,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "click")]
    Click { index: usize, kind: ClickKind },
    #[serde(rename = "restart")]
    Restart {
        #[serde(default)]
        config: Option<GameConfig>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileUpdate {
    pub index: usize,
    pub view: TileView,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        width: usize,
        height: usize,
        mines: usize,
        status: GameStatus,
        board: Vec<Vec<TileView>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<TileUpdate>,
        status: GameStatus,
        /// Mines minus placed flags, may go negative on overflagging.
        flags: isize,
        /// Set once the game is won; seconds from first reveal to the win.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elapsed: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_message_wire_shape() {
        let message = ClientMessage::Click {
            index: 12,
            kind: ClickKind::LeftRight,
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"{"action":"click","index":12,"kind":"left_right"}"#
        );
    }

    #[test]
    fn restart_config_is_optional() {
        let message: ClientMessage = serde_json::from_str(r#"{"action":"restart"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Restart { config: None }));

        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"restart","config":{"width":16,"height":16,"mines":40,"mode_id":2}}"#)
                .unwrap();
        match message {
            ClientMessage::Restart {
                config: Some(config),
            } => assert_eq!((config.width, config.mines), (16, 40)),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn update_omits_elapsed_until_win() {
        let update = ServerMessage::Update {
            updates: vec![TileUpdate {
                index: 0,
                view: TileView::Revealed { near: 2 },
            }],
            status: GameStatus::InGame,
            flags: 9,
            elapsed: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(!json.contains("elapsed"));
        assert!(json.contains(r#""state":"revealed","near":2"#));
    }
}
