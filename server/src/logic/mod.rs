use std::{collections::HashMap, sync::Arc, time::Instant};

use dashmap::DashMap;
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use snakesweeper_common::{
    models::{ConfigError, GameConfig},
    protocol::{ClickKind, ServerMessage},
};

use crate::data::GameSession;
use crate::scores::Scores;

pub mod board;
pub mod session;

pub type Games = Arc<DashMap<String, Arc<Mutex<Game>>>>;

/// One hosted game: the session plus every websocket watching it. All clicks
/// go through here so every connected client sees the same board.
pub struct Game {
    session: GameSession,
    player: String,
    scores: Scores,
    streams: HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    created_at: Instant,
    last_activity: Instant,
}

async fn send(stream: &mut SplitSink<DuplexStream, Message>, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(
    streams: &mut HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    message: &ServerMessage,
) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

impl Game {
    #[instrument(level = "trace", skip(scores))]
    pub fn new(config: GameConfig, player: String, scores: Scores) -> Result<Self, ConfigError> {
        let session = GameSession::new(config)?;
        info!(
            "Creating new game for {}: {}x{} with {} mines",
            player, config.width, config.height, config.mines
        );
        let now = Instant::now();
        Ok(Self {
            session,
            player,
            scores,
            streams: HashMap::new(),
            created_at: now,
            last_activity: now,
        })
    }

    /// Runs one classified click against the session and broadcasts whatever
    /// it changed. A winning click on a preset mode also lands on the
    /// leaderboard.
    #[instrument(level = "trace", skip(self))]
    pub async fn click(&mut self, index: usize, kind: ClickKind) {
        self.last_activity = Instant::now();

        // The rng is thread local and must not cross an await.
        let report = {
            let mut rng = rand::rng();
            self.session.click(index, kind, &mut rng)
        };

        if report.updates.is_empty() {
            debug!("Click at {} changed nothing", index);
            return;
        }

        if let Some(submission) = report.score {
            self.scores.submit(&self.player, submission);
        }

        broadcast(
            &mut self.streams,
            &ServerMessage::Update {
                updates: report.updates,
                status: report.status,
                flags: report.flags,
                elapsed: report.elapsed,
            },
        )
        .await;
    }

    /// Starts over. Without a config the current one is kept; with one, the
    /// session is rebuilt around it. Invalid configs leave the running game
    /// untouched.
    #[instrument(level = "trace", skip(self))]
    pub async fn restart(&mut self, config: Option<GameConfig>) {
        self.last_activity = Instant::now();

        match config {
            None => self.session.reset(),
            Some(config) => match GameSession::new(config) {
                Ok(session) => {
                    info!(
                        "Restarting game with new config: {}x{} with {} mines",
                        config.width, config.height, config.mines
                    );
                    self.session = session;
                }
                Err(error) => {
                    warn!("Ignoring restart with invalid config: {}", error);
                    return;
                }
            },
        }

        let message = self.init_message();
        broadcast(&mut self.streams, &message).await;
        info!(
            "Game restarted and broadcasted to {} connections",
            self.streams.len()
        );
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, mut stream: SplitSink<DuplexStream, Message>) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding stream {} to game", id);
        send(&mut stream, &self.init_message()).await;
        self.streams.insert(id, stream);
        self.last_activity = Instant::now();
        info!(
            "Stream {} added, total connections: {}",
            id,
            self.streams.len()
        );
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.last_activity = Instant::now()
    }

    pub fn has_active_connections(&self) -> bool {
        !self.streams.is_empty()
    }

    /// Abandoned games get swept once idle long enough, and even watched
    /// games go after the max age so a stuck socket cannot pin memory.
    pub fn should_cleanup(&self, inactive_timeout_secs: u64, max_age_secs: u64) -> bool {
        let now = Instant::now();
        if now.duration_since(self.created_at).as_secs() > max_age_secs {
            return true;
        }
        if self.has_active_connections() {
            return false;
        }
        now.duration_since(self.last_activity).as_secs() > inactive_timeout_secs
    }

    fn init_message(&self) -> ServerMessage {
        ServerMessage::Init {
            width: self.session.config.width,
            height: self.session.config.height,
            mines: self.session.config.mines,
            status: self.session.status(),
            board: self.session.board_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use snakesweeper_common::models::{GameStatus, TileView};

    use super::*;
    use crate::scores::ScoreBoard;

    fn game() -> Game {
        Game::new(
            GameConfig::default(),
            "tester".to_string(),
            Arc::new(ScoreBoard::new()),
        )
        .unwrap()
    }

    #[test]
    fn new_game_rejects_invalid_configs() {
        let config = GameConfig {
            width: 0,
            ..GameConfig::default()
        };
        assert!(Game::new(config, "tester".to_string(), Arc::new(ScoreBoard::new())).is_err());
    }

    #[test]
    fn init_message_shows_a_hidden_board_before_the_first_reveal() {
        let game = game();
        match game.init_message() {
            ServerMessage::Init {
                width,
                height,
                mines,
                status,
                board,
            } => {
                assert_eq!((width, height, mines), (9, 9, 10));
                assert_eq!(status, GameStatus::PreGame);
                assert_eq!(board.len(), 9);
                assert!(board.iter().flatten().all(|view| *view == TileView::Hidden));
            }
            other => panic!("expected init message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn restart_rebuilds_the_session_and_reannounces_it() {
        let mut game = game();
        game.click(0, ClickKind::Left).await;

        // A new config replaces the board outright.
        let config = GameConfig {
            width: 5,
            height: 5,
            mines: 2,
            mode_id: None,
        };
        game.restart(Some(config)).await;
        match game.init_message() {
            ServerMessage::Init {
                width,
                height,
                mines,
                status,
                board,
            } => {
                assert_eq!((width, height, mines), (5, 5, 2));
                assert_eq!(status, GameStatus::PreGame);
                assert!(board.iter().flatten().all(|view| *view == TileView::Hidden));
            }
            other => panic!("expected init message, got {other:?}"),
        }

        // An invalid config is ignored and the current session stays.
        let config = GameConfig {
            width: 0,
            height: 5,
            mines: 2,
            mode_id: None,
        };
        game.restart(Some(config)).await;
        match game.init_message() {
            ServerMessage::Init { width, .. } => assert_eq!(width, 5),
            other => panic!("expected init message, got {other:?}"),
        }
    }

    #[test]
    fn cleanup_respects_connections_and_age() {
        let mut game = game();
        assert!(!game.should_cleanup(600, 86400));

        game.last_activity = Instant::now() - Duration::from_secs(700);
        assert!(game.should_cleanup(600, 86400));

        // Recent activity keeps a young game alive.
        game.last_activity = Instant::now();
        game.created_at = Instant::now() - Duration::from_secs(1000);
        assert!(!game.should_cleanup(600, 86400));

        // But nothing outlives the max age.
        game.created_at = Instant::now() - Duration::from_secs(90000);
        assert!(game.should_cleanup(600, 86400));
    }
}
