use std::collections::HashMap;
use std::sync::Arc;

use snakesweeper_common::{
    grid,
    models::{GameConfig, GameStatus, TileView},
    protocol::{ClickKind, ClientMessage, ServerMessage, TileUpdate},
};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Result, SnakesweeperClient, SnakesweeperSocket};

/// Events emitted by the game
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Game was initialized or restarted
    Initialized {
        width: usize,
        height: usize,
        mines: usize,
    },
    /// The board changed; carries the flat indices of changed tiles
    BoardUpdated { changed: Vec<usize> },
    /// The game moved to a new phase
    StatusChanged {
        status: GameStatus,
        elapsed: Option<u64>,
    },
    /// Connection was lost
    ConnectionLost,
}

/// A local mirror of the server-side board
#[derive(Debug, Clone)]
pub struct GameState {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub status: GameStatus,
    pub board: Vec<Vec<TileView>>,
    /// Mines minus placed flags, negative on overflagging
    pub flags: isize,
    /// Seconds from first reveal to the win, once won
    pub elapsed: Option<u64>,
}

impl GameState {
    pub fn new(
        width: usize,
        height: usize,
        mines: usize,
        status: GameStatus,
        board: Vec<Vec<TileView>>,
    ) -> Self {
        // The init board may already carry flags when joining mid-game.
        let flagged = board
            .iter()
            .flatten()
            .filter(|tile| matches!(tile, TileView::Flagged))
            .count();
        Self {
            width,
            height,
            mines,
            status,
            board,
            flags: mines as isize - flagged as isize,
            elapsed: None,
        }
    }

    /// Get the tile at column `x`, row `y`
    pub fn tile(&self, x: usize, y: usize) -> Option<&TileView> {
        if x < self.width && y < self.height {
            self.board.get(y)?.get(x)
        } else {
            None
        }
    }

    /// Apply one server update to the local board
    pub fn apply(&mut self, update: &TileUpdate) {
        let (row, col) = grid::index_to_coord(update.index, self.width);
        if let Some(tiles) = self.board.get_mut(row)
            && let Some(tile) = tiles.get_mut(col)
        {
            *tile = update.view;
        }
    }

    pub fn flags_remaining(&self) -> isize {
        self.flags
    }

    /// Count the number of tiles in each state
    pub fn count_tiles(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for row in &self.board {
            for tile in row {
                let state = match tile {
                    TileView::Hidden => "hidden",
                    TileView::Flagged => "flagged",
                    TileView::Revealed { .. } => "revealed",
                    TileView::Mine => "mine",
                    TileView::WrongFlag => "wrong_flag",
                };
                *counts.entry(state).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn is_won(&self) -> bool {
        self.status == GameStatus::Won
    }
}

/// Connection state - all fields are required when connected
struct ConnectionState {
    websocket_sender: mpsc::UnboundedSender<ClientMessage>,
    game_id: String,
    background_task: JoinHandle<()>,
}

impl ConnectionState {
    fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.websocket_sender
            .send(message)
            .map_err(|_| "WebSocket sender closed")?;
        Ok(())
    }

    async fn abort_and_wait_background_task(self) {
        self.background_task.abort();
        let _ = self.background_task.await;
    }
}

/// High-level game client that mirrors the server state locally
pub struct SnakesweeperGame {
    client: SnakesweeperClient,
    connection_state: Arc<RwLock<Option<ConnectionState>>>,
    event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<GameEvent>>>>,
    state: Arc<RwLock<Option<GameState>>>,
}

impl SnakesweeperGame {
    /// Create a new game instance
    pub fn new(server_url: &str) -> Result<Self> {
        let client = SnakesweeperClient::new(server_url)?;
        Ok(Self {
            client,
            connection_state: Arc::new(RwLock::new(None)),
            event_sender: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(None)),
        })
    }

    /// Subscribe to game events. Returns a receiver for game events.
    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut event_sender = self.event_sender.write().await;
        *event_sender = Some(sender);
        receiver
    }

    /// Create a game on the server and join it
    pub async fn start_game(&self, config: GameConfig, player: Option<String>) -> Result<()> {
        info!(
            "Starting new game: {}x{} with {} mines",
            config.width, config.height, config.mines
        );

        let game_id = self.client.create_game(config, player).await?;
        info!("Created game with ID: {}", game_id);

        self.join_game(game_id).await
    }

    pub async fn join_game(&self, game_id: String) -> Result<()> {
        info!("Joining game with ID: {}", game_id);

        let mut conn_state = self.connection_state.write().await;

        // Stop any existing background task
        if let Some(existing_conn) = conn_state.take() {
            existing_conn.abort_and_wait_background_task().await;
        }
        self.state.write().await.take();

        // Connect to the game via WebSocket
        let ws_url = self.client.websocket_url(&game_id)?;
        let websocket = SnakesweeperSocket::connect(&ws_url).await?;
        let websocket_sender = websocket.get_sender();

        info!("Connected to game with ID: {}", game_id);

        // Start background message listener
        let background_task = self.start_background_listener(websocket);

        *conn_state = Some(ConnectionState {
            websocket_sender,
            game_id,
            background_task,
        });

        Ok(())
    }

    async fn send_client_message(&self, message: ClientMessage) -> Result<()> {
        let conn_state = self.connection_state.read().await;

        if let Some(ref conn) = *conn_state {
            conn.send_message(message)?;
        } else {
            return Err("Not connected to a game. Call start_game() first.".into());
        }

        Ok(())
    }

    /// Send a classified click for the tile at column `x`, row `y`
    pub async fn click_at(&self, x: usize, y: usize, kind: ClickKind) -> Result<()> {
        let index = {
            let state = self.state.read().await;
            let Some(state) = state.as_ref() else {
                return Err("No game state yet. Wait for the init message.".into());
            };
            if x >= state.width || y >= state.height {
                return Err(format!("Tile ({x}, {y}) is outside the board").into());
            }
            grid::coord_to_index(y, x, state.width)
        };
        self.click(index, kind).await
    }

    /// Send a classified click for a flat tile index
    pub async fn click(&self, index: usize, kind: ClickKind) -> Result<()> {
        debug!("Sending {:?} click at {}", kind, index);
        self.send_client_message(ClientMessage::Click { index, kind })
            .await
    }

    /// Reveal the tile at column `x`, row `y`
    pub async fn reveal(&self, x: usize, y: usize) -> Result<()> {
        self.click_at(x, y, ClickKind::Left).await
    }

    /// Flag or unflag the tile at column `x`, row `y`
    pub async fn flag(&self, x: usize, y: usize) -> Result<()> {
        self.click_at(x, y, ClickKind::Right).await
    }

    /// Chord on the revealed tile at column `x`, row `y`
    pub async fn chord(&self, x: usize, y: usize) -> Result<()> {
        self.click_at(x, y, ClickKind::LeftRight).await
    }

    /// Restart the game. Without a config the current board setup is kept.
    pub async fn restart(&self, config: Option<GameConfig>) -> Result<()> {
        info!("Restarting game");
        self.send_client_message(ClientMessage::Restart { config })
            .await
    }

    /// Fetch the leaderboard from the same server
    pub async fn leaderboard(
        &self,
        mode_id: Option<u8>,
    ) -> Result<Vec<snakesweeper_common::models::ScoreEntry>> {
        self.client.fetch_scores(mode_id).await
    }

    /// Get the current game state
    pub async fn get_state(&self) -> Option<GameState> {
        self.state.read().await.clone()
    }

    /// Get the game ID
    pub async fn get_game_id(&self) -> Option<String> {
        let conn_state = self.connection_state.read().await;
        conn_state.as_ref().map(|conn| conn.game_id.clone())
    }

    /// Check if we're connected to a game
    pub async fn is_connected(&self) -> bool {
        let conn_state = self.connection_state.read().await;
        conn_state.is_some()
    }

    /// Close the connection and clean up
    pub async fn disconnect(&self) -> Result<()> {
        let mut conn_state = self.connection_state.write().await;

        if let Some(conn) = conn_state.take() {
            conn.abort_and_wait_background_task().await;
        }

        *self.event_sender.write().await = None;
        *self.state.write().await = None;

        info!("Disconnected from game");
        Ok(())
    }

    /// Start background WebSocket message listener
    fn start_background_listener(&self, mut websocket: SnakesweeperSocket) -> JoinHandle<()> {
        let state = self.state.clone();
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            Self::background_message_handler(&mut websocket, state, event_sender).await;
        })
    }

    /// Background task that handles incoming WebSocket messages
    async fn background_message_handler(
        websocket: &mut SnakesweeperSocket,
        state: Arc<RwLock<Option<GameState>>>,
        event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<GameEvent>>>>,
    ) {
        loop {
            let message = match websocket.receive_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::ConnectionLost);
                    }
                    break;
                }
                Err(e) => {
                    warn!("Error receiving WebSocket message: {}", e);
                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::ConnectionLost);
                    }
                    break;
                }
            };

            match message {
                ServerMessage::Init {
                    width,
                    height,
                    mines,
                    status,
                    board,
                } => {
                    info!(
                        "Received game initialization: {}x{} with {} mines",
                        width, height, mines
                    );

                    let new_state = GameState::new(width, height, mines, status, board);
                    *state.write().await = Some(new_state);

                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::Initialized {
                            width,
                            height,
                            mines,
                        });
                    }
                }
                ServerMessage::Update {
                    updates,
                    status,
                    flags,
                    elapsed,
                } => {
                    debug!(
                        "Received update: {} tiles updated, status: {:?}",
                        updates.len(),
                        status
                    );

                    let changed: Vec<usize> = updates.iter().map(|update| update.index).collect();
                    let status_changed;

                    {
                        let mut state_guard = state.write().await;
                        if let Some(ref mut game_state) = *state_guard {
                            let old_status = game_state.status;

                            for update in &updates {
                                game_state.apply(update);
                            }
                            game_state.status = status;
                            game_state.flags = flags;
                            game_state.elapsed = elapsed;

                            status_changed = status != old_status;
                        } else {
                            status_changed = false;
                        }
                    }

                    if let Some(ref sender) = *event_sender.read().await {
                        if !changed.is_empty() {
                            let _ = sender.send(GameEvent::BoardUpdated { changed });
                        }

                        if status_changed {
                            let _ = sender.send(GameEvent::StatusChanged { status, elapsed });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden_state() -> GameState {
        GameState::new(
            5,
            3,
            2,
            GameStatus::PreGame,
            vec![vec![TileView::Hidden; 5]; 3],
        )
    }

    #[test]
    fn updates_land_on_the_right_tile() {
        let mut state = hidden_state();
        state.apply(&TileUpdate {
            index: 7,
            view: TileView::Revealed { near: 3 },
        });

        // Index 7 is row 1, column 2.
        assert_eq!(state.tile(2, 1), Some(&TileView::Revealed { near: 3 }));
        assert_eq!(state.tile(1, 2), Some(&TileView::Hidden));

        // Out-of-range updates are dropped silently.
        state.apply(&TileUpdate {
            index: 80,
            view: TileView::Mine,
        });
        assert_eq!(state.count_tiles()["hidden"], 14);
    }

    #[test]
    fn joining_mid_game_counts_existing_flags() {
        let mut board = vec![vec![TileView::Hidden; 5]; 3];
        board[0][0] = TileView::Flagged;
        board[2][4] = TileView::Flagged;
        board[1][1] = TileView::Revealed { near: 1 };

        let state = GameState::new(5, 3, 2, GameStatus::InGame, board);
        assert_eq!(state.flags_remaining(), 0);
    }

    #[test]
    fn tile_accessor_checks_bounds() {
        let state = hidden_state();
        assert!(state.tile(4, 2).is_some());
        assert!(state.tile(5, 0).is_none());
        assert!(state.tile(0, 3).is_none());
    }

    #[test]
    fn tile_counts_group_by_view() {
        let mut state = hidden_state();
        state.apply(&TileUpdate {
            index: 0,
            view: TileView::Flagged,
        });
        state.apply(&TileUpdate {
            index: 1,
            view: TileView::Revealed { near: 0 },
        });

        let counts = state.count_tiles();
        assert_eq!(counts["hidden"], 13);
        assert_eq!(counts["flagged"], 1);
        assert_eq!(counts["revealed"], 1);
        assert!(!counts.contains_key("mine"));
    }

    #[test]
    fn subscribing_replaces_the_event_channel() {
        let game = SnakesweeperGame::new("http://localhost:8000").unwrap();
        tokio_test::block_on(async {
            let _first = game.subscribe_to_events().await;
            let mut second = game.subscribe_to_events().await;
            assert!(!game.is_connected().await);
            assert!(second.try_recv().is_err());
        });
    }
}
