//! Snakesweeper Client Library
//!
//! This library provides a Rust client for the snakesweeper game server,
//! supporting both HTTP API calls and WebSocket connections for real-time
//! gameplay, plus the input classifier that turns raw mouse events into game
//! actions.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! The `SnakesweeperGame` struct manages game state locally and exposes
//! convenient methods for game actions:
//!
//! ```rust,no_run
//! use snakesweeper_client::{Gamemode, SnakesweeperGame};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = SnakesweeperGame::new("http://localhost:8000")?;
//!     game.start_game(Gamemode::Beginner.config(), Some("viper".to_string()))
//!         .await?;
//!
//!     // The first reveal generates the board and starts the clock.
//!     game.reveal(4, 4).await?;
//!     game.flag(0, 0).await?;
//!
//!     if let Some(state) = game.get_state().await {
//!         println!(
//!             "Status: {:?}, flags left: {}",
//!             state.status,
//!             state.flags_remaining()
//!         );
//!     }
//!
//!     game.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! For more control, use `SnakesweeperClient` and `SnakesweeperSocket`
//! directly:
//!
//! ```rust,no_run
//! use snakesweeper_client::{
//!     ClickKind, ClientMessage, GameConfig, SnakesweeperClient, SnakesweeperSocket,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = SnakesweeperClient::new("http://localhost:8000")?;
//!     let game_id = client.create_game(GameConfig::default(), None).await?;
//!
//!     let ws_url = client.websocket_url(&game_id)?;
//!     let mut socket = SnakesweeperSocket::connect(&ws_url).await?;
//!
//!     // Receive initial state
//!     if let Some(message) = socket.receive_message().await? {
//!         println!("Received: {:?}", message);
//!     }
//!
//!     // Send actions manually
//!     socket
//!         .send_message(ClientMessage::Click {
//!             index: 0,
//!             kind: ClickKind::Left,
//!         })
//!         .await?;
//!
//!     socket.close().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod game;
pub mod input;
mod websocket;

pub use client::SnakesweeperClient;
pub use game::{GameEvent, GameState, SnakesweeperGame};
pub use websocket::SnakesweeperSocket;

// Re-export common types for convenience
pub use snakesweeper_common::grid;
pub use snakesweeper_common::{models::*, modes::*, protocol::*};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
