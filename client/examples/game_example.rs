use snakesweeper_client::input::{Buttons, ClickTracker};
use snakesweeper_client::{GameEvent, GameStatus, Gamemode, SnakesweeperGame, TileView};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a high-level game client
    let game = SnakesweeperGame::new("http://localhost:8000")?;

    // Subscribe to game events for background listening
    let mut event_receiver = game.subscribe_to_events().await;

    // Spawn background task to handle events
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                GameEvent::Initialized {
                    width,
                    height,
                    mines,
                } => {
                    println!(
                        "🎮 Game initialized: {}x{} with {} mines",
                        width, height, mines
                    );
                }
                GameEvent::BoardUpdated { changed } => {
                    println!("📋 {} tiles updated: {:?}", changed.len(), changed);
                }
                GameEvent::StatusChanged { status, elapsed } => match status {
                    GameStatus::Won => println!("🎉 You won in {:?} seconds!", elapsed),
                    GameStatus::Lost => println!("💣 Game over!"),
                    _ => println!("Status changed: {:?}", status),
                },
                GameEvent::ConnectionLost => {
                    println!("🔌 Connection lost!");
                    break;
                }
            }
        }
    });

    // Start a beginner game (9x9 with 10 mines)
    let config = Gamemode::Beginner.config();
    game.start_game(config, Some("example".to_string())).await?;
    println!("Game started! Game ID: {}", game.get_game_id().await.unwrap());

    // Give time for initialization event
    sleep(Duration::from_millis(100)).await;

    // Display initial board state
    if let Some(state) = game.get_state().await {
        println!(
            "\nInitial board ({}x{} with {} mines):",
            state.width, state.height, state.mines
        );
        display_board(&state);

        let tile_counts = state.count_tiles();
        println!("Tile counts: {:?}", tile_counts);
    }

    // Make some moves
    println!("\n=== Making some moves ===");

    // Reveal a central tile; the first click generates the board around it
    println!("Revealing tile (4, 4)...");
    game.reveal(4, 4).await?;
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        display_board(&state);
        if state.is_over() {
            println!("Game over! Won: {}", state.is_won());
        }
    }

    // Flag a corner tile
    println!("\nFlagging tile (0, 0)...");
    game.flag(0, 0).await?;
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        display_board(&state);
        println!("Flags remaining: {}", state.flags_remaining());
    }

    // Flag the same tile again (should unflag it)
    println!("\nUnflagging tile (0, 0)...");
    game.flag(0, 0).await?;
    sleep(Duration::from_millis(100)).await;

    // Drive a move through the click tracker, as a UI event loop would.
    // Pressing both buttons and releasing them classifies as a chord.
    println!("\n=== Classifying raw button events ===");
    let mut tracker = ClickTracker::new();
    tracker.press(Buttons::LEFT);
    tracker.press(Buttons::LEFT | Buttons::RIGHT);
    assert_eq!(tracker.release(Buttons::RIGHT), None);
    if let Some(kind) = tracker
        .release(Buttons::NONE)
        .and_then(|combo| combo.click_kind())
    {
        println!("Gesture classified as {:?}, sending it for tile (4, 4)", kind);
        game.click_at(4, 4, kind).await?;
        sleep(Duration::from_millis(100)).await;
    }

    if let Some(state) = game.get_state().await {
        display_board(&state);
        let tile_counts = state.count_tiles();
        println!("Final tile counts: {:?}", tile_counts);
    }

    // Check the beginner leaderboard
    let scores = game.leaderboard(Some(Gamemode::Beginner.mode_id())).await?;
    println!("\nBeginner leaderboard ({} entries):", scores.len());
    for entry in scores.iter().take(5) {
        println!("  {} finished in {}s", entry.player, entry.seconds);
    }

    // Disconnect from the game
    game.disconnect().await?;
    println!("\nDisconnected from game");

    // Clean up event handler
    event_handler.abort();
    let _ = event_handler.await;

    Ok(())
}

fn display_board(state: &snakesweeper_client::GameState) {
    println!("Board state:");
    for (y, row) in state.board.iter().enumerate() {
        print!("  ");
        for tile in row {
            let symbol = match tile {
                TileView::Hidden => "·".to_string(),
                TileView::Flagged => "F".to_string(),
                TileView::Revealed { near: 0 } => " ".to_string(),
                TileView::Revealed { near } => near.to_string(),
                TileView::Mine => "💣".to_string(),
                TileView::WrongFlag => "✗".to_string(),
            };
            print!("{:2}", symbol);
        }
        println!("  {}", y);
    }

    // Print x coordinates
    print!("  ");
    for x in 0..state.width {
        print!("{:2}", x);
    }
    println!();
}
