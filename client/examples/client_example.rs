use snakesweeper_client::{
    ClickKind, ClientMessage, Gamemode, ServerMessage, SnakesweeperClient, SnakesweeperSocket,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a client connecting to the server
    let client = SnakesweeperClient::new("http://localhost:8000")?;

    // Create a new beginner game
    let config = Gamemode::Beginner.config();
    let game_id = client
        .create_game(config, Some("example".to_string()))
        .await?;
    println!("Created game with ID: {}", game_id);

    // Get the WebSocket URL for the game
    let ws_url = client.websocket_url(&game_id)?;
    println!("Connecting to WebSocket: {}", ws_url);

    // Connect to the game via WebSocket
    let mut socket = SnakesweeperSocket::connect(&ws_url).await?;

    // Receive the initial game state
    if let Some(ServerMessage::Init {
        width,
        height,
        mines,
        status,
        board,
    }) = socket.receive_message().await?
    {
        println!(
            "Received game initialization: {}x{} with {} mines, status {:?}",
            width, height, mines, status
        );

        // Every tile is hidden until the first reveal generates the board
        for (y, row) in board.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                print!("[{},{}:{:?}] ", x, y, tile);
            }
            println!();
        }
    }

    // The first left click generates the board and starts the clock
    let reveal = ClientMessage::Click {
        index: 40,
        kind: ClickKind::Left,
    };
    socket.send_message(reveal).await?;
    println!("Sent left click for tile 40");

    // Receive the response
    if let Some(message) = socket.receive_message().await? {
        match message {
            ServerMessage::Update {
                updates,
                status,
                flags,
                elapsed,
            } => {
                println!("Received update: {} tiles updated", updates.len());
                for update in updates {
                    println!("  Tile {} -> {:?}", update.index, update.view);
                }
                println!(
                    "Game status: {:?}, flags left: {}, elapsed: {:?}",
                    status, flags, elapsed
                );
            }
            _ => println!("Received unexpected message: {:?}", message),
        }
    }

    // Flag a corner tile
    let flag = ClientMessage::Click {
        index: 0,
        kind: ClickKind::Right,
    };
    socket.send_message(flag).await?;
    println!("Sent right click for tile 0");

    // Receive the flag response
    if let Some(message) = socket.receive_message().await? {
        match message {
            ServerMessage::Update { updates, flags, .. } => {
                println!(
                    "Received flag update: {} tiles updated, flags left: {}",
                    updates.len(),
                    flags
                );
            }
            _ => println!("Received unexpected message: {:?}", message),
        }
    }

    // Check the beginner leaderboard
    let scores = client
        .fetch_scores(Some(Gamemode::Beginner.mode_id()))
        .await?;
    println!("Beginner leaderboard has {} entries", scores.len());
    for entry in scores.iter().take(5) {
        println!("  {} finished in {}s", entry.player, entry.seconds);
    }

    // Close the connection
    socket.close().await?;
    println!("Connection closed");

    Ok(())
}
