use std::sync::Arc;

use dashmap::Entry;
use nanoid::nanoid;
use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use snakesweeper_common::{
    models::{CreateRequest, CreateResponse, ScoresResponse},
    protocol::ClientMessage,
};

use crate::{
    logic::{Game, Games},
    rate_limit::{CREATE_RULE, ClientIp, RateLimiter, SCORES_RULE, check_rate_limit},
    scores::Scores,
};

const MAX_PLAYER_NAME: usize = 32;

fn normalize_player(player: Option<String>) -> String {
    let trimmed = player.as_deref().map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        "anonymous".to_string()
    } else {
        trimmed.chars().take(MAX_PLAYER_NAME).collect()
    }
}

#[instrument(level = "trace", skip(games, game))]
fn add_game(games: &State<Games>, game: Game) -> String {
    let mut id_length = 5;
    let max_attempts_per_length = 10;

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match games.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Game ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(Mutex::new(game)));
                    info!("Created new game with ID: {}", id);
                    return id;
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

#[post("/create", data = "<request>")]
#[instrument(level = "trace", skip(request, games, scores, rate_limiter), fields(client_ip = %client_ip.0))]
pub fn create_game(
    request: Json<CreateRequest>,
    games: &State<Games>,
    scores: &State<Scores>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> Result<Json<CreateResponse>, Status> {
    let request = request.into_inner();
    info!(
        "Game creation request from {}: {}x{} with {} mines",
        client_ip.0, request.config.width, request.config.height, request.config.mines
    );

    if let Err(status) = check_rate_limit(rate_limiter, &client_ip, &CREATE_RULE) {
        warn!("Rate limit exceeded for client {}", client_ip.0);
        return Err(status);
    }

    let player = normalize_player(request.player);
    let game = match Game::new(request.config, player, scores.inner().clone()) {
        Ok(game) => game,
        Err(error) => {
            warn!("Rejecting game creation from {}: {}", client_ip.0, error);
            return Err(Status::UnprocessableEntity);
        }
    };
    let id = add_game(games, game);

    info!(
        "Successfully created game {} for client {}",
        id, client_ip.0
    );
    Ok(Json(CreateResponse { id }))
}

#[get("/api/scores?<mode_id>&<player>")]
#[instrument(level = "trace", skip(scores, rate_limiter), fields(client_ip = %client_ip.0))]
pub fn get_scores(
    mode_id: Option<u8>,
    player: Option<String>,
    scores: &State<Scores>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> Result<Json<ScoresResponse>, Status> {
    check_rate_limit(rate_limiter, &client_ip, &SCORES_RULE)?;

    let scores = scores.top(mode_id, player.as_deref());
    debug!("Returning {} leaderboard entries", scores.len());
    Ok(Json(ScoresResponse { scores }))
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    games: &State<Games>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let game = match games.get(&id) {
        None => {
            warn!("WebSocket connection attempt for non-existent game: {}", id);
            return Err(Status::NotFound);
        }
        Some(value) => {
            info!("WebSocket connection established for game: {}", id);
            value.value().clone()
        }
    };

    Ok(ws.channel(move |stream| {
        let game_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut game = game.lock().await;
                game.add_stream(write).await
            };

            info!(
                "Client connected to game {} (stream: {})",
                game_id, stream_id
            );

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from game {}: {:?}", game_id, message);
                            match message {
                                ClientMessage::Click { index, kind } => {
                                    debug!(
                                        "Player {:?} click at {} in game {}",
                                        kind, index, game_id
                                    );
                                    let mut game = game.lock().await;
                                    game.click(index, kind).await;
                                }
                                ClientMessage::Restart { config } => {
                                    info!("Player restarting game {}", game_id);
                                    let mut game = game.lock().await;
                                    game.restart(config).await;
                                }
                            }
                        }
                        Err(e) => {
                            warn!(
                                "Invalid message format in game {}: {} - Error: {}",
                                game_id, text, e
                            );
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!(
                            "WebSocket connection closed for game {} (stream: {})",
                            game_id, stream_id
                        );
                        break;
                    }
                    Err(e) => {
                        error!(
                            "WebSocket error in game {} (stream: {}): {}",
                            game_id, stream_id, e
                        );
                        break;
                    }
                    _ => {
                        debug!("Received non-text message in game {}, ignoring", game_id);
                    }
                }
            }

            {
                let mut game = game.lock().await;
                game.remove_stream(&stream_id).await;
            }

            info!(
                "Client disconnected from game {} (stream: {})",
                game_id, stream_id
            );
            Ok(())
        })
    }))
}
