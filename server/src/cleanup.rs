use std::{env, time::Duration};

use tokio::time;
use tracing::{debug, info};

use crate::logic::Games;

fn env_secs(var: &str, default: u64) -> u64 {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

/// Periodically drops games nobody is playing anymore. Runs for the process
/// lifetime.
pub async fn start_cleanup_task(games: Games) {
    let cleanup_interval_secs = env_secs("CLEANUP_INTERVAL_SECONDS", 60);
    let inactive_timeout_secs = env_secs("INACTIVE_GAME_TIMEOUT_SECONDS", 600);
    let max_age_secs = env_secs("MAX_GAME_AGE_SECONDS", 86400);

    let mut interval = time::interval(Duration::from_secs(cleanup_interval_secs));

    info!(
        "Started game cleanup task: checking every {}s, inactive timeout: {}s, max age: {}s",
        cleanup_interval_secs, inactive_timeout_secs, max_age_secs
    );

    loop {
        interval.tick().await;
        cleanup_games(&games, inactive_timeout_secs, max_age_secs).await;
    }
}

async fn cleanup_games(games: &Games, inactive_timeout_secs: u64, max_age_secs: u64) {
    let mut games_to_remove = Vec::new();

    // First pass: identify games to remove. Locked games are in use, skip
    // them until the next sweep.
    for entry in games.iter() {
        let game_id = entry.key();
        let game = entry.value();

        if let Ok(game_guard) = game.try_lock()
            && game_guard.should_cleanup(inactive_timeout_secs, max_age_secs)
        {
            games_to_remove.push(game_id.clone());
        }
    }

    // Second pass: remove identified games.
    let removed_count = games_to_remove.len();
    for game_id in games_to_remove {
        games.remove(&game_id);
        debug!("Cleaned up game: {}", game_id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} inactive games", removed_count);
    }
}
