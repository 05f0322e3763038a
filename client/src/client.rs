use reqwest::Client;
use snakesweeper_common::models::{
    CreateRequest, CreateResponse, GameConfig, ScoreEntry, ScoresResponse,
};
use url::Url;

use crate::Result;

/// HTTP client for the snakesweeper server API
pub struct SnakesweeperClient {
    client: Client,
    base_url: Url,
}

impl SnakesweeperClient {
    /// Create a new client connecting to the specified server URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self { client, base_url })
    }

    /// Create a new game, optionally registering a player name for the
    /// leaderboard. Returns the game ID used for the WebSocket connection.
    pub async fn create_game(&self, config: GameConfig, player: Option<String>) -> Result<String> {
        let create_url = self.base_url.join("/create")?;
        let request = CreateRequest { config, player };

        let response = self.client.post(create_url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(format!("Failed to create game: {}", response.status()).into());
        }

        let create_response: CreateResponse = response.json().await?;
        Ok(create_response.id)
    }

    /// Fetch the leaderboard, optionally filtered to a single mode.
    pub async fn fetch_scores(&self, mode_id: Option<u8>) -> Result<Vec<ScoreEntry>> {
        let mut scores_url = self.base_url.join("/api/scores")?;
        if let Some(mode_id) = mode_id {
            scores_url.set_query(Some(&format!("mode_id={}", mode_id)));
        }

        let response = self.client.get(scores_url).send().await?;

        if !response.status().is_success() {
            return Err(format!("Failed to fetch scores: {}", response.status()).into());
        }

        let scores_response: ScoresResponse = response.json().await?;
        Ok(scores_response.scores)
    }

    /// Get the WebSocket URL for a game
    pub fn websocket_url(&self, game_id: &str) -> Result<String> {
        let mut ws_url = self.base_url.clone();
        ws_url
            .set_scheme(match self.base_url.scheme() {
                "https" => "wss",
                _ => "ws",
            })
            .map_err(|_| "Failed to set WebSocket scheme")?;
        ws_url.set_path("/ws");
        ws_url.set_query(Some(&format!("id={}", game_id)));

        Ok(ws_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_swaps_the_scheme_and_keeps_the_id() {
        let client = SnakesweeperClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.websocket_url("abc12").unwrap(),
            "ws://localhost:8000/ws?id=abc12"
        );

        let client = SnakesweeperClient::new("https://example.com").unwrap();
        assert_eq!(
            client.websocket_url("abc12").unwrap(),
            "wss://example.com/ws?id=abc12"
        );
    }
}
