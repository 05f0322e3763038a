use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use snakesweeper_common::protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// One live connection to a hosted game. Outgoing messages go through an
/// internal queue, so any number of handles can send without sharing the
/// socket itself.
pub struct SnakesweeperSocket {
    sender: mpsc::UnboundedSender<ClientMessage>,
    reader: WsReader,
    writer_task: JoinHandle<()>,
}

/// Drains the queue onto the wire until the queue closes or a write fails,
/// then closes the socket half it owns.
fn spawn_writer(
    mut writer: WsWriter,
    mut queue: mpsc::UnboundedReceiver<ClientMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(error) => {
                    warn!("Dropping unserializable message: {}", error);
                    continue;
                }
            };

            debug!("Client frame: {}", json);
            if let Err(error) = writer.send(Message::Text(json.into())).await {
                warn!("Game socket write failed: {}", error);
                break;
            }
        }

        let _ = writer.close().await;
    })
}

impl SnakesweeperSocket {
    /// Opens the socket and starts the writer task behind it.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Opening game socket: {}", url);
        let (stream, _) = connect_async(url).await?;
        info!("Game socket established");

        let (writer, reader) = stream.split();
        let (sender, receiver) = mpsc::unbounded_channel();

        Ok(Self {
            sender,
            reader,
            writer_task: spawn_writer(writer, receiver),
        })
    }

    /// A cloneable handle for queueing outgoing messages.
    pub fn get_sender(&self) -> mpsc::UnboundedSender<ClientMessage> {
        self.sender.clone()
    }

    /// Queues one message for the server.
    pub async fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| "game socket writer is gone")?;
        Ok(())
    }

    /// The next game message from the server, or `None` once the server hangs
    /// up.
    pub async fn receive_message(&mut self) -> Result<Option<ServerMessage>> {
        while let Some(frame) = self.reader.next().await {
            match frame? {
                Message::Text(text) => {
                    debug!("Server frame: {}", text);
                    return Ok(Some(serde_json::from_str(&text)?));
                }
                Message::Close(_) => {
                    info!("Server closed the game socket");
                    return Ok(None);
                }
                // Ping, pong and binary frames carry no game data.
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Flushes the outgoing queue and closes the connection cleanly.
    pub async fn close(self) -> Result<()> {
        // With every sender gone the writer drains what is queued and exits.
        drop(self.sender);
        let _ = self.writer_task.await;
        Ok(())
    }
}
