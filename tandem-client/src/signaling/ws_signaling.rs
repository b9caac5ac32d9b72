use crate::error::SignalingError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tandem_core::SignalMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// WebSocket connection to the coordinator.
///
/// Outbound messages go through an unbounded queue drained by a writer task.
/// Inbound frames are decoded and pushed into `inbound` in arrival order; the
/// sender is dropped when the socket ends, which the engine reads as
/// transport closure.
#[derive(Clone)]
pub struct WsSignaling {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsSignaling {
    pub async fn connect(
        url: &str,
        inbound: mpsc::Sender<SignalMessage>,
    ) -> Result<Self, SignalingError> {
        info!("Connecting to signaling server {}", url);
        let (ws_stream, _) = connect_async(url).await?;
        info!("Connected to signaling server");

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    error!("Failed to send WS message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            if inbound.send(signal).await.is_err() {
                                debug!("Engine gone, stopping signaling reader");
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid SignalMessage from server: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
            info!("Signaling connection closed");
        });

        Ok(Self { tx })
    }

    pub fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        let json = serde_json::to_string(&msg)?;
        debug!("WS OUT: {}", msg.event_name());
        self.tx
            .send(Message::Text(json))
            .map_err(|_| SignalingError::ChannelClosed)
    }
}
