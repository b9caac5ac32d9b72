use crate::engine::EngineCommand;
use crate::session::SessionEvent;
use tandem_core::RoomId;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Application side of a running [`PeerEngine`](crate::engine::PeerEngine).
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) command_tx: mpsc::Sender<EngineCommand>,
    pub(crate) events: broadcast::Sender<SessionEvent>,
}

impl EngineHandle {
    pub async fn join(&self, room_id: RoomId) {
        if self.command_tx.send(EngineCommand::Join(room_id)).await.is_err() {
            warn!("Join requested but the engine has stopped");
        }
    }

    pub async fn leave(&self) {
        let _ = self.command_tx.send(EngineCommand::Leave).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
