use crate::error::SignalingError;
use async_trait::async_trait;
use tandem_core::{IceCandidate, ParticipantId, RoomId, SessionDescription, SignalMessage};

/// Outbound half of the signaling transport.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError>;

    async fn send_join(&self, room_id: RoomId) -> Result<(), SignalingError> {
        self.send(SignalMessage::JoinRoom { room_id }).await
    }

    async fn send_offer(
        &self,
        target: ParticipantId,
        caller: ParticipantId,
        sdp: SessionDescription,
    ) -> Result<(), SignalingError> {
        self.send(SignalMessage::Offer {
            target,
            caller,
            sdp,
        })
        .await
    }

    async fn send_answer(
        &self,
        target: ParticipantId,
        caller: ParticipantId,
        sdp: SessionDescription,
    ) -> Result<(), SignalingError> {
        self.send(SignalMessage::Answer {
            target,
            caller,
            sdp,
        })
        .await
    }

    async fn send_ice(
        &self,
        target: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        self.send(SignalMessage::IceCandidate { target, candidate })
            .await
    }
}
