use crate::error::ValidationError;
use crate::model::candidate::IceCandidate;
use crate::model::description::{SdpKind, SessionDescription};
use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// Who is allowed to emit an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Only clients send it, only the coordinator consumes it.
    ClientToCoordinator,
    /// Only the coordinator sends it.
    CoordinatorToClient,
    /// Sent by a client and forwarded by the coordinator to `target`.
    Relayed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    Welcome {
        participant_id: ParticipantId,
    },
    JoinRoom {
        room_id: RoomId,
    },
    OtherUser {
        remote_participant_id: ParticipantId,
    },
    UserJoined {
        remote_participant_id: ParticipantId,
    },
    UserLeft {
        remote_participant_id: ParticipantId,
    },
    RoomFull {
        room_id: RoomId,
    },
    Offer {
        target: ParticipantId,
        caller: ParticipantId,
        sdp: SessionDescription,
    },
    Answer {
        target: ParticipantId,
        caller: ParticipantId,
        sdp: SessionDescription,
    },
    IceCandidate {
        target: ParticipantId,
        candidate: IceCandidate,
    },
}

impl SignalMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::JoinRoom { .. } => "join-room",
            Self::OtherUser { .. } => "other-user",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::RoomFull { .. } => "room-full",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::JoinRoom { .. } => Direction::ClientToCoordinator,
            Self::Welcome { .. }
            | Self::OtherUser { .. }
            | Self::UserJoined { .. }
            | Self::UserLeft { .. }
            | Self::RoomFull { .. } => Direction::CoordinatorToClient,
            Self::Offer { .. } | Self::Answer { .. } | Self::IceCandidate { .. } => {
                Direction::Relayed
            }
        }
    }

    /// Recipient of a relayed message.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { target, .. }
            | Self::Answer { target, .. }
            | Self::IceCandidate { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Checks the shape of the message, independent of who receives it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::JoinRoom { room_id } | Self::RoomFull { room_id } => room_id.validate(),
            Self::Offer {
                target,
                caller,
                sdp,
            } => Self::validate_description("offer", SdpKind::Offer, target, caller, sdp),
            Self::Answer {
                target,
                caller,
                sdp,
            } => Self::validate_description("answer", SdpKind::Answer, target, caller, sdp),
            Self::Welcome { .. }
            | Self::OtherUser { .. }
            | Self::UserJoined { .. }
            | Self::UserLeft { .. }
            | Self::IceCandidate { .. } => Ok(()),
        }
    }

    /// Rejects a relayed message whose `target` is someone else.
    pub fn ensure_addressed_to(&self, local: &ParticipantId) -> Result<(), ValidationError> {
        match self.target() {
            Some(target) if target != local => Err(ValidationError::WrongRecipient {
                event: self.event_name(),
                target: target.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn validate_description(
        event: &'static str,
        expected: SdpKind,
        target: &ParticipantId,
        caller: &ParticipantId,
        sdp: &SessionDescription,
    ) -> Result<(), ValidationError> {
        if sdp.kind != expected {
            return Err(ValidationError::DescriptionKindMismatch {
                event,
                found: sdp.kind,
            });
        }
        if sdp.sdp.trim().is_empty() {
            return Err(ValidationError::EmptyDescription(event));
        }
        if target == caller {
            return Err(ValidationError::SelfAddressed(event));
        }
        Ok(())
    }
}
