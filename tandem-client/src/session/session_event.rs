use crate::role::Role;
use crate::session::NegotiationState;
use tandem_core::{ParticipantId, RoomId};

/// Observable progress of the engine and its sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The coordinator told us our own id.
    Welcomed { local: ParticipantId },

    /// The join was refused because two participants are already present.
    RoomFull { room: RoomId },

    SessionCreated {
        remote: ParticipantId,
        role: Role,
    },

    /// No back-end could be built for this remote; nothing will be negotiated.
    SessionSetupFailed {
        remote: ParticipantId,
        reason: String,
    },

    StateChanged {
        remote: ParticipantId,
        state: NegotiationState,
    },

    /// A negotiation step was rejected. The session stalls in `state`.
    NegotiationFailed {
        remote: ParticipantId,
        state: NegotiationState,
        reason: String,
    },

    /// The session reached `Closed` or `Failed`.
    SessionEnded {
        remote: ParticipantId,
        state: NegotiationState,
    },
}
