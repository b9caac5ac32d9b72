use crate::model::{MAX_ROOM_ID_LEN, ParticipantId, SdpKind};
use thiserror::Error;

/// A signaling message that breaks the message contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("room id is empty")]
    EmptyRoomId,

    #[error("room id is {0} bytes, limit is {MAX_ROOM_ID_LEN}")]
    RoomIdTooLong(usize),

    #[error("room id contains control characters")]
    RoomIdControlChars,

    #[error("`{event}` carries a {found} description")]
    DescriptionKindMismatch { event: &'static str, found: SdpKind },

    #[error("`{0}` carries an empty description body")]
    EmptyDescription(&'static str),

    #[error("`{0}` targets its own caller")]
    SelfAddressed(&'static str),

    #[error("`{event}` addressed to {target}, not to us")]
    WrongRecipient {
        event: &'static str,
        target: ParticipantId,
    },

    #[error("`{0}` may not be sent by a client")]
    NotClientOriginated(&'static str),

    #[error("caller {claimed} does not match sender {actual}")]
    CallerMismatch {
        claimed: ParticipantId,
        actual: ParticipantId,
    },
}
