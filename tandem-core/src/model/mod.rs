mod candidate;
mod description;
mod participant;
mod room;
mod signaling;

pub use candidate::IceCandidate;
pub use description::{SdpKind, SessionDescription};
pub use participant::ParticipantId;
pub use room::{MAX_ROOM_ID_LEN, RoomId};
pub use signaling::{Direction, SignalMessage};
