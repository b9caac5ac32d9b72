use crate::room::{JoinOutcome, RoomManager};
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{Direction, ParticipantId, RoomId, SignalMessage, ValidationError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<SignalMessage>>,
    rooms: RoomManager,
}

/// Room membership coordinator and relay.
///
/// Transport-agnostic: every connected client is an unbounded outbound
/// queue of [`SignalMessage`]s, and inbound messages are fed to
/// [`SignalingService::handle_message`] with the sender's id.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                rooms: RoomManager::new(),
            }),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    /// Registers a new client and greets it with its id.
    pub fn connect(&self) -> (ParticipantId, mpsc::UnboundedReceiver<SignalMessage>) {
        let participant_id = ParticipantId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner.peers.insert(participant_id.clone(), tx);
        self.send_signal(
            &participant_id,
            SignalMessage::Welcome {
                participant_id: participant_id.clone(),
            },
        );

        info!("Participant {} connected", participant_id);
        (participant_id, rx)
    }

    /// Forgets the client and tells whoever shared its room.
    pub fn disconnect(&self, participant_id: &ParticipantId) {
        self.inner.peers.remove(participant_id);
        self.leave_room(participant_id);
        info!("Participant {} disconnected", participant_id);
    }

    pub fn handle_message(&self, from: &ParticipantId, msg: SignalMessage) {
        if msg.direction() == Direction::CoordinatorToClient {
            warn!(
                "Rejecting message from {}: {}",
                from,
                ValidationError::NotClientOriginated(msg.event_name())
            );
            return;
        }
        if let Err(e) = msg.validate() {
            warn!("Invalid `{}` from {}: {}", msg.event_name(), from, e);
            return;
        }

        match msg {
            SignalMessage::JoinRoom { room_id } => self.join_room(from, room_id),

            SignalMessage::Offer { ref caller, .. } | SignalMessage::Answer { ref caller, .. }
                if caller != from =>
            {
                warn!(
                    "Dropping `{}`: {}",
                    msg.event_name(),
                    ValidationError::CallerMismatch {
                        claimed: caller.clone(),
                        actual: from.clone(),
                    }
                );
            }

            SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. } => self.relay(from, msg),

            _ => {}
        }
    }

    fn join_room(&self, from: &ParticipantId, room_id: RoomId) {
        if let Some(current) = self.inner.rooms.room_of(from) {
            if current != room_id {
                info!("{} switches from room {} to {}", from, current, room_id);
                self.leave_room(from);
            }
        }

        match self.inner.rooms.join(&room_id, from) {
            JoinOutcome::Alone => {
                info!("{} joined room {} and is alone", from, room_id);
            }
            JoinOutcome::Paired { existing } => {
                info!("{} joined room {} with {}", from, room_id, existing);
                self.send_signal(
                    from,
                    SignalMessage::OtherUser {
                        remote_participant_id: existing.clone(),
                    },
                );
                self.send_signal(
                    &existing,
                    SignalMessage::UserJoined {
                        remote_participant_id: from.clone(),
                    },
                );
            }
            JoinOutcome::AlreadyJoined => {
                debug!("{} is already in room {}", from, room_id);
            }
            JoinOutcome::Full => {
                warn!("Room {} is full, rejecting {}", room_id, from);
                self.send_signal(from, SignalMessage::RoomFull { room_id });
            }
        }
    }

    fn leave_room(&self, participant_id: &ParticipantId) {
        let Some(departure) = self.inner.rooms.leave(participant_id) else {
            return;
        };
        for remaining in &departure.remaining {
            self.send_signal(
                remaining,
                SignalMessage::UserLeft {
                    remote_participant_id: participant_id.clone(),
                },
            );
        }
    }

    fn relay(&self, from: &ParticipantId, msg: SignalMessage) {
        let Some(target) = msg.target().cloned() else {
            return;
        };
        if !self.inner.rooms.shares_room(from, &target) {
            warn!(
                "Dropping `{}` from {} to {}: not in the same room",
                msg.event_name(),
                from,
                target
            );
            return;
        }
        debug!("Relaying `{}` {} -> {}", msg.event_name(), from, target);
        self.send_signal(&target, msg);
    }

    pub fn send_signal(&self, participant_id: &ParticipantId, msg: SignalMessage) {
        if let Some(peer) = self.inner.peers.get(participant_id) {
            if peer.send(msg).is_err() {
                warn!("Outbound queue for {} is closed", participant_id);
            }
        } else {
            warn!(
                "Attempted to send signal to disconnected user {}",
                participant_id
            );
        }
    }
}
