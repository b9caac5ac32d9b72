use crate::room::{JoinOutcome, Room};
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ParticipantId, RoomId};
use tracing::{debug, info};

/// Who was left behind when a participant departed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub remaining: Vec<ParticipantId>,
}

/// Room membership registry.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ParticipantId, RoomId>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room_id: &RoomId, participant: &ParticipantId) -> JoinOutcome {
        let outcome = {
            let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                Room::new(room_id.clone())
            });
            room.admit(participant.clone())
        };

        match &outcome {
            JoinOutcome::Alone | JoinOutcome::Paired { .. } => {
                self.memberships
                    .insert(participant.clone(), room_id.clone());
                debug!("{} joined room {}: {:?}", participant, room_id, outcome);
            }
            JoinOutcome::AlreadyJoined | JoinOutcome::Full => {
                debug!("{} not added to room {}: {:?}", participant, room_id, outcome);
            }
        }
        outcome
    }

    /// Removes the participant from its room, dropping the room once empty.
    pub fn leave(&self, participant: &ParticipantId) -> Option<Departure> {
        let (_, room_id) = self.memberships.remove(participant)?;

        let remaining = match self.rooms.get_mut(&room_id) {
            Some(mut room) => {
                room.remove(participant);
                room.occupants().to_vec()
            }
            None => Vec::new(),
        };

        if remaining.is_empty() {
            self.rooms.remove_if(&room_id, |_, room| room.is_empty());
            info!("Room {} is empty, dropped", room_id);
        }

        Some(Departure { room_id, remaining })
    }

    pub fn room_of(&self, participant: &ParticipantId) -> Option<RoomId> {
        self.memberships.get(participant).map(|r| r.value().clone())
    }

    pub fn shares_room(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        match (self.room_of(a), self.room_of(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    pub fn occupants(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        self.rooms
            .get(room_id)
            .map(|room| room.occupants().to_vec())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
