use tandem_core::{ParticipantId, RoomId};

/// A room never holds more than two participants.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// First in the room.
    Alone,
    /// Second in the room; `existing` was already there.
    Paired { existing: ParticipantId },
    /// Already a member of this room; nothing changed.
    AlreadyJoined,
    /// Two participants present, join refused.
    Full,
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    occupants: Vec<ParticipantId>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            occupants: Vec::with_capacity(ROOM_CAPACITY),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn occupants(&self) -> &[ParticipantId] {
        &self.occupants
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub(crate) fn admit(&mut self, participant: ParticipantId) -> JoinOutcome {
        if self.occupants.contains(&participant) {
            return JoinOutcome::AlreadyJoined;
        }
        if self.occupants.len() >= ROOM_CAPACITY {
            return JoinOutcome::Full;
        }

        let existing = self.occupants.first().cloned();
        self.occupants.push(participant);
        match existing {
            Some(existing) => JoinOutcome::Paired { existing },
            None => JoinOutcome::Alone,
        }
    }

    pub(crate) fn remove(&mut self, participant: &ParticipantId) {
        self.occupants.retain(|p| p != participant);
    }
}
