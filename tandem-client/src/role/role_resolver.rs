use std::fmt;
use tandem_core::ParticipantId;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends the first offer and every later one.
    Initiator,
    /// Only ever answers.
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// Membership facts as told by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// We joined and nobody else is in the room.
    Alone,
    /// `other-user`: the room was already occupied by this participant.
    RemotePresent(ParticipantId),
    /// `user-joined`: this participant joined after us.
    RemoteJoined(ParticipantId),
    /// `user-left`: this participant's connection ended.
    RemoteLeft(ParticipantId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub remote: ParticipantId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A remote became known; create a session for it with this role.
    Assigned(RoleAssignment),
    /// The current remote is gone; its session must be torn down.
    Released(ParticipantId),
    /// Nothing to do.
    Unchanged,
}

/// Decides who initiates.
///
/// The side that is proactively told the other's id (`other-user`, i.e. the
/// later joiner) becomes the initiator. The side that only learns that someone
/// joined responds. Both sides derive their role from different events, so
/// they can never both decide to offer.
#[derive(Debug, Default)]
pub struct RoleResolver {
    current: Option<RoleAssignment>,
}

impl RoleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RoleAssignment> {
        self.current.as_ref()
    }

    pub fn resolve(&mut self, event: MembershipEvent) -> Resolution {
        match event {
            MembershipEvent::Alone => match self.current.take() {
                Some(stale) => {
                    debug!("Alone in room, dropping stale pairing with {}", stale.remote);
                    Resolution::Released(stale.remote)
                }
                None => Resolution::Unchanged,
            },

            MembershipEvent::RemotePresent(remote) => self.assign(remote, Role::Initiator),

            MembershipEvent::RemoteJoined(remote) => self.assign(remote, Role::Responder),

            MembershipEvent::RemoteLeft(remote) => match &self.current {
                Some(assignment) if assignment.remote == remote => {
                    info!("Remote {} left, pairing released", remote);
                    self.current = None;
                    Resolution::Released(remote)
                }
                _ => {
                    debug!("Ignoring departure of unpaired participant {}", remote);
                    Resolution::Unchanged
                }
            },
        }
    }

    fn assign(&mut self, remote: ParticipantId, role: Role) -> Resolution {
        match &self.current {
            None => {
                info!("Paired with {} as {}", remote, role);
                let assignment = RoleAssignment { remote, role };
                self.current = Some(assignment.clone());
                Resolution::Assigned(assignment)
            }
            Some(existing) if existing.remote == remote => {
                debug!("Duplicate membership event for {}", remote);
                Resolution::Unchanged
            }
            Some(existing) => {
                warn!(
                    "Already paired with {}, ignoring extra participant {}",
                    existing.remote, remote
                );
                Resolution::Unchanged
            }
        }
    }
}
