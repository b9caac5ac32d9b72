use std::fmt;

/// Description-exchange state of one peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// Created, nothing exchanged yet.
    Idle,
    /// Initiator installed its offer and waits for the answer.
    HaveLocalOffer,
    /// Responder installed the remote offer and has not answered yet.
    HaveRemoteOffer,
    /// Both descriptions installed.
    Stable,
    /// Torn down. Terminal.
    Closed,
    /// Connectivity exhausted every candidate pair. Terminal.
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// States in which the next offer/answer exchange may start.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Idle | Self::Stable)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::HaveLocalOffer => "have-local-offer",
            Self::HaveRemoteOffer => "have-remote-offer",
            Self::Stable => "stable",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
