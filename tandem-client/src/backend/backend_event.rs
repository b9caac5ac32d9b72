use tandem_core::{IceCandidate, ParticipantId};

/// Signals the connectivity layer raises for one remote participant.
pub enum BackendEvent<R> {
    /// The local gatherer found a candidate that the remote must learn about.
    CandidateDiscovered(ParticipantId, IceCandidate),

    /// Inbound media arrived; goes to the media sink.
    TrackReceived(ParticipantId, R),

    /// The outbound track set changed and an offer is due.
    NegotiationNeeded(ParticipantId),

    /// Every candidate pair failed.
    ConnectivityFailed(ParticipantId),
}

impl<R> BackendEvent<R> {
    pub fn remote(&self) -> &ParticipantId {
        match self {
            Self::CandidateDiscovered(id, _)
            | Self::TrackReceived(id, _)
            | Self::NegotiationNeeded(id)
            | Self::ConnectivityFailed(id) => id,
        }
    }
}
