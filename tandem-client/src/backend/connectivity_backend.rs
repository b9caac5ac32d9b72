use crate::backend::BackendEvent;
use crate::error::BackendError;
use async_trait::async_trait;
use tandem_core::{IceCandidate, ParticipantId, SessionDescription};
use tokio::sync::mpsc;

/// The peer-connection primitives a session drives. Each call may suspend
/// while the underlying stack does its work.
#[async_trait]
pub trait ConnectivityBackend: Send + Sync + 'static {
    /// Outbound media handle, shared read-only between sessions.
    type Track: Clone + Send + Sync + 'static;
    /// Inbound media handle given to the sink.
    type RemoteTrack: Send + 'static;

    async fn create_offer(&self) -> Result<SessionDescription, BackendError>;

    async fn create_answer(&self) -> Result<SessionDescription, BackendError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), BackendError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), BackendError>;

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), BackendError>;

    async fn add_track(&self, track: Self::Track) -> Result<(), BackendError>;

    async fn close(&self) -> Result<(), BackendError>;
}

/// Builds one back-end per remote participant. The back-end reports its
/// signals through `events`, tagged with `remote`.
#[async_trait]
pub trait BackendFactory: Send + Sync + 'static {
    type Backend: ConnectivityBackend;

    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<BackendEvent<<Self::Backend as ConnectivityBackend>::RemoteTrack>>,
    ) -> Result<Self::Backend, BackendError>;
}

pub type TrackOf<F> = <<F as BackendFactory>::Backend as ConnectivityBackend>::Track;
pub type RemoteTrackOf<F> = <<F as BackendFactory>::Backend as ConnectivityBackend>::RemoteTrack;
