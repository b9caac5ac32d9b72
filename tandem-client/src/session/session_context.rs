use crate::backend::ConnectivityBackend;
use crate::media::MediaSink;
use crate::session::SessionEvent;
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Collaborators shared by every session of one engine.
///
/// The local track set is read-only here: sessions attach the tracks to their
/// own back-end, they never change the set.
pub struct SessionContext<B: ConnectivityBackend> {
    tracks: Arc<[B::Track]>,
    signaling: Arc<dyn SignalingOutput>,
    sink: Arc<dyn MediaSink<B::RemoteTrack>>,
    events: broadcast::Sender<SessionEvent>,
}

impl<B: ConnectivityBackend> SessionContext<B> {
    pub fn new(
        tracks: Vec<B::Track>,
        signaling: Arc<dyn SignalingOutput>,
        sink: Arc<dyn MediaSink<B::RemoteTrack>>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            tracks: tracks.into(),
            signaling,
            sink,
            events,
        }
    }

    pub fn tracks(&self) -> &[B::Track] {
        &self.tracks
    }

    pub fn signaling(&self) -> &dyn SignalingOutput {
        self.signaling.as_ref()
    }

    pub fn sink(&self) -> &dyn MediaSink<B::RemoteTrack> {
        self.sink.as_ref()
    }

    /// Nobody listening is fine.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

impl<B: ConnectivityBackend> Clone for SessionContext<B> {
    fn clone(&self) -> Self {
        Self {
            tracks: self.tracks.clone(),
            signaling: self.signaling.clone(),
            sink: self.sink.clone(),
            events: self.events.clone(),
        }
    }
}
