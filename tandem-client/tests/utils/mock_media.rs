use std::sync::{Arc, Mutex};
use tandem_client::MediaSink;
use tandem_core::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTrack(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRemoteTrack(pub String);

pub fn camera_and_mic() -> Vec<MockTrack> {
    vec![MockTrack("video"), MockTrack("audio")]
}

/// Sink that remembers every attached track.
#[derive(Clone, Default)]
pub struct RecordingSink {
    attached: Arc<Mutex<Vec<(ParticipantId, MockRemoteTrack)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Vec<(ParticipantId, MockRemoteTrack)> {
        self.attached.lock().expect("sink lock poisoned").clone()
    }
}

impl MediaSink<MockRemoteTrack> for RecordingSink {
    fn attach(&self, remote: &ParticipantId, track: MockRemoteTrack) {
        self.attached
            .lock()
            .expect("sink lock poisoned")
            .push((remote.clone(), track));
    }
}
