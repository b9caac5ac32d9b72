use std::sync::Arc;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Produces the outbound tracks. Read exactly once, before any negotiation.
pub trait MediaSource<T>: Send + Sync {
    fn local_tracks(&self) -> Vec<T>;
}

/// A fixed set of tracks, handed out as given.
pub struct StaticTrackSource<T> {
    tracks: Vec<T>,
}

impl<T> StaticTrackSource<T> {
    pub fn new(tracks: Vec<T>) -> Self {
        Self { tracks }
    }
}

impl<T: Clone + Send + Sync> MediaSource<T> for StaticTrackSource<T> {
    fn local_tracks(&self) -> Vec<T> {
        self.tracks.clone()
    }
}

impl StaticTrackSource<Arc<dyn TrackLocal + Send + Sync>> {
    /// A single VP8 video track with no capture attached. Enough to negotiate
    /// a video section; samples can be written to it by whoever owns it.
    pub fn vp8(stream_id: &str) -> (Self, Arc<TrackLocalStaticSample>) {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            stream_id.to_owned(),
        ));
        let source = Self::new(vec![track.clone() as Arc<dyn TrackLocal + Send + Sync>]);
        (source, track)
    }
}
