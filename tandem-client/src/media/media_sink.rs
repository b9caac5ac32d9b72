use std::sync::Arc;
use tandem_core::ParticipantId;
use tracing::{debug, info};
use webrtc::track::track_remote::TrackRemote;

/// Display surface for inbound media.
pub trait MediaSink<R>: Send + Sync {
    fn attach(&self, remote: &ParticipantId, track: R);
}

/// Headless sink: logs each inbound track and drains its RTP until it ends.
#[derive(Default)]
pub struct LoggingSink;

impl MediaSink<Arc<TrackRemote>> for LoggingSink {
    fn attach(&self, remote: &ParticipantId, track: Arc<TrackRemote>) {
        info!(
            "Remote {} track attached: kind={} id={} codec={}",
            remote,
            track.kind(),
            track.id(),
            track.codec().capability.mime_type
        );

        let remote = remote.clone();
        tokio::spawn(async move {
            let mut packets: u64 = 0;
            while track.read_rtp().await.is_ok() {
                packets += 1;
                if packets % 500 == 0 {
                    debug!("Remote {} track {}: {} packets", remote, track.id(), packets);
                }
            }
            info!(
                "Remote {} track {} ended after {} packets",
                remote,
                track.id(),
                packets
            );
        });
    }
}
