use tandem_core::ValidationError;
use thiserror::Error;

/// Rejection reported by the connectivity back-end for one asynchronous step.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("back-end rejected the step: {0}")]
    Rejected(String),

    #[error("back-end is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling channel closed")]
    ChannelClosed,

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Why a negotiation step did not complete. Never fatal to the process.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("create offer failed: {0}")]
    CreateOffer(#[source] BackendError),

    #[error("create answer failed: {0}")]
    CreateAnswer(#[source] BackendError),

    #[error("set local description failed: {0}")]
    SetLocalDescription(#[source] BackendError),

    #[error("set remote description failed: {0}")]
    SetRemoteDescription(#[source] BackendError),

    #[error("attach local track failed: {0}")]
    AttachTrack(#[source] BackendError),

    #[error("sending `{event}` failed: {source}")]
    Send {
        event: &'static str,
        #[source]
        source: SignalingError,
    },

    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationError),
}
