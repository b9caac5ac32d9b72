use crate::backend::{BackendEvent, BackendFactory, ConnectivityBackend};
use crate::error::BackendError;
use crate::transport::TransportConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidate, ParticipantId, SdpKind, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::API;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds a fresh `RTCPeerConnection` for every remote participant.
pub struct WebRtcFactory {
    api: API,
    config: TransportConfig,
}

impl WebRtcFactory {
    pub fn new(config: TransportConfig) -> Result<Self, BackendError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api, config })
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        let mut ice_servers = Vec::new();
        if !self.config.stun_servers.is_empty() {
            ice_servers.push(RTCIceServer {
                urls: self.config.stun_servers.clone(),
                ..Default::default()
            });
        }

        if let Some(turn) = &self.config.turn {
            ice_servers.push(RTCIceServer {
                urls: vec![turn.url.clone()],
                username: turn.username.clone().unwrap_or_default(),
                credential: turn.credential.clone().unwrap_or_default(),
                ..Default::default()
            });
        }

        RTCConfiguration {
            ice_servers,
            ice_candidate_pool_size: self.config.ice_candidate_pool_size,
            ..Default::default()
        }
    }
}

#[async_trait]
impl BackendFactory for WebRtcFactory {
    type Backend = WebRtcBackend;

    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<BackendEvent<Arc<TrackRemote>>>,
    ) -> Result<WebRtcBackend, BackendError> {
        let peer_connection = Arc::new(
            self.api
                .new_peer_connection(self.rtc_configuration())
                .await?,
        );

        // Each callback owns a sender and the remote id.

        let state_tx = events.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {}", uid, s);
                    if s == RTCPeerConnectionState::Failed {
                        let _ = tx.send(BackendEvent::ConnectivityFailed(uid)).await;
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(BackendEvent::CandidateDiscovered(uid, from_rtc_candidate(init)))
                    .await;
            })
        }));

        let track_tx = events.clone();
        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    debug!("Inbound track {} from {}", track.id(), uid);
                    let _ = tx.send(BackendEvent::TrackReceived(uid, track)).await;
                })
            },
        ));

        let nego_tx = events;
        let uid_nego = remote.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = nego_tx.clone();
            let uid = uid_nego.clone();

            Box::pin(async move {
                let _ = tx.send(BackendEvent::NegotiationNeeded(uid)).await;
            })
        }));

        Ok(WebRtcBackend { peer_connection })
    }
}

pub struct WebRtcBackend {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl ConnectivityBackend for WebRtcBackend {
    type Track = Arc<dyn TrackLocal + Send + Sync>;
    type RemoteTrack = Arc<TrackRemote>;

    async fn create_offer(&self) -> Result<SessionDescription, BackendError> {
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc_description(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, BackendError> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc_description(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), BackendError> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), BackendError> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), BackendError> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await?;
        Ok(())
    }

    async fn add_track(&self, track: Self::Track) -> Result<(), BackendError> {
        self.peer_connection.add_track(track).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, BackendError> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

fn from_rtc_description(desc: RTCSessionDescription) -> Result<SessionDescription, BackendError> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => Err(BackendError::Rejected(format!(
            "unsupported description type {}",
            other
        ))),
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
