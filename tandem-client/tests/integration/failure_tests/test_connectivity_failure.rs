use tandem_client::{BackendEvent, NegotiationState, Role, SessionEvent};
use tandem_core::SessionDescription;

use crate::integration::{create_session, init_tracing};
use crate::utils::{BackendCall, MockRemoteTrack};

#[tokio::test]
async fn test_connectivity_failure_is_terminal() {
    init_tracing();
    let mut h = create_session(Role::Initiator);
    h.session.start().await;
    h.pump().await;
    h.session
        .on_answer(h.remote.clone(), SessionDescription::answer("S1"))
        .await;
    h.drain_events();

    h.backend
        .emit(BackendEvent::ConnectivityFailed(h.remote.clone()))
        .await;
    h.pump().await;

    assert_eq!(h.session.state(), NegotiationState::Failed);
    assert!(h.drain_events().contains(&SessionEvent::SessionEnded {
        remote: h.remote.clone(),
        state: NegotiationState::Failed,
    }));

    // No automatic retry.
    h.session.on_negotiation_needed().await;
    h.session
        .on_answer(h.remote.clone(), SessionDescription::answer("S2"))
        .await;

    assert_eq!(h.session.state(), NegotiationState::Failed);
    assert_eq!(h.signaling.offers_to(&h.remote).await.len(), 1);
    assert_eq!(
        h.backend.count(|c| *c == BackendCall::CreateOffer).await,
        1
    );
}

#[tokio::test]
async fn test_remote_tracks_reach_sink_until_failure() {
    init_tracing();
    let mut h = create_session(Role::Responder);
    h.session
        .on_offer(h.remote.clone(), SessionDescription::offer("O1"))
        .await;

    h.backend
        .emit(BackendEvent::TrackReceived(
            h.remote.clone(),
            MockRemoteTrack("remote-video".to_owned()),
        ))
        .await;
    h.pump().await;
    assert_eq!(
        h.sink.attached(),
        vec![(h.remote.clone(), MockRemoteTrack("remote-video".to_owned()))]
    );

    h.session.on_connectivity_failed();
    h.session
        .on_remote_track(MockRemoteTrack("remote-audio".to_owned()));

    assert_eq!(h.sink.attached().len(), 1);
}
