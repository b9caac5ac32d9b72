use std::sync::Arc;

use tandem_client::{
    EngineHandle, NegotiationState, PeerEngine, SessionEvent, SignalingOutput, StaticTrackSource,
    WsSignaling,
};
use tandem_core::{ParticipantId, RoomId, SignalMessage};
use tandem_server::SignalingService;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::integration::engine_tests::wait_until_seated;
use crate::integration::{eventually, init_tracing, wait_for_event, wait_for_state};
use crate::utils::{MockFactory, RecordingSink, camera_and_mic};

async fn start_coordinator() -> (String, SignalingService) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let url = format!("ws://{}/ws", listener.local_addr().expect("No local addr"));
    let service = SignalingService::new();

    let serving = service.clone();
    tokio::spawn(async move {
        let _ = tandem_server::serve_on(listener, serving).await;
    });

    (url, service)
}

#[tokio::test]
async fn test_socket_delivers_welcome_and_join() {
    init_tracing();
    let (url, service) = start_coordinator().await;

    let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
    let signaling = WsSignaling::connect(&url, inbound_tx)
        .await
        .expect("Failed to connect");

    let Some(SignalMessage::Welcome { participant_id }) = inbound_rx.recv().await else {
        panic!("First message must be welcome");
    };

    signaling
        .send_join(RoomId::new("r1"))
        .await
        .expect("Failed to send join-room");

    let rooms = service.rooms();
    let id = &participant_id;
    eventually("join-room reached the coordinator", || async move {
        rooms.room_of(id) == Some(RoomId::new("r1"))
    })
    .await;

    signaling.close();
    assert_eq!(
        inbound_rx.recv().await,
        None,
        "Inbound queue ends with the socket"
    );
    eventually("coordinator forgot the participant", || async move {
        rooms.room_of(id).is_none()
    })
    .await;
}

async fn spawn_ws_peer(
    url: &str,
    label: &str,
) -> (EngineHandle, broadcast::Receiver<SessionEvent>) {
    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let signaling = WsSignaling::connect(url, inbound_tx)
        .await
        .expect("Failed to connect");
    let source = StaticTrackSource::new(camera_and_mic());

    let (engine, handle) = PeerEngine::new(
        MockFactory::new(label),
        &source,
        Arc::new(RecordingSink::new()),
        Arc::new(signaling),
        inbound_rx,
    );
    let events = handle.subscribe();
    tokio::spawn(engine.run());
    (handle, events)
}

async fn welcomed(events: &mut broadcast::Receiver<SessionEvent>) -> ParticipantId {
    match wait_for_event(events, |e| matches!(e, SessionEvent::Welcomed { .. })).await {
        SessionEvent::Welcomed { local } => local,
        other => panic!("Unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_two_engines_negotiate_over_websockets() {
    init_tracing();
    let (url, service) = start_coordinator().await;

    let (alice, mut alice_events) = spawn_ws_peer(&url, "alice").await;
    let (bob, mut bob_events) = spawn_ws_peer(&url, "bob").await;
    let alice_id = welcomed(&mut alice_events).await;
    let bob_id = welcomed(&mut bob_events).await;

    alice.join(RoomId::new("r1")).await;
    wait_until_seated(&service, &alice_id).await;
    bob.join(RoomId::new("r1")).await;

    wait_for_state(&mut bob_events, &alice_id, NegotiationState::Stable).await;
    wait_for_state(&mut alice_events, &bob_id, NegotiationState::Stable).await;
}
