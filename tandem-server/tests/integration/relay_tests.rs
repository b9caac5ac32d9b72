use tandem_core::{IceCandidate, ParticipantId, SessionDescription, SignalMessage};
use tandem_server::SignalingService;

use crate::integration::init_tracing;
use crate::utils::TestParticipant;

async fn paired(service: &SignalingService) -> (TestParticipant, TestParticipant) {
    let mut a = TestParticipant::connect(service).await;
    let mut b = TestParticipant::connect(service).await;
    a.join(service, "r1");
    b.join(service, "r1");
    b.recv().await;
    a.recv().await;
    (a, b)
}

#[tokio::test]
async fn test_offer_answer_and_candidates_are_relayed() {
    init_tracing();
    let service = SignalingService::new();
    let (mut a, mut b) = paired(&service).await;

    let offer = SignalMessage::Offer {
        target: a.id.clone(),
        caller: b.id.clone(),
        sdp: SessionDescription::offer("O1"),
    };
    service.handle_message(&b.id, offer.clone());
    assert_eq!(a.recv().await, offer);

    let answer = SignalMessage::Answer {
        target: b.id.clone(),
        caller: a.id.clone(),
        sdp: SessionDescription::answer("S1"),
    };
    service.handle_message(&a.id, answer.clone());
    assert_eq!(b.recv().await, answer);

    let candidate = SignalMessage::IceCandidate {
        target: b.id.clone(),
        candidate: IceCandidate::new("candidate:1 1 udp 1 10.0.0.1 5000 typ host"),
    };
    service.handle_message(&a.id, candidate.clone());
    assert_eq!(b.recv().await, candidate);
}

#[tokio::test]
async fn test_spoofed_caller_is_dropped() {
    init_tracing();
    let service = SignalingService::new();
    let (mut a, b) = paired(&service).await;

    service.handle_message(
        &b.id,
        SignalMessage::Offer {
            target: a.id.clone(),
            caller: ParticipantId::new(),
            sdp: SessionDescription::offer("O1"),
        },
    );

    assert!(a.is_quiet().await);
}

#[tokio::test]
async fn test_relay_outside_the_room_is_dropped() {
    init_tracing();
    let service = SignalingService::new();
    let (a, _b) = paired(&service).await;
    let mut stranger = TestParticipant::connect(&service).await;
    stranger.join(&service, "elsewhere");

    service.handle_message(
        &a.id,
        SignalMessage::IceCandidate {
            target: stranger.id.clone(),
            candidate: IceCandidate::new("candidate:1"),
        },
    );

    assert!(stranger.is_quiet().await);
}

#[tokio::test]
async fn test_clients_cannot_send_coordinator_events() {
    init_tracing();
    let service = SignalingService::new();
    let (mut a, b) = paired(&service).await;

    service.handle_message(
        &b.id,
        SignalMessage::UserLeft {
            remote_participant_id: b.id.clone(),
        },
    );

    assert!(a.is_quiet().await);
}

#[tokio::test]
async fn test_mismatched_description_kind_is_dropped() {
    init_tracing();
    let service = SignalingService::new();
    let (mut a, b) = paired(&service).await;

    service.handle_message(
        &b.id,
        SignalMessage::Offer {
            target: a.id.clone(),
            caller: b.id.clone(),
            sdp: SessionDescription::answer("S1"),
        },
    );

    assert!(a.is_quiet().await);
}
