use tandem_client::{NegotiationState, Role, SessionEvent};
use tandem_core::{RoomId, SessionDescription};
use tandem_server::SignalingService;

use super::{spawn_service_peer, wait_until_seated};
use crate::integration::{eventually, init_tracing, wait_for_event, wait_for_state};
use crate::utils::BackendCall;

#[tokio::test]
async fn test_second_joiner_initiates_and_both_reach_stable() {
    init_tracing();
    let service = SignalingService::new();
    let mut alice = spawn_service_peer(&service, "alice");
    let mut bob = spawn_service_peer(&service, "bob");

    alice.handle.join(RoomId::new("r1")).await;
    wait_until_seated(&service, &alice.id).await;
    bob.handle.join(RoomId::new("r1")).await;

    let created = wait_for_event(&mut bob.events, |e| {
        matches!(e, SessionEvent::SessionCreated { .. })
    })
    .await;
    assert_eq!(
        created,
        SessionEvent::SessionCreated {
            remote: alice.id.clone(),
            role: Role::Initiator,
        }
    );
    let created = wait_for_event(&mut alice.events, |e| {
        matches!(e, SessionEvent::SessionCreated { .. })
    })
    .await;
    assert_eq!(
        created,
        SessionEvent::SessionCreated {
            remote: bob.id.clone(),
            role: Role::Responder,
        }
    );

    wait_for_state(&mut bob.events, &alice.id, NegotiationState::Stable).await;
    wait_for_state(&mut alice.events, &bob.id, NegotiationState::Stable).await;

    let at_alice = alice
        .factory
        .backend_for(&bob.id)
        .await
        .expect("Alice has a connection to Bob");
    let at_bob = bob
        .factory
        .backend_for(&alice.id)
        .await
        .expect("Bob has a connection to Alice");

    assert!(
        at_alice
            .calls()
            .await
            .contains(&BackendCall::SetRemote(SessionDescription::offer(
                "bob-offer-1"
            )))
    );
    assert!(
        at_bob
            .calls()
            .await
            .contains(&BackendCall::SetRemote(SessionDescription::answer(
                "alice-answer-1"
            )))
    );

    // Each side installs the candidate the other gathered.
    let (a, b) = (&at_alice, &at_bob);
    eventually("both sides installed a candidate", || async move {
        !a.added_candidates().await.is_empty() && !b.added_candidates().await.is_empty()
    })
    .await;
    assert!(
        at_alice.added_candidates().await[0]
            .candidate
            .starts_with("candidate:bob-offer-1")
    );
    assert!(
        at_bob.added_candidates().await[0]
            .candidate
            .starts_with("candidate:alice-answer-1")
    );
}

#[tokio::test]
async fn test_departure_closes_the_remaining_session() {
    init_tracing();
    let service = SignalingService::new();
    let mut alice = spawn_service_peer(&service, "alice");
    let mut bob = spawn_service_peer(&service, "bob");

    alice.handle.join(RoomId::new("r1")).await;
    wait_until_seated(&service, &alice.id).await;
    bob.handle.join(RoomId::new("r1")).await;
    wait_for_state(&mut alice.events, &bob.id, NegotiationState::Stable).await;

    bob.handle.leave().await;
    service.disconnect(&bob.id);

    let ended = wait_for_event(&mut alice.events, |e| {
        matches!(e, SessionEvent::SessionEnded { .. })
    })
    .await;
    assert_eq!(
        ended,
        SessionEvent::SessionEnded {
            remote: bob.id.clone(),
            state: NegotiationState::Closed,
        }
    );
    wait_for_event(&mut bob.events, |e| {
        matches!(e, SessionEvent::SessionEnded { .. })
    })
    .await;

    let at_alice = alice
        .factory
        .backend_for(&bob.id)
        .await
        .expect("Alice had a connection to Bob");
    assert_eq!(at_alice.count(|c| *c == BackendCall::Close).await, 1);
}

#[tokio::test]
async fn test_third_participant_is_turned_away() {
    init_tracing();
    let service = SignalingService::new();
    let alice = spawn_service_peer(&service, "alice");
    let bob = spawn_service_peer(&service, "bob");
    let mut carol = spawn_service_peer(&service, "carol");

    alice.handle.join(RoomId::new("r1")).await;
    wait_until_seated(&service, &alice.id).await;
    bob.handle.join(RoomId::new("r1")).await;
    wait_until_seated(&service, &bob.id).await;

    carol.handle.join(RoomId::new("r1")).await;

    let full = wait_for_event(&mut carol.events, |e| {
        matches!(e, SessionEvent::RoomFull { .. })
    })
    .await;
    assert_eq!(
        full,
        SessionEvent::RoomFull {
            room: RoomId::new("r1")
        }
    );
    assert!(carol.factory.backends().await.is_empty());
}
