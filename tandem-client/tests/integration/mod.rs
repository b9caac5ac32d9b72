//! Integration tests for tandem-client.
//!
//! Tests are organized by functionality:
//! - `negotiation_tests` - offer/answer exchange for both roles
//! - `candidate_tests` - candidate buffering, replay and isolation
//! - `failure_tests` - stalled steps, connectivity loss and teardown
//! - `engine_tests` - the engine driven by signaling, alone or through a coordinator
//! - `transport_tests` - the WebSocket transport against a live coordinator


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tandem_client::{
    BackendEvent, NegotiationState, PeerEngine, PeerSession, Role, SessionContext, SessionEvent,
    StaticTrackSource,
};
use tandem_core::{ParticipantId, SignalMessage};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::Level;

use crate::utils::{
    MockBackend, MockFactory, MockRemoteTrack, MockSignalingOutput, MockTrack, RecordingSink,
    camera_and_mic,
};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A single session wired to mocks, with the back-end signals left for the
/// test to deliver.
pub struct SessionHarness {
    pub session: PeerSession<MockBackend>,
    pub backend: MockBackend,
    pub signaling: MockSignalingOutput,
    pub sink: RecordingSink,
    pub events: broadcast::Receiver<SessionEvent>,
    pub local: ParticipantId,
    pub remote: ParticipantId,
    backend_rx: mpsc::Receiver<BackendEvent<MockRemoteTrack>>,
}

pub fn create_session(role: Role) -> SessionHarness {
    create_session_with_tracks(role, camera_and_mic())
}

pub fn create_session_with_tracks(role: Role, tracks: Vec<MockTrack>) -> SessionHarness {
    let (backend_tx, backend_rx) = mpsc::channel(64);
    let (events_tx, events) = broadcast::channel(64);
    let signaling = MockSignalingOutput::new_stored_only();
    let sink = RecordingSink::new();

    let local = ParticipantId::new();
    let remote = ParticipantId::new();
    let backend = MockBackend::new(remote.clone(), "mock", backend_tx);

    let ctx = SessionContext::new(
        tracks,
        Arc::new(signaling.clone()),
        Arc::new(sink.clone()),
        events_tx,
    );
    let session = PeerSession::new(ctx, local.clone(), remote.clone(), role, backend.clone());

    SessionHarness {
        session,
        backend,
        signaling,
        sink,
        events,
        local,
        remote,
        backend_rx,
    }
}

impl SessionHarness {
    /// Delivers every pending back-end signal to the session, the way the
    /// engine loop does.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.backend_rx.try_recv() {
            match event {
                BackendEvent::CandidateDiscovered(_, candidate) => {
                    self.session.on_local_candidate(candidate).await
                }
                BackendEvent::TrackReceived(_, track) => self.session.on_remote_track(track),
                BackendEvent::NegotiationNeeded(_) => self.session.on_negotiation_needed().await,
                BackendEvent::ConnectivityFailed(_) => self.session.on_connectivity_failed(),
            }
        }
    }

    /// Drops pending back-end signals without delivering them.
    pub fn discard_backend_events(&mut self) {
        while self.backend_rx.try_recv().is_ok() {}
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }
}

/// An engine fed by a test-controlled signaling queue.
pub struct EngineHarness {
    pub signal_tx: mpsc::Sender<SignalMessage>,
    pub handle: tandem_client::EngineHandle,
    pub events: broadcast::Receiver<SessionEvent>,
    pub factory: MockFactory,
    pub signaling: MockSignalingOutput,
    pub sink: RecordingSink,
}

pub fn spawn_engine(factory: MockFactory) -> EngineHarness {
    let (signal_tx, signal_rx) = mpsc::channel(64);
    let signaling = MockSignalingOutput::new_stored_only();
    let sink = RecordingSink::new();
    let source = StaticTrackSource::new(camera_and_mic());

    let (engine, handle) = PeerEngine::new(
        factory.clone(),
        &source,
        Arc::new(sink.clone()),
        Arc::new(signaling.clone()),
        signal_rx,
    );
    let events = handle.subscribe();
    tokio::spawn(engine.run());

    EngineHarness {
        signal_tx,
        handle,
        events,
        factory,
        signaling,
        sink,
    }
}

impl EngineHarness {
    pub async fn deliver(&self, msg: SignalMessage) {
        self.signal_tx
            .send(msg)
            .await
            .expect("Engine stopped reading signals");
    }
}

/// Waits for the first event matching `wanted`, skipping the others.
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<SessionEvent>,
    wanted: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if wanted(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("Engine event stream closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for session event")
}

pub async fn wait_for_state(
    events: &mut broadcast::Receiver<SessionEvent>,
    remote: &ParticipantId,
    state: NegotiationState,
) {
    wait_for_event(events, |e| {
        matches!(e, SessionEvent::StateChanged { remote: r, state: s } if r == remote && *s == state)
    })
    .await;
}

/// Polls `check` until it holds.
pub async fn eventually<F, Fut>(what: &str, check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let reached = timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "Timed out waiting until {}", what);
}
