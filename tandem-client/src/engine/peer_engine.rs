use crate::backend::{BackendEvent, BackendFactory, RemoteTrackOf, TrackOf};
use crate::engine::{EngineCommand, EngineHandle};
use crate::media::{MediaSink, MediaSource};
use crate::role::{MembershipEvent, Resolution, RoleAssignment, RoleResolver};
use crate::session::{CandidateBuffer, PeerSession, SessionContext, SessionEvent};
use crate::signaling::SignalingOutput;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::{
    Direction, IceCandidate, ParticipantId, RoomId, SessionDescription, SignalMessage,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 16;
const BACKEND_EVENT_CAPACITY: usize = 256;
const SESSION_EVENT_CAPACITY: usize = 256;

/// Client-side core: one task that owns the role resolver and every session.
///
/// Signaling messages, back-end signals and application commands are
/// consumed from three channels by a single loop, and each is handled to
/// completion before the next one is taken. No two transitions ever run
/// concurrently on a session.
pub struct PeerEngine<F: BackendFactory> {
    factory: F,
    ctx: SessionContext<F::Backend>,
    resolver: RoleResolver,
    sessions: HashMap<ParticipantId, PeerSession<F::Backend>>,
    local_id: Option<ParticipantId>,
    room: Option<RoomId>,
    /// Signals that arrived before `welcome`, in arrival order.
    backlog: Vec<SignalMessage>,
    /// Remote candidates that arrived before any session existed.
    orphan_candidates: CandidateBuffer,
    command_rx: mpsc::Receiver<EngineCommand>,
    signal_rx: mpsc::Receiver<SignalMessage>,
    backend_rx: mpsc::Receiver<BackendEvent<RemoteTrackOf<F>>>,
    backend_tx: mpsc::Sender<BackendEvent<RemoteTrackOf<F>>>,
}

impl<F: BackendFactory> PeerEngine<F> {
    /// `signal_rx` carries every message the coordinator delivers to us;
    /// closing it means the transport ended. The media source is read here,
    /// once.
    pub fn new(
        factory: F,
        media: &dyn MediaSource<TrackOf<F>>,
        sink: Arc<dyn MediaSink<RemoteTrackOf<F>>>,
        signaling: Arc<dyn SignalingOutput>,
        signal_rx: mpsc::Receiver<SignalMessage>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (backend_tx, backend_rx) = mpsc::channel(BACKEND_EVENT_CAPACITY);
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        let tracks = media.local_tracks();
        debug!("Media source produced {} local tracks", tracks.len());
        let ctx = SessionContext::new(tracks, signaling, sink, events.clone());

        let engine = Self {
            factory,
            ctx,
            resolver: RoleResolver::new(),
            sessions: HashMap::new(),
            local_id: None,
            room: None,
            backlog: Vec::new(),
            orphan_candidates: CandidateBuffer::new(),
            command_rx,
            signal_rx,
            backend_rx,
            backend_tx,
        };
        let handle = EngineHandle { command_tx, events };

        (engine, handle)
    }

    pub async fn run(mut self) {
        info!("Peer engine started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::Join(room_id)) => self.join(room_id).await,
                        Some(EngineCommand::Leave) | None => {
                            info!("Leaving room");
                            break;
                        }
                    }
                }

                msg = self.signal_rx.recv() => {
                    match msg {
                        Some(m) => self.handle_signal(m).await,
                        None => {
                            info!("Signaling transport closed");
                            break;
                        }
                    }
                }

                Some(evt) = self.backend_rx.recv() => {
                    self.handle_backend_event(evt).await;
                }
            }
        }

        self.teardown_all().await;
        info!("Peer engine finished");
    }

    async fn join(&mut self, room_id: RoomId) {
        if let Err(e) = room_id.validate() {
            error!("Refusing to join room {:?}: {}", room_id.as_str(), e);
            return;
        }

        info!("Joining room '{}'", room_id);
        self.on_membership(MembershipEvent::Alone).await;
        self.orphan_candidates.clear();
        self.room = Some(room_id.clone());

        if let Err(e) = self.ctx.signaling().send_join(room_id).await {
            error!("Failed to send join-room: {}", e);
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        if msg.direction() == Direction::ClientToCoordinator {
            warn!("Ignoring `{}` delivered to a client", msg.event_name());
            return;
        }
        if let Err(e) = msg.validate() {
            warn!("Dropping invalid `{}`: {}", msg.event_name(), e);
            return;
        }

        if self.local_id.is_some() {
            self.dispatch(msg).await;
            return;
        }

        match msg {
            SignalMessage::Welcome { participant_id } => {
                info!("Coordinator assigned local id {}", participant_id);
                self.local_id = Some(participant_id.clone());
                self.ctx.publish(SessionEvent::Welcomed {
                    local: participant_id,
                });

                for queued in std::mem::take(&mut self.backlog) {
                    self.dispatch(queued).await;
                }
            }
            other => {
                debug!("Queueing `{}` until welcome", other.event_name());
                self.backlog.push(other);
            }
        }
    }

    async fn dispatch(&mut self, msg: SignalMessage) {
        let Some(local) = self.local_id.clone() else {
            return;
        };
        if let Err(e) = msg.ensure_addressed_to(&local) {
            warn!("Dropping misrouted message: {}", e);
            return;
        }

        match msg {
            SignalMessage::Welcome { participant_id } => {
                if participant_id != local {
                    warn!(
                        "Ignoring second welcome ({}), local id stays {}",
                        participant_id, local
                    );
                }
            }
            SignalMessage::JoinRoom { .. } => {}
            SignalMessage::OtherUser {
                remote_participant_id,
            } => {
                self.on_membership(MembershipEvent::RemotePresent(remote_participant_id))
                    .await
            }
            SignalMessage::UserJoined {
                remote_participant_id,
            } => {
                self.on_membership(MembershipEvent::RemoteJoined(remote_participant_id))
                    .await
            }
            SignalMessage::UserLeft {
                remote_participant_id,
            } => {
                self.on_membership(MembershipEvent::RemoteLeft(remote_participant_id))
                    .await
            }
            SignalMessage::RoomFull { room_id } => {
                warn!("Room '{}' is full, staying alone", room_id);
                self.ctx.publish(SessionEvent::RoomFull { room: room_id });
            }
            SignalMessage::Offer { caller, sdp, .. } => self.on_offer(caller, sdp).await,
            SignalMessage::Answer { caller, sdp, .. } => match self.sessions.get_mut(&caller) {
                Some(session) => session.on_answer(caller, sdp).await,
                None => warn!("Answer from {} who is not our peer", caller),
            },
            SignalMessage::IceCandidate { candidate, .. } => {
                self.on_remote_candidate(candidate).await
            }
        }
    }

    async fn on_membership(&mut self, event: MembershipEvent) {
        match self.resolver.resolve(event) {
            Resolution::Assigned(assignment) => self.open_session(assignment).await,
            Resolution::Released(remote) => self.close_session(&remote).await,
            Resolution::Unchanged => {}
        }
    }

    async fn on_offer(&mut self, caller: ParticipantId, sdp: SessionDescription) {
        if !self.sessions.contains_key(&caller) && self.resolver.current().is_none() {
            info!("Offer from unannounced {}, treating it as joined", caller);
            self.on_membership(MembershipEvent::RemoteJoined(caller.clone()))
                .await;
        }

        match self.sessions.get_mut(&caller) {
            Some(session) => session.on_offer(caller, sdp).await,
            None => warn!("Offer from {} who is not our peer", caller),
        }
    }

    /// `ice-candidate` carries no sender; a room holds one peer at most.
    async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        match self.sessions.values_mut().next() {
            Some(session) => session.on_remote_candidate(candidate).await,
            None => {
                debug!("Candidate before any session, holding it");
                self.orphan_candidates.push(candidate);
            }
        }
    }

    async fn open_session(&mut self, assignment: RoleAssignment) {
        let Some(local) = self.local_id.clone() else {
            return;
        };
        let RoleAssignment { remote, role } = assignment;

        let backend = match self.factory.create(&remote, self.backend_tx.clone()).await {
            Ok(backend) => backend,
            Err(e) => {
                error!("Failed to create connection for {}: {}", remote, e);
                self.ctx.publish(SessionEvent::SessionSetupFailed {
                    remote: remote.clone(),
                    reason: e.to_string(),
                });
                self.orphan_candidates.clear();
                self.resolver.resolve(MembershipEvent::RemoteLeft(remote));
                return;
            }
        };

        let mut session = PeerSession::new(self.ctx.clone(), local, remote.clone(), role, backend);
        self.ctx.publish(SessionEvent::SessionCreated {
            remote: remote.clone(),
            role,
        });

        for candidate in self.orphan_candidates.take_all() {
            session.on_remote_candidate(candidate).await;
        }
        session.start().await;

        self.sessions.insert(remote, session);
    }

    /// Orphaned candidates belong to whichever peer we were pairing with, so
    /// they go with it.
    async fn close_session(&mut self, remote: &ParticipantId) {
        self.orphan_candidates.clear();
        if let Some(mut session) = self.sessions.remove(remote) {
            session.teardown().await;
        }
    }

    async fn handle_backend_event(&mut self, event: BackendEvent<RemoteTrackOf<F>>) {
        let Some(session) = self.sessions.get_mut(event.remote()) else {
            debug!("Back-end event for unknown session {}", event.remote());
            return;
        };

        match event {
            BackendEvent::CandidateDiscovered(_, candidate) => {
                session.on_local_candidate(candidate).await
            }
            BackendEvent::TrackReceived(_, track) => session.on_remote_track(track),
            BackendEvent::NegotiationNeeded(_) => session.on_negotiation_needed().await,
            BackendEvent::ConnectivityFailed(_) => session.on_connectivity_failed(),
        }
    }

    async fn teardown_all(&mut self) {
        for (_, mut session) in std::mem::take(&mut self.sessions) {
            session.teardown().await;
        }
        if let Some(room) = self.room.take() {
            debug!("Left room '{}'", room);
        }
    }
}
