use crate::backend::ConnectivityBackend;
use crate::error::NegotiationError;
use crate::role::Role;
use crate::session::{CandidateBuffer, NegotiationState, SessionContext, SessionEvent};
use tandem_core::{IceCandidate, ParticipantId, SdpKind, SessionDescription, ValidationError};
use tracing::{debug, info, warn};

/// Negotiation with one remote participant.
///
/// Every step that touches the back-end is awaited in order, so within a
/// transition the dependent steps (install remote description, attach
/// tracks, create answer, install local description, send) can never be
/// reordered. Failures are recorded in [`PeerSession::last_error`] and
/// published, never propagated: the session stays in the state it reached.
pub struct PeerSession<B: ConnectivityBackend> {
    ctx: SessionContext<B>,
    local_id: ParticipantId,
    remote_id: ParticipantId,
    role: Role,
    state: NegotiationState,
    backend: B,
    tracks_attached: bool,
    /// Stays true across renegotiations once the first remote description is in.
    remote_description_installed: bool,
    renegotiation_pending: bool,
    /// The answer to the outstanding offer was rejected; a new offer may replace it.
    answer_rejected: bool,
    /// Remote candidates that arrived before any remote description.
    inbound_candidates: CandidateBuffer,
    /// Local candidates gathered before the first description was sent.
    outbound_candidates: CandidateBuffer,
    last_error: Option<NegotiationError>,
}

impl<B: ConnectivityBackend> PeerSession<B> {
    pub fn new(
        ctx: SessionContext<B>,
        local_id: ParticipantId,
        remote_id: ParticipantId,
        role: Role,
        backend: B,
    ) -> Self {
        info!("Session with {} created, local role {}", remote_id, role);
        Self {
            ctx,
            local_id,
            remote_id,
            role,
            state: NegotiationState::Idle,
            backend,
            tracks_attached: false,
            remote_description_installed: false,
            renegotiation_pending: false,
            answer_rejected: false,
            inbound_candidates: CandidateBuffer::new(),
            outbound_candidates: CandidateBuffer::new(),
            last_error: None,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// The failure that stalled the last negotiation step, if any.
    pub fn last_error(&self) -> Option<&NegotiationError> {
        self.last_error.as_ref()
    }

    pub fn pending_inbound_candidates(&self) -> usize {
        self.inbound_candidates.len()
    }

    pub fn pending_outbound_candidates(&self) -> usize {
        self.outbound_candidates.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The initiator attaches its tracks right away; the resulting
    /// negotiation-needed signal starts the first offer. The responder waits
    /// for an offer before attaching anything.
    pub async fn start(&mut self) {
        if self.role != Role::Initiator || self.state.is_terminal() {
            return;
        }
        if let Err(e) = self.attach_local_tracks().await {
            self.fail(e);
        }
    }

    pub async fn on_negotiation_needed(&mut self) {
        if self.is_finished("negotiation-needed") {
            return;
        }
        if self.role == Role::Responder {
            debug!("Responder for {} ignores negotiation-needed", self.remote_id);
            return;
        }
        if self.answer_rejected {
            info!("Replacing the rejected offer to {}", self.remote_id);
            self.renegotiation_pending = false;
        } else if !self.state.is_settled() {
            debug!(
                "Negotiation with {} in flight ({}), renegotiating once stable",
                self.remote_id, self.state
            );
            self.renegotiation_pending = true;
            return;
        }

        if let Err(e) = self.send_offer().await {
            self.fail(e);
        }
    }

    pub async fn on_offer(&mut self, caller: ParticipantId, sdp: SessionDescription) {
        if self.is_finished("offer") {
            return;
        }
        if self.role != Role::Responder {
            warn!(
                "Initiator received an offer from {}, dropping it",
                caller
            );
            return;
        }
        if !self.state.is_settled() {
            warn!(
                "Offer from {} while {}, dropping it",
                caller, self.state
            );
            return;
        }
        if caller != self.remote_id {
            warn!(
                "Offer from {} but this session belongs to {}",
                caller, self.remote_id
            );
            return;
        }

        if let Err(e) = self.answer_offer(sdp).await {
            self.fail(e);
        }
    }

    pub async fn on_answer(&mut self, caller: ParticipantId, sdp: SessionDescription) {
        if self.is_finished("answer") {
            return;
        }
        if self.role != Role::Initiator {
            warn!("Responder received an answer from {}, dropping it", caller);
            return;
        }
        if self.state != NegotiationState::HaveLocalOffer {
            warn!(
                "Answer from {} while {}, dropping it",
                caller, self.state
            );
            return;
        }
        if caller != self.remote_id {
            warn!(
                "Answer from {} but this session belongs to {}",
                caller, self.remote_id
            );
            return;
        }

        if let Err(e) = self.accept_answer(sdp).await {
            self.answer_rejected = true;
            self.fail(e);
            return;
        }

        if self.renegotiation_pending {
            self.renegotiation_pending = false;
            info!("Starting deferred renegotiation with {}", self.remote_id);
            if let Err(e) = self.send_offer().await {
                self.fail(e);
            }
        }
    }

    /// Never installs a candidate before a remote description exists.
    pub async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        if self.is_finished("ice-candidate") {
            return;
        }
        if !self.remote_description_installed {
            self.inbound_candidates.push(candidate);
            debug!(
                "Buffered remote candidate from {} ({} pending)",
                self.remote_id,
                self.inbound_candidates.len()
            );
            return;
        }
        self.install_candidate(candidate).await;
    }

    pub async fn on_local_candidate(&mut self, candidate: IceCandidate) {
        if self.is_finished("local candidate") {
            return;
        }
        if self.state == NegotiationState::Idle {
            self.outbound_candidates.push(candidate);
            debug!(
                "Holding local candidate for {} until a description is sent ({} pending)",
                self.remote_id,
                self.outbound_candidates.len()
            );
            return;
        }
        self.send_candidate(candidate).await;
    }

    pub fn on_remote_track(&self, track: B::RemoteTrack) {
        if self.state.is_terminal() {
            debug!("Session with {} ended, dropping inbound track", self.remote_id);
            return;
        }
        info!("Inbound media from {}", self.remote_id);
        self.ctx.sink().attach(&self.remote_id, track);
    }

    pub fn on_connectivity_failed(&mut self) {
        if self.is_finished("connectivity failure") {
            return;
        }
        warn!("Connectivity with {} exhausted, session failed", self.remote_id);
        self.renegotiation_pending = false;
        self.transition(NegotiationState::Failed);
        self.ctx.publish(SessionEvent::SessionEnded {
            remote: self.remote_id.clone(),
            state: NegotiationState::Failed,
        });
    }

    /// Closes the session from any state. Idempotent.
    pub async fn teardown(&mut self) {
        if self.state == NegotiationState::Closed {
            debug!("Session with {} already closed", self.remote_id);
            return;
        }

        self.transition(NegotiationState::Closed);
        self.renegotiation_pending = false;
        self.inbound_candidates.clear();
        self.outbound_candidates.clear();

        if let Err(e) = self.backend.close().await {
            warn!("Closing connection to {} failed: {}", self.remote_id, e);
        }

        info!("Session with {} closed", self.remote_id);
        self.ctx.publish(SessionEvent::SessionEnded {
            remote: self.remote_id.clone(),
            state: NegotiationState::Closed,
        });
    }

    async fn send_offer(&mut self) -> Result<(), NegotiationError> {
        let offer = self
            .backend
            .create_offer()
            .await
            .map_err(NegotiationError::CreateOffer)?;
        self.backend
            .set_local_description(offer.clone())
            .await
            .map_err(NegotiationError::SetLocalDescription)?;
        self.transition(NegotiationState::HaveLocalOffer);
        self.answer_rejected = false;

        info!("Sending offer to {}", self.remote_id);
        self.ctx
            .signaling()
            .send_offer(self.remote_id.clone(), self.local_id.clone(), offer)
            .await
            .map_err(|source| NegotiationError::Send {
                event: "offer",
                source,
            })?;

        self.flush_outbound_candidates().await;
        Ok(())
    }

    async fn answer_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        ensure_kind("offer", SdpKind::Offer, &offer)?;

        // A rejected offer still moves to have-remote-offer and stalls there.
        let installed = self.backend.set_remote_description(offer).await;
        self.transition(NegotiationState::HaveRemoteOffer);
        installed.map_err(NegotiationError::SetRemoteDescription)?;
        self.remote_description_installed = true;
        self.replay_inbound_candidates().await;

        // Answer generation depends on the media sections the tracks add.
        self.attach_local_tracks().await?;

        let answer = self
            .backend
            .create_answer()
            .await
            .map_err(NegotiationError::CreateAnswer)?;
        self.backend
            .set_local_description(answer.clone())
            .await
            .map_err(NegotiationError::SetLocalDescription)?;
        self.transition(NegotiationState::Stable);

        info!("Sending answer to {}", self.remote_id);
        self.ctx
            .signaling()
            .send_answer(self.remote_id.clone(), self.local_id.clone(), answer)
            .await
            .map_err(|source| NegotiationError::Send {
                event: "answer",
                source,
            })?;

        self.flush_outbound_candidates().await;
        Ok(())
    }

    async fn accept_answer(&mut self, answer: SessionDescription) -> Result<(), NegotiationError> {
        ensure_kind("answer", SdpKind::Answer, &answer)?;

        self.backend
            .set_remote_description(answer)
            .await
            .map_err(NegotiationError::SetRemoteDescription)?;
        self.remote_description_installed = true;
        self.transition(NegotiationState::Stable);
        self.replay_inbound_candidates().await;
        Ok(())
    }

    async fn attach_local_tracks(&mut self) -> Result<(), NegotiationError> {
        if self.tracks_attached {
            return Ok(());
        }
        for track in self.ctx.tracks() {
            self.backend
                .add_track(track.clone())
                .await
                .map_err(NegotiationError::AttachTrack)?;
        }
        self.tracks_attached = true;
        debug!(
            "Attached {} local tracks for {}",
            self.ctx.tracks().len(),
            self.remote_id
        );
        Ok(())
    }

    async fn replay_inbound_candidates(&mut self) {
        let pending = self.inbound_candidates.take_all();
        if pending.is_empty() {
            return;
        }
        debug!(
            "Replaying {} buffered candidates from {}",
            pending.len(),
            self.remote_id
        );
        for candidate in pending {
            self.install_candidate(candidate).await;
        }
    }

    async fn flush_outbound_candidates(&mut self) {
        for candidate in self.outbound_candidates.take_all() {
            self.send_candidate(candidate).await;
        }
    }

    /// One bad candidate never affects the others or the session state.
    async fn install_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.backend.add_candidate(candidate).await {
            warn!("Dropping candidate from {}: {}", self.remote_id, e);
        }
    }

    async fn send_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self
            .ctx
            .signaling()
            .send_ice(self.remote_id.clone(), candidate)
            .await
        {
            warn!("Failed to send candidate to {}: {}", self.remote_id, e);
        }
    }

    fn is_finished(&self, what: &str) -> bool {
        if self.state.is_terminal() {
            debug!(
                "Session with {} is {}, ignoring {}",
                self.remote_id, self.state, what
            );
            return true;
        }
        false
    }

    fn transition(&mut self, next: NegotiationState) {
        debug!("Session with {}: {} -> {}", self.remote_id, self.state, next);
        self.state = next;
        if !next.is_terminal() {
            self.last_error = None;
        }
        self.ctx.publish(SessionEvent::StateChanged {
            remote: self.remote_id.clone(),
            state: next,
        });
    }

    fn fail(&mut self, error: NegotiationError) {
        warn!(
            "Negotiation with {} stalled in {}: {}",
            self.remote_id, self.state, error
        );
        self.ctx.publish(SessionEvent::NegotiationFailed {
            remote: self.remote_id.clone(),
            state: self.state,
            reason: error.to_string(),
        });
        self.last_error = Some(error);
    }
}

fn ensure_kind(
    event: &'static str,
    expected: SdpKind,
    desc: &SessionDescription,
) -> Result<(), ValidationError> {
    if desc.kind != expected {
        return Err(ValidationError::DescriptionKindMismatch {
            event,
            found: desc.kind,
        });
    }
    Ok(())
}
