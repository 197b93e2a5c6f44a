use super::config::CoordinatorConfig;
use super::events::{ControlMessage, CoordinatorEvent, CoordinatorHandle, ToggleOutcome, Transition};
use super::state::{ClosingRelay, CoordinatorState, CoordinatorStatus, Session, SessionPhase};
use crate::error::{PipelineError, Result};
use crate::messages::{ChunkMessage, OffscreenCommand, OverlayCommand, UiMessage};
use crate::platform::Platform;
use crate::recorder::{
    OffscreenDocument, OffscreenHandle, OffscreenRecorder, OffscreenRegistry, RecorderEvent,
    OFFSCREEN_DOCUMENT_ID,
};
use crate::relay::{RelayEvent, RelayEventKind, CLOSE_GRACE};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Single authority for the recording session lifecycle
///
/// Owns the relay connection and mediates between the UI toggle, the
/// offscreen recorder and the relay. Events are handled one at a time; a
/// toggle that arrives while a start or stop is in flight is rejected.
pub struct RecordingCoordinator {
    config: CoordinatorConfig,
    platform: Platform,
    registry: Arc<OffscreenRegistry>,
    state: CoordinatorState,
    next_generation: u64,

    control_tx: mpsc::Sender<ControlMessage>,
    control_rx: mpsc::Receiver<ControlMessage>,
    recorder_tx: mpsc::Sender<RecorderEvent>,
    recorder_rx: mpsc::Receiver<RecorderEvent>,
    relay_tx: mpsc::Sender<RelayEvent>,
    relay_rx: mpsc::Receiver<RelayEvent>,

    status_tx: watch::Sender<CoordinatorStatus>,
}

impl RecordingCoordinator {
    pub fn new(config: CoordinatorConfig, platform: Platform) -> Self {
        let depth = config.event_queue_depth.max(1);
        let (control_tx, control_rx) = mpsc::channel(depth);
        let (recorder_tx, recorder_rx) = mpsc::channel(depth);
        let (relay_tx, relay_rx) = mpsc::channel(depth);

        let state = CoordinatorState::default();
        let (status_tx, _) = watch::channel(state.snapshot());

        info!("Recording coordinator created (relay: {})", config.relay_url);

        Self {
            config,
            platform,
            registry: Arc::new(OffscreenRegistry::new()),
            state,
            next_generation: 0,
            control_tx,
            control_rx,
            recorder_tx,
            recorder_rx,
            relay_tx,
            relay_rx,
            status_tx,
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.control_tx.clone(), self.status_tx.subscribe())
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.status_tx.borrow().clone()
    }

    pub fn registry(&self) -> Arc<OffscreenRegistry> {
        Arc::clone(&self.registry)
    }

    /// Process events until shutdown
    pub async fn run(mut self) {
        info!("Coordinator event loop started");

        while let Some(event) = self.next_event().await {
            if matches!(event, CoordinatorEvent::Control(ControlMessage::Shutdown)) {
                info!("Shutdown requested");
                break;
            }
            self.handle_event(event).await;
        }

        self.shutdown().await;
        info!("Coordinator event loop stopped");
    }

    /// Wait for the next event from any source
    pub async fn next_event(&mut self) -> Option<CoordinatorEvent> {
        tokio::select! {
            biased;

            Some(event) = self.recorder_rx.recv() => Some(CoordinatorEvent::Recorder(event)),
            Some(event) = self.relay_rx.recv() => Some(CoordinatorEvent::Relay(event)),
            Some(message) = self.control_rx.recv() => Some(CoordinatorEvent::Control(message)),
            else => None,
        }
    }

    pub async fn handle_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::Control(message) => match message {
                ControlMessage::Ui(UiMessage::ToggleEcho) => {
                    let outcome = self.toggle_recording().await;
                    debug!("Toggle outcome: {:?}", outcome);
                }
                ControlMessage::StopTimeout { session_id } => {
                    self.handle_stop_timeout(session_id).await;
                }
                ControlMessage::Shutdown => self.shutdown().await,
            },
            CoordinatorEvent::Recorder(event) => self.handle_recorder_event(event).await,
            CoordinatorEvent::Relay(event) => self.handle_relay_event(event).await,
        }
    }

    /// Stop if a session is active, start otherwise
    pub async fn toggle_recording(&mut self) -> ToggleOutcome {
        if self.state.transitioning {
            warn!("Toggle rejected: {:?} in progress", self.state.phase);
            return ToggleOutcome::Busy;
        }

        if self.state.is_active() {
            match self.stop_recording().await {
                Ok(Transition::Requested) => ToggleOutcome::Stopping,
                Ok(Transition::Ignored) => ToggleOutcome::Busy,
                Err(e) => ToggleOutcome::Failed(e),
            }
        } else {
            match self.start_recording().await {
                Ok(Transition::Requested) => ToggleOutcome::Starting,
                Ok(Transition::Ignored) => ToggleOutcome::Busy,
                Err(e) => ToggleOutcome::Failed(e),
            }
        }
    }

    /// Begin a session: relay, capture handle, recorder, start command
    ///
    /// The session turns active once the recorder reports it started.
    pub async fn start_recording(&mut self) -> Result<Transition> {
        if self.state.transitioning || self.state.phase != SessionPhase::Idle {
            debug!("start_recording ignored in {:?}", self.state.phase);
            return Ok(Transition::Ignored);
        }

        let session_id = Uuid::new_v4();
        info!("Starting recording session {}", session_id);

        self.state.phase = SessionPhase::Starting;
        self.state.transitioning = true;
        self.state.last_error = None;
        self.publish();

        if let Err(error) = self.begin_session(session_id).await {
            self.abort_start(error.clone()).await;
            return Err(error);
        }

        self.publish();
        Ok(Transition::Requested)
    }

    /// Ask the recorder to stop; the session ends when it confirms
    pub async fn stop_recording(&mut self) -> Result<Transition> {
        if self.state.transitioning || self.state.phase != SessionPhase::Active {
            debug!("stop_recording ignored in {:?}", self.state.phase);
            return Ok(Transition::Ignored);
        }

        let Some(session) = self.state.session.as_mut() else {
            return Ok(Transition::Ignored);
        };
        session.active = false;
        let session_id = session.id;

        info!("Stopping recording session {}", session_id);

        self.state.phase = SessionPhase::Stopping;
        self.state.transitioning = true;
        self.publish();

        let dispatched = match self.registry.get(OFFSCREEN_DOCUMENT_ID).await {
            Some(recorder) => recorder.dispatch(OffscreenCommand::stop(Some(session_id))).await,
            None => Err(PipelineError::RecorderUnavailable {
                reason: "no offscreen document".to_string(),
            }),
        };

        if let Err(error) = dispatched {
            self.finish_session(Some(error.clone())).await;
            return Err(error);
        }

        self.arm_stop_timeout(session_id);
        Ok(Transition::Requested)
    }

    pub async fn handle_recorder_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Started { session_id } => {
                if self.state.phase != SessionPhase::Starting
                    || self.state.session_id() != Some(session_id)
                {
                    warn!("Recorder started unexpected session {}, stopping it", session_id);
                    self.dispatch_stop_for(Some(session_id)).await;
                    return;
                }

                if let Some(session) = self.state.session.as_mut() {
                    session.active = true;
                }
                self.state.phase = SessionPhase::Active;
                self.state.transitioning = false;
                self.publish();

                info!("Recording session {} active", session_id);
            }
            RecorderEvent::Chunk(chunk) => self.forward_chunk(chunk).await,
            RecorderEvent::Stopped(summary) => {
                if self.state.phase == SessionPhase::Stopping
                    && self.state.session_id() == Some(summary.session_id)
                {
                    info!(
                        "Recorder confirmed stop of {} ({} chunks, {} bytes)",
                        summary.session_id, summary.chunks, summary.bytes
                    );
                    self.finish_session(None).await;
                } else {
                    debug!("Ignoring stop confirmation for {}", summary.session_id);
                }
            }
            RecorderEvent::Failed {
                command,
                session_id,
                error,
            } => {
                if session_id.is_none() || session_id != self.state.session_id() {
                    debug!(
                        "Ignoring {:?} failure for session {:?}: {}",
                        command, session_id, error
                    );
                    return;
                }

                match self.state.phase {
                    SessionPhase::Starting => self.abort_start(error).await,
                    SessionPhase::Stopping => self.finish_session(Some(error)).await,
                    phase => warn!("Recorder {:?} failed while {:?}: {}", command, phase, error),
                }
            }
        }
    }

    /// Forward a chunk if the relay is open; otherwise drop it
    pub async fn forward_chunk(&mut self, chunk: ChunkMessage) {
        let sequence = chunk.sequence;
        let len = chunk.data.len();

        if chunk.data.is_empty() {
            debug!("Chunk {} is empty, nothing to forward", sequence);
            return;
        }

        if self.state.session_id() != Some(chunk.session_id) {
            warn!(
                "Dropping chunk {} of ended session {} ({} bytes)",
                sequence, chunk.session_id, len
            );
            self.state.chunks_dropped += 1;
            self.publish();
            return;
        }

        match self.state.relay.as_mut() {
            Some(relay) if relay.is_open() => match relay.send(chunk.data).await {
                Ok(()) => {
                    debug!("Forwarded chunk {} ({} bytes)", sequence, len);
                    self.state.chunks_forwarded += 1;
                }
                Err(e) => {
                    warn!("Dropping chunk {} ({} bytes): {}", sequence, len, e);
                    self.state.chunks_dropped += 1;
                }
            },
            _ => {
                warn!("Relay not open, dropping chunk {} ({} bytes)", sequence, len);
                self.state.chunks_dropped += 1;
            }
        }

        self.publish();
    }

    pub async fn handle_relay_event(&mut self, event: RelayEvent) {
        let current = self.state.relay.as_ref().map(|r| r.generation());
        if current != Some(event.generation) {
            self.handle_closing_relay_event(event).await;
            return;
        }

        match event.kind {
            RelayEventKind::Reply(text) => self.deliver_reply(text).await,
            RelayEventKind::Closed => self.handle_relay_loss(PipelineError::RelayClosed).await,
            RelayEventKind::Error(reason) => {
                self.handle_relay_loss(PipelineError::RelayTransport { reason })
                    .await
            }
        }
    }

    /// Replies still in flight on a connection we closed are delivered until
    /// its reader finishes or the close grace period runs out
    async fn handle_closing_relay_event(&mut self, event: RelayEvent) {
        let closing = self
            .state
            .closing_relay
            .filter(|c| c.generation == event.generation && Instant::now() < c.deadline);

        if closing.is_none() {
            debug!("Ignoring event from relay connection {}", event.generation);
            return;
        }

        match event.kind {
            RelayEventKind::Reply(text) => self.deliver_reply(text).await,
            kind => {
                debug!("Closed relay connection {} finished: {:?}", event.generation, kind);
                self.state.closing_relay = None;
            }
        }
    }

    async fn begin_session(&mut self, session_id: Uuid) -> Result<()> {
        self.ensure_relay().await?;

        let tab = self.platform.tabs.active_tab().await?;
        let capture_handle = self.platform.tabs.capture_handle(tab).await?;
        debug!("Resolved capture handle {} for {}", capture_handle, tab);

        let registry = Arc::clone(&self.registry);
        let recorder = registry
            .ensure(OFFSCREEN_DOCUMENT_ID, self.recorder_factory())
            .await;

        self.state.session = Some(Session {
            id: session_id,
            target_tab: tab,
            capture_handle: capture_handle.clone(),
            active: false,
            started_at: Utc::now(),
        });

        recorder
            .dispatch(OffscreenCommand::start(capture_handle, session_id))
            .await
    }

    async fn ensure_relay(&mut self) -> Result<()> {
        if self.state.relay.as_ref().is_some_and(|r| r.is_open()) {
            return Ok(());
        }

        if let Some(mut stale) = self.state.relay.take() {
            stale.close().await;
        }

        self.next_generation += 1;
        let generation = self.next_generation;

        self.state.relay_connecting = true;
        self.publish();

        let result = self
            .platform
            .relay
            .connect(&self.config.relay_url, generation, self.relay_tx.clone())
            .await;

        self.state.relay_connecting = false;
        self.state.relay = Some(result?);
        self.publish();

        Ok(())
    }

    fn recorder_factory(&self) -> impl FnOnce() -> OffscreenHandle + Send + 'static {
        let media = Arc::clone(&self.platform.media);
        let playback = Arc::clone(&self.platform.playback);
        let events = self.recorder_tx.clone();
        let frame_bytes = self.config.frame_bytes;
        let queue_depth = self.config.command_queue_depth;

        move || {
            let recorder = OffscreenRecorder::new(media, playback, events, frame_bytes);
            OffscreenDocument::spawn(OFFSCREEN_DOCUMENT_ID, recorder, queue_depth)
        }
    }

    fn arm_stop_timeout(&self, session_id: Uuid) {
        let control = self.control_tx.clone();
        let timeout = self.config.stop_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = control.send(ControlMessage::StopTimeout { session_id }).await;
        });
    }

    async fn handle_stop_timeout(&mut self, session_id: Uuid) {
        if self.state.phase == SessionPhase::Stopping && self.state.session_id() == Some(session_id) {
            let timeout_ms = self.config.stop_timeout.as_millis() as u64;
            self.finish_session(Some(PipelineError::StopTimedOut { timeout_ms }))
                .await;
        }
    }

    /// The active tab is resolved at delivery time, not taken from the session
    async fn deliver_reply(&mut self, text: String) {
        let tab = match self.platform.tabs.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                warn!("No tab to deliver relay reply to: {}", e);
                return;
            }
        };

        if let Some(session) = &self.state.session {
            if session.target_tab != tab {
                debug!(
                    "Reply for session on {} delivered to active {}",
                    session.target_tab, tab
                );
            }
        }

        let message = OverlayCommand::FromBackground { payload: text };
        if let Err(e) = self.platform.messenger.send_to_tab(tab, message).await {
            warn!("Failed to deliver relay reply to {}: {}", tab, e);
        }
    }

    async fn handle_relay_loss(&mut self, error: PipelineError) {
        warn!("Relay connection lost: {}", error);

        // Reset the reference so the next start reconnects
        self.state.relay = None;

        match self.state.phase {
            SessionPhase::Idle => {
                self.publish();
            }
            SessionPhase::Starting | SessionPhase::Active => {
                self.dispatch_stop().await;
                self.finish_session(Some(error)).await;
            }
            SessionPhase::Stopping => {
                self.finish_session(Some(error)).await;
            }
        }
    }

    /// Best-effort stop for a session being torn down
    async fn dispatch_stop(&mut self) {
        self.dispatch_stop_for(self.state.session_id()).await;
    }

    async fn dispatch_stop_for(&self, session_id: Option<Uuid>) {
        if let Some(recorder) = self.registry.get(OFFSCREEN_DOCUMENT_ID).await {
            if let Err(e) = recorder.dispatch(OffscreenCommand::stop(session_id)).await {
                warn!("Could not stop recorder: {}", e);
            }
        }
    }

    async fn abort_start(&mut self, error: PipelineError) {
        error!("Failed to start recording: {}", error);

        self.release_relay().await;
        self.state.session = None;
        self.state.phase = SessionPhase::Idle;
        self.state.transitioning = false;
        self.state.last_error = Some(error);
        self.publish();
    }

    async fn finish_session(&mut self, error: Option<PipelineError>) {
        self.release_relay().await;

        if let Some(session) = self.state.session.take() {
            info!("Recording session {} ended", session.id);
        }

        self.state.phase = SessionPhase::Idle;
        self.state.transitioning = false;

        if let Some(error) = error {
            error!("Recording session failed: {}", error);
            self.state.last_error = Some(error);
        }

        self.publish();
    }

    async fn release_relay(&mut self) {
        if let Some(mut relay) = self.state.relay.take() {
            relay.close().await;
            self.state.closing_relay = Some(ClosingRelay {
                generation: relay.generation(),
                deadline: Instant::now() + CLOSE_GRACE,
            });
        }
        self.state.relay_connecting = false;
    }

    async fn shutdown(&mut self) {
        if self.state.session.is_some() {
            self.dispatch_stop().await;
            self.finish_session(None).await;
        } else {
            self.release_relay().await;
        }
        self.registry.close(OFFSCREEN_DOCUMENT_ID).await;
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.state.snapshot());
    }
}
