// Test doubles for the platform seams
//
// Each fake records what the pipeline did to it so tests can assert on
// dispatched commands, opened devices, forwarded frames and delivered
// overlay messages.

#![allow(dead_code)]

use echo_relay::audio::{AudioFrame, MediaDevices, PlaybackSink};
use echo_relay::coordinator::{
    CoordinatorConfig, CoordinatorStatus, RecordingCoordinator,
};
use echo_relay::error::{PipelineError, Result};
use echo_relay::messages::OverlayCommand;
use echo_relay::platform::{CaptureHandle, Platform, TabCapture, TabId, TabMessenger};
use echo_relay::relay::{
    OutboundFrame, RelayConnection, RelayConnector, RelayEvent, RelayEventKind,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const REPLY_TEXT: &str = "Processing audio...";

pub fn frame(samples: Vec<i16>) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }
}

/// Poll `check` until it holds or a second passes
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

/// Feed coordinator events until its status satisfies `predicate`
pub async fn drive_until<F>(coordinator: &mut RecordingCoordinator, mut predicate: F) -> CoordinatorStatus
where
    F: FnMut(&CoordinatorStatus) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);

    loop {
        let status = coordinator.status();
        if predicate(&status) {
            return status;
        }

        let event = tokio::time::timeout_at(deadline, coordinator.next_event())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting, last status: {:?}", status))
            .expect("coordinator channels closed");
        coordinator.handle_event(event).await;
    }
}

/// Active-tab query with switchable answers
#[derive(Default)]
pub struct FakeTabs {
    active: Mutex<Option<TabId>>,
    deny: AtomicBool,
    handles_issued: AtomicUsize,
}

impl FakeTabs {
    pub fn new(active: TabId) -> Self {
        Self {
            active: Mutex::new(Some(active)),
            ..Default::default()
        }
    }

    pub fn set_active(&self, tab: Option<TabId>) {
        *self.active.lock().unwrap() = tab;
    }

    pub fn deny_capture(&self) {
        self.deny.store(true, Ordering::SeqCst);
    }

    pub fn handles_issued(&self) -> usize {
        self.handles_issued.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TabCapture for FakeTabs {
    async fn active_tab(&self) -> Result<TabId> {
        self.active.lock().unwrap().ok_or(PipelineError::NoActiveTab)
    }

    async fn capture_handle(&self, tab: TabId) -> Result<CaptureHandle> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(PipelineError::CaptureDenied {
                tab_id: tab.0,
                reason: "permission dismissed".to_string(),
            });
        }
        let n = self.handles_issued.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureHandle::new(format!("stream-{}-{}", tab.0, n)))
    }
}

/// Media device whose frames are pushed by the test
#[derive(Default)]
pub struct FakeMedia {
    stream: Mutex<Option<mpsc::Sender<AudioFrame>>>,
    opened: Mutex<Vec<CaptureHandle>>,
    fail: AtomicBool,
    fail_next: AtomicUsize,
}

impl FakeMedia {
    pub fn failing() -> Self {
        let media = Self::default();
        media.fail.store(true, Ordering::SeqCst);
        media
    }

    /// The first `n` opens fail, later ones succeed
    pub fn failing_first(n: usize) -> Self {
        let media = Self::default();
        media.fail_next.store(n, Ordering::SeqCst);
        media
    }

    pub fn opens(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn opened(&self) -> Vec<CaptureHandle> {
        self.opened.lock().unwrap().clone()
    }

    /// Push a frame into the open stream
    pub async fn push(&self, frame: AudioFrame) {
        let tx = self.stream.lock().unwrap().clone().expect("no open stream");
        tx.send(frame).await.expect("stream released");
    }

    /// True once the recorder dropped the stream
    pub fn released(&self) -> bool {
        self.stream
            .lock()
            .unwrap()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }

    /// End the stream from the device side
    pub fn end_stream(&self) {
        self.stream.lock().unwrap().take();
    }
}

#[async_trait::async_trait]
impl MediaDevices for FakeMedia {
    async fn open(&self, handle: &CaptureHandle) -> Result<mpsc::Receiver<AudioFrame>> {
        let fail_next = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if fail_next || self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::DeviceUnavailable {
                reason: "device busy".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(16);
        *self.stream.lock().unwrap() = Some(tx);
        self.opened.lock().unwrap().push(handle.clone());
        Ok(rx)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Records every overlay message per tab
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(TabId, OverlayCommand)>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<(TabId, OverlayCommand)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TabMessenger for RecordingMessenger {
    async fn send_to_tab(&self, tab: TabId, message: OverlayCommand) -> Result<()> {
        self.sent.lock().unwrap().push((tab, message));
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingPlayback {
    frames: AtomicUsize,
}

impl CountingPlayback {
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl PlaybackSink for CountingPlayback {
    fn play(&self, _frame: &AudioFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

struct LoopbackLink {
    generation: u64,
    events: mpsc::Sender<RelayEvent>,
    sever: Option<oneshot::Sender<()>>,
}

/// In-process relay that answers every binary frame with [`REPLY_TEXT`]
#[derive(Default)]
pub struct LoopbackConnector {
    connects: AtomicUsize,
    refuse: AtomicBool,
    frames: Arc<Mutex<Vec<OutboundFrame>>>,
    writers: Arc<AtomicUsize>,
    link: Mutex<Option<LoopbackLink>>,
}

impl LoopbackConnector {
    pub fn refusing() -> Self {
        let connector = Self::default();
        connector.refuse.store(true, Ordering::SeqCst);
        connector
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Everything written by the coordinator, across connections
    pub fn frames(&self) -> Vec<OutboundFrame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn binary_frames(&self) -> Vec<Vec<u8>> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                OutboundFrame::Binary(data) => Some(data),
                OutboundFrame::Close => None,
            })
            .collect()
    }

    pub fn writer_running(&self) -> bool {
        self.writers.load(Ordering::SeqCst) > 0
    }

    /// Remote side closes the current connection
    pub async fn close_remote(&self) {
        let link = self.link.lock().unwrap().as_ref().map(|l| (l.generation, l.events.clone()));
        if let Some((generation, events)) = link {
            let _ = events
                .send(RelayEvent {
                    generation,
                    kind: RelayEventKind::Closed,
                })
                .await;
        }
    }

    /// Kill the writer without telling the coordinator
    pub fn sever(&self) {
        if let Some(link) = self.link.lock().unwrap().as_mut() {
            if let Some(tx) = link.sever.take() {
                let _ = tx.send(());
            }
        }
    }
}

#[async_trait::async_trait]
impl RelayConnector for LoopbackConnector {
    async fn connect(
        &self,
        url: &str,
        generation: u64,
        events: mpsc::Sender<RelayEvent>,
    ) -> Result<RelayConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if self.refuse.load(Ordering::SeqCst) {
            return Err(PipelineError::RelayConnect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let (tx, mut rx) = mpsc::channel::<OutboundFrame>(8);
        let (sever_tx, mut sever_rx) = oneshot::channel::<()>();
        let frames = Arc::clone(&self.frames);
        let replies = events.clone();
        let writers = Arc::clone(&self.writers);
        writers.fetch_add(1, Ordering::SeqCst);

        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut sever_rx => break,
                    frame = rx.recv() => match frame {
                        Some(frame) => {
                            let close = frame == OutboundFrame::Close;
                            frames.lock().unwrap().push(frame);
                            if close {
                                break;
                            }
                            let _ = replies
                                .send(RelayEvent {
                                    generation,
                                    kind: RelayEventKind::Reply(REPLY_TEXT.to_string()),
                                })
                                .await;
                        }
                        None => break,
                    },
                }
            }
            writers.fetch_sub(1, Ordering::SeqCst);
        });

        *self.link.lock().unwrap() = Some(LoopbackLink {
            generation,
            events,
            sever: Some(sever_tx),
        });

        Ok(RelayConnection::new(generation, tx, vec![writer]))
    }
}

/// All fakes wired into one platform
pub struct Harness {
    pub tabs: Arc<FakeTabs>,
    pub media: Arc<FakeMedia>,
    pub messenger: Arc<RecordingMessenger>,
    pub playback: Arc<CountingPlayback>,
    pub relay: Arc<LoopbackConnector>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeMedia::default(), LoopbackConnector::default())
    }

    pub fn with(media: FakeMedia, relay: LoopbackConnector) -> Self {
        Self {
            tabs: Arc::new(FakeTabs::new(TabId(7))),
            media: Arc::new(media),
            messenger: Arc::new(RecordingMessenger::default()),
            playback: Arc::new(CountingPlayback::default()),
            relay: Arc::new(relay),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform {
            tabs: self.tabs.clone(),
            messenger: self.messenger.clone(),
            media: self.media.clone(),
            playback: self.playback.clone(),
            relay: self.relay.clone(),
        }
    }

    /// Coordinator with 8-byte frames (4 mono samples)
    pub fn coordinator(&self) -> RecordingCoordinator {
        let config = CoordinatorConfig {
            frame_bytes: 8,
            ..CoordinatorConfig::default()
        };
        RecordingCoordinator::new(config, self.platform())
    }
}
