//! One client session.
//!
//! A `SessionRelay` owns everything a client can affect: its writer over the
//! shared transport, its flags and its recording session. Events are handled
//! strictly one at a time, so a bulk transfer holds the writer until it is
//! done and later events wait in the session's queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use oscrelay_transport::DatagramTransport;
use oscrelay_wire::{MessageWriter, TypedValue};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{CaptureMode, RelayConfig};
use crate::envelope::{ClientNotice, InboundEvent};
use crate::error::{RelayError, Result};
use crate::event::EventKind;
use crate::recording::{RecordingSession, RecordingState};
use crate::router::{self, ChannelTransfer, Route};
use crate::sample::{Channel, SampleBuffer};
use crate::stream::ChunkedStreamEncoder;

/// Per-session flags and recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_looping: bool,
    pub agent_paused: bool,
    pub recording: Option<RecordingSession>,
}

impl SessionState {
    pub fn recording_state(&self) -> RecordingState {
        self.recording
            .as_ref()
            .map_or(RecordingState::Idle, RecordingSession::state)
    }
}

/// Totals reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub events_handled: u64,
    pub messages_sent: u64,
}

pub struct SessionRelay<T> {
    id: String,
    config: Arc<RelayConfig>,
    writer: MessageWriter<T>,
    notices: mpsc::Sender<ClientNotice>,
    state: SessionState,
    events_handled: u64,
}

impl<T: DatagramTransport> SessionRelay<T> {
    pub fn new(
        id: impl Into<String>,
        transport: T,
        config: Arc<RelayConfig>,
        notices: mpsc::Sender<ClientNotice>,
    ) -> Self {
        let writer = MessageWriter::with_max_message_size(transport, config.max_message_size);
        Self {
            id: id.into(),
            config,
            writer,
            notices,
            state: SessionState::default(),
            events_handled: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn messages_sent(&self) -> u64 {
        self.writer.messages_sent()
    }

    /// Drive the session until the client goes away or `cancel` fires.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<InboundEvent>,
        cancel: CancellationToken,
    ) -> SessionSummary {
        info!(session = %self.id, "session started");

        loop {
            let deadline = self.state.recording.as_ref().and_then(|r| r.deadline());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = wait_until(deadline) => self.on_deadline().await,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    match self.handle(&event, &cancel).await {
                        Ok(Some(notice)) => self.notify(notice).await,
                        Ok(None) => {}
                        Err(RelayError::Cancelled) => break,
                        Err(err) => {
                            warn!(
                                session = %self.id,
                                event = %event.event,
                                kind = err.kind(),
                                error = %err,
                                "event rejected"
                            );
                            if let Some(id) = event.ack {
                                self.notify(ClientNotice::ack_error(id, &err)).await;
                            }
                        }
                    }
                }
            }
        }

        let summary = SessionSummary {
            id: self.id.clone(),
            events_handled: self.events_handled,
            messages_sent: self.writer.messages_sent(),
        };
        info!(
            session = %summary.id,
            events = summary.events_handled,
            messages = summary.messages_sent,
            "session ended"
        );
        summary
    }

    /// Handle one event. Returns the ack to send back, if one was asked for.
    pub async fn handle(
        &mut self,
        event: &InboundEvent,
        cancel: &CancellationToken,
    ) -> Result<Option<ClientNotice>> {
        self.events_handled += 1;
        match router::route(&event.event, &event.data)? {
            Route::Interactive { kind, message } => {
                self.writer.send(&message)?;
                self.observe(kind, message.args());
            }
            Route::Bulk(transfer) => self.transfer(&transfer, cancel).await?,
            Route::RecordStart => self.start_recording().await?,
            Route::RecordingCaptured { left, right } => {
                self.upload(&left, &right, cancel).await?
            }
        }
        Ok(event.ack.map(ClientNotice::ack_ok))
    }

    fn observe(&mut self, kind: EventKind, args: &[TypedValue]) {
        let flag = args.first().and_then(TypedValue::as_i32).map(|v| v != 0);
        match (kind, flag) {
            (EventKind::LoopToggle, Some(on)) => {
                self.state.is_looping = on;
                debug!(session = %self.id, is_looping = on, "loop flag updated");
            }
            (EventKind::PauseAgent, Some(paused)) => {
                self.state.agent_paused = paused;
                debug!(session = %self.id, agent_paused = paused, "agent pause flag updated");
            }
            _ => {}
        }
    }

    async fn transfer(
        &mut self,
        transfer: &ChannelTransfer,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut encoder = ChunkedStreamEncoder::new(&mut self.writer, &self.config.stream);
        let report = cancellable(
            cancel,
            encoder.stream(transfer.channel, transfer.start_index, &transfer.samples),
        )
        .await?;
        debug!(
            session = %self.id,
            channel = %report.channel,
            chunks = report.chunks_sent,
            "audio chunk relayed"
        );
        Ok(())
    }

    async fn start_recording(&mut self) -> Result<()> {
        let current = self.state.recording_state();
        if current.is_active() {
            debug!(session = %self.id, state = %current, "record-start ignored");
            return Ok(());
        }

        let mode = self.config.capture_mode;
        let message = match mode {
            CaptureMode::Server => router::record_in_host()?,
            CaptureMode::Client => router::clear_recording_buffer()?,
        };
        self.writer.send(&message)?;

        let session = RecordingSession::arm(
            mode,
            &self.config.capture,
            self.config.upload_timeout,
            Instant::now(),
        );
        self.state.recording = Some(session);
        info!(session = %self.id, capture = %mode, "recording armed");
        self.notify(ClientNotice::recording(RecordingState::Armed)).await;
        Ok(())
    }

    async fn on_deadline(&mut self) {
        let Some(recording) = self.state.recording.as_mut() else {
            return;
        };
        match recording.mode() {
            CaptureMode::Server => {
                if let Err(err) = recording.complete() {
                    warn!(session = %self.id, error = %err, "recording timer fired out of order");
                } else {
                    info!(session = %self.id, "host capture finished");
                    self.notify(ClientNotice::recording(RecordingState::Completed)).await;
                }
            }
            CaptureMode::Client => {
                warn!(session = %self.id, "no recording upload before timeout");
            }
        }
        self.reset_recording().await;
    }

    async fn upload(
        &mut self,
        left: &SampleBuffer,
        right: &SampleBuffer,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let ready = self.state.recording.as_ref().is_some_and(|r| {
            r.mode() == CaptureMode::Client && r.state() == RecordingState::Armed
        });
        if !ready {
            return Err(RelayError::InvalidRecordingState {
                state: self.state.recording_state(),
                action: "accept a recording upload",
            });
        }

        match self.stream_recording(left, right, cancel).await {
            Ok(()) => {
                self.reset_recording().await;
                Ok(())
            }
            Err(err) => {
                info!(session = %self.id, error = %err, "recording upload aborted");
                self.reset_recording().await;
                Err(err)
            }
        }
    }

    async fn stream_recording(
        &mut self,
        left: &SampleBuffer,
        right: &SampleBuffer,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.stream_channel(Channel::Left, left, cancel).await?;
        pause(cancel, self.config.channel_gap).await?;
        self.stream_channel(Channel::Right, right, cancel).await?;
        pause(cancel, self.config.completion_delay).await?;

        self.writer.send(&router::transmission_done(0)?)?;
        self.recording_mut()?.complete()?;
        info!(session = %self.id, "recording upload finished");
        self.notify(ClientNotice::recording(RecordingState::Completed)).await;
        Ok(())
    }

    async fn stream_channel(
        &mut self,
        channel: Channel,
        samples: &SampleBuffer,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.recording_mut()?.begin_channel(channel)?;
        self.notify(ClientNotice::recording(RecordingState::Streaming(channel)))
            .await;

        let mut encoder = ChunkedStreamEncoder::new(&mut self.writer, &self.config.stream);
        cancellable(cancel, encoder.stream(channel, 0, samples)).await?;
        Ok(())
    }

    fn recording_mut(&mut self) -> Result<&mut RecordingSession> {
        self.state
            .recording
            .as_mut()
            .ok_or(RelayError::InvalidRecordingState {
                state: RecordingState::Idle,
                action: "continue recording",
            })
    }

    async fn reset_recording(&mut self) {
        if self.state.recording.take().is_some() {
            self.notify(ClientNotice::recording(RecordingState::Idle)).await;
        }
    }

    async fn notify(&self, notice: ClientNotice) {
        if self.notices.send(notice).await.is_err() {
            debug!(session = %self.id, "client gone, notice dropped");
        }
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F, R>(cancel: &CancellationToken, fut: F) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        result = fut => result,
    }
}

/// Sleep for `delay` unless `cancel` fires first.
async fn pause(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
