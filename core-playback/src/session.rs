//! # Remote Session Reporting
//!
//! A playback session is the server-side record of one continuous listening
//! run. It is opened the first time a stream is started, survives track
//! switches and network recovery, and is closed by a full stop.
//!
//! Pause, resume, seek and stop notifications are best effort. They are queued
//! to a worker task and executed in submission order so the server never sees
//! a pause overtake the resume that preceded it. Failures are logged and
//! surfaced as [`SessionEvent::NotificationFailed`]; they never abort a local
//! transport change.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{RemoteSessionClient, SessionToken};
use core_library::TrackId;
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Server session bound to the current listening run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    token: SessionToken,
    track_id: TrackId,
    position: Option<Duration>,
}

impl PlaybackSession {
    pub fn new(token: SessionToken, track_id: TrackId) -> Self {
        Self {
            token,
            track_id,
            position: None,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Track the session last reported.
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Position the session was last resumed or started from.
    pub fn position(&self) -> Option<Duration> {
        self.position
    }

    pub(crate) fn moved_to(&mut self, track_id: TrackId, position: Option<Duration>) {
        self.track_id = track_id;
        self.position = position;
    }
}

/// Notifications sent to an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    Resume,
    Pause,
    Seek,
    Stop,
}

impl SessionOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionOperation::Resume => "resume",
            SessionOperation::Pause => "pause",
            SessionOperation::Seek => "seek",
            SessionOperation::Stop => "stop",
        }
    }
}

enum Notice {
    Report {
        operation: SessionOperation,
        token: SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    },
    Flush(oneshot::Sender<()>),
}

/// Ordered, fire-and-forget sender of session notifications.
///
/// Must be created inside a tokio runtime. The worker exits once every
/// reporter handle is dropped.
#[derive(Clone)]
pub struct SessionReporter {
    tx: mpsc::UnboundedSender<Notice>,
}

impl SessionReporter {
    pub fn spawn(client: Arc<dyn RemoteSessionClient>, events: EventBus) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(client, events, rx));
        Self { tx }
    }

    pub fn resume(&self, token: &SessionToken, track_id: TrackId, position: Option<Duration>) {
        self.submit(SessionOperation::Resume, token, track_id, position);
    }

    pub fn pause(&self, token: &SessionToken, track_id: TrackId, position: Option<Duration>) {
        self.submit(SessionOperation::Pause, token, track_id, position);
    }

    pub fn seek(&self, token: &SessionToken, track_id: TrackId, position: Option<Duration>) {
        self.submit(SessionOperation::Seek, token, track_id, position);
    }

    pub fn stop(&self, token: &SessionToken, track_id: TrackId) {
        self.submit(SessionOperation::Stop, token, track_id, None);
    }

    /// Wait until every notification submitted so far has been executed.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Notice::Flush(done_tx)).is_ok() {
            done_rx.await.ok();
        }
    }

    fn submit(
        &self,
        operation: SessionOperation,
        token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) {
        let notice = Notice::Report {
            operation,
            token: token.clone(),
            track_id,
            position,
        };
        if self.tx.send(notice).is_err() {
            warn!(operation = operation.as_str(), "Session reporter has shut down");
        }
    }
}

impl std::fmt::Debug for SessionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionReporter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

async fn run_worker(
    client: Arc<dyn RemoteSessionClient>,
    events: EventBus,
    mut rx: mpsc::UnboundedReceiver<Notice>,
) {
    while let Some(notice) = rx.recv().await {
        let (operation, token, track_id, position) = match notice {
            Notice::Report {
                operation,
                token,
                track_id,
                position,
            } => (operation, token, track_id, position),
            Notice::Flush(done) => {
                done.send(()).ok();
                continue;
            }
        };

        let result = match operation {
            SessionOperation::Resume => client.resume_session(&token, track_id, position).await,
            SessionOperation::Pause => client.pause_session(&token, track_id, position).await,
            SessionOperation::Seek => client.seek_session(&token, track_id, position).await,
            SessionOperation::Stop => client.stop_session(&token, track_id).await,
        };

        match result {
            Ok(()) => debug!(operation = operation.as_str(), %track_id, "Session notified"),
            Err(err) => {
                warn!(
                    operation = operation.as_str(),
                    %track_id,
                    error = %err,
                    "Session notification failed"
                );
                events
                    .emit(CoreEvent::Session(SessionEvent::NotificationFailed {
                        operation: operation.as_str().to_string(),
                        track_id,
                        message: err.to_string(),
                    }))
                    .ok();
            }
        }
    }

    debug!("Session reporter stopped");
}
