use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{local_flip_time_now, ScannedRecord, SessionId, VialStatus},
    protocol::{FlipAck, FlipRequest, LabelBatchRequest, PortInfo, ScanEvent},
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod cart;
mod http_backend;
mod push_channel;

pub use cart::Cart;
pub use http_backend::HttpBackend;

/// Inbound scan events buffered while a reconciliation is in flight. Sends
/// block when full, so bursts are delayed rather than dropped.
const SCAN_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum StartScanError {
    #[error("a scan session is already active")]
    AlreadyActive,
    #[error("scan port unavailable: {0}")]
    PortUnavailable(String),
    #[error("failed to reach the scan backend: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum StopScanError {
    #[error("failed to reach the scan backend: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum FlipCommitError {
    #[error("no record is currently displayed")]
    NoRecordDisplayed,
    #[error("failed to reach the flip backend: {0}")]
    Transport(String),
    #[error("flip commit rejected: {0}")]
    Rejected(String),
}

/// Hardware scan backend boundary: port enumeration and the start/stop pair
/// for a listening session. Scan results arrive separately over the push
/// channel.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    async fn list_ports(&self) -> Result<Vec<PortInfo>>;
    async fn start_scan(&self, port_index: usize) -> Result<SessionId, StartScanError>;
    async fn stop_scan(&self, session_id: SessionId) -> Result<(), StopScanError>;
}

/// Persistence backend boundary for flip commits.
#[async_trait]
pub trait FlipBackend: Send + Sync {
    async fn commit_flip(&self, request: &FlipRequest) -> Result<FlipAck, FlipCommitError>;
}

/// Label document generation over a cart batch.
#[async_trait]
pub trait LabelBackend: Send + Sync {
    async fn generate_labels(&self, request: &LabelBatchRequest) -> Result<Vec<u8>>;
}

pub struct MissingScanBackend;

#[async_trait]
impl ScanBackend for MissingScanBackend {
    async fn list_ports(&self) -> Result<Vec<PortInfo>> {
        Err(anyhow!("scan backend is unavailable"))
    }

    async fn start_scan(&self, _port_index: usize) -> Result<SessionId, StartScanError> {
        Err(StartScanError::Transport(
            "scan backend is unavailable".into(),
        ))
    }

    async fn stop_scan(&self, _session_id: SessionId) -> Result<(), StopScanError> {
        Err(StopScanError::Transport(
            "scan backend is unavailable".into(),
        ))
    }
}

pub struct MissingFlipBackend;

#[async_trait]
impl FlipBackend for MissingFlipBackend {
    async fn commit_flip(&self, _request: &FlipRequest) -> Result<FlipAck, FlipCommitError> {
        Err(FlipCommitError::Transport(
            "flip backend is unavailable".into(),
        ))
    }
}

pub struct MissingLabelBackend;

#[async_trait]
impl LabelBackend for MissingLabelBackend {
    async fn generate_labels(&self, _request: &LabelBatchRequest) -> Result<Vec<u8>> {
        Err(anyhow!("label backend is unavailable"))
    }
}

/// Operator-editable flip form fields for the record on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFields {
    pub status: VialStatus,
    pub flip_time: String,
    pub comment: String,
}

impl EditFields {
    /// Form defaults for a freshly displayed record: status radio preset to
    /// the record's stored status, flip time preset to now, comment empty.
    fn for_record(record: &ScannedRecord) -> Self {
        Self {
            status: record.status(),
            flip_time: local_flip_time_now(),
            comment: String::new(),
        }
    }
}

/// What the detail view shows. `Idle` is the hidden/cleared form.
#[derive(Debug, Clone)]
pub enum DisplayState {
    Idle,
    Displaying {
        record: ScannedRecord,
        edit: EditFields,
    },
}

/// Notifications for whatever frontend is attached. Lossy for subscribers
/// that fall behind; state accessors remain authoritative.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionStarted(SessionId),
    SessionStopped,
    RecordDisplayed(ScannedRecord),
    DisplayCleared,
    FlipCommitted { unique_id: String },
    FlipCommitFailed { unique_id: String, reason: String },
    ScanNotRecognized,
}

struct ClientState {
    session: Option<SessionId>,
    display: DisplayState,
    tearing_down: bool,
}

/// Scan/flip session coordinator. Owns the displayed record, the in-progress
/// edit fields, and the active session handle; nothing else mutates them.
///
/// Inbound scan events are reconciled strictly in arrival order by a single
/// drain task: the displaced record's flip is committed (and awaited) before
/// the new record becomes visible.
pub struct ScanClient {
    scan: Arc<dyn ScanBackend>,
    flip: Arc<dyn FlipBackend>,
    inner: Mutex<ClientState>,
    events: broadcast::Sender<ClientEvent>,
    queue_tx: mpsc::Sender<ScanEvent>,
}

impl ScanClient {
    pub fn new(scan: Arc<dyn ScanBackend>, flip: Arc<dyn FlipBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let (queue_tx, queue_rx) = mpsc::channel(SCAN_QUEUE_DEPTH);
        let client = Arc::new(Self {
            scan,
            flip,
            inner: Mutex::new(ClientState {
                session: None,
                display: DisplayState::Idle,
                tearing_down: false,
            }),
            events,
            queue_tx,
        });
        client.spawn_reconcile_task(queue_rx);
        client
    }

    fn spawn_reconcile_task(self: &Arc<Self>, mut queue_rx: mpsc::Receiver<ScanEvent>) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            // Single consumer: one event is reconciled to completion, its
            // awaited flip commit included, before the next is dequeued.
            while let Some(event) = queue_rx.recv().await {
                client.reconcile(event).await;
            }
        });
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn list_ports(&self) -> Result<Vec<PortInfo>> {
        self.scan.list_ports().await
    }

    pub async fn display(&self) -> DisplayState {
        self.inner.lock().await.display.clone()
    }

    pub async fn active_session(&self) -> Option<SessionId> {
        self.inner.lock().await.session
    }

    /// Start a hardware scan session on the chosen port. Rejected locally,
    /// without contacting the backend, when a session is already active.
    pub async fn start_session(&self, port_index: usize) -> Result<SessionId, StartScanError> {
        let mut guard = self.inner.lock().await;
        if guard.session.is_some() {
            return Err(StartScanError::AlreadyActive);
        }

        let session_id = self.scan.start_scan(port_index).await?;
        guard.session = Some(session_id);
        drop(guard);

        info!(session_id = session_id.0, port_index, "scan session started");
        let _ = self.events.send(ClientEvent::SessionStarted(session_id));
        Ok(session_id)
    }

    /// Enqueue an inbound scan-push event for reconciliation.
    pub async fn push_event(&self, event: ScanEvent) {
        if self.queue_tx.send(event).await.is_err() {
            warn!("scan event dropped: reconciler task is gone");
        }
    }

    async fn reconcile(&self, event: ScanEvent) {
        let record = match event {
            ScanEvent::StockScanned(stock) => ScannedRecord::Stock(stock),
            ScanEvent::CrossScanned(cross) => ScannedRecord::Cross(cross),
            ScanEvent::NotRecognized => {
                // The displayed record and any in-progress edits stay as
                // they are.
                let _ = self.events.send(ClientEvent::ScanNotRecognized);
                return;
            }
        };

        let mut guard = self.inner.lock().await;
        // Commit the displaced record's flip before the new one is shown. A
        // failed commit is reported through the event stream but does not
        // hold back the incoming record.
        if !matches!(guard.display, DisplayState::Idle) {
            let _ = self.flip_displayed(&guard).await;
        }
        guard.display = DisplayState::Displaying {
            edit: EditFields::for_record(&record),
            record: record.clone(),
        };
        drop(guard);

        let _ = self.events.send(ClientEvent::RecordDisplayed(record));
    }

    /// Commit a flip for whatever is currently displayed, with the
    /// operator's in-progress edits. Emits exactly one FlipCommitted or
    /// FlipCommitFailed per attempt; display state is left untouched.
    async fn flip_displayed(&self, state: &ClientState) -> Result<(), FlipCommitError> {
        let request = match &state.display {
            DisplayState::Idle => return Err(FlipCommitError::NoRecordDisplayed),
            DisplayState::Displaying { record, edit } => build_flip_request(record, edit),
        };
        let unique_id = request.unique_id.clone();

        match self.flip.commit_flip(&request).await {
            Ok(ack) => {
                debug!(unique_id = %unique_id, "flip committed: {}", ack.message);
                let _ = self.events.send(ClientEvent::FlipCommitted { unique_id });
                Ok(())
            }
            Err(err) => {
                let _ = self.events.send(ClientEvent::FlipCommitFailed {
                    unique_id,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Flip button: commit the displayed record, then clear and hide the
    /// form. On failure the display and edits stay put so the operator can
    /// retry.
    pub async fn flip_now(&self) -> Result<(), FlipCommitError> {
        let mut guard = self.inner.lock().await;
        self.flip_displayed(&guard).await?;
        guard.display = DisplayState::Idle;
        drop(guard);

        let _ = self.events.send(ClientEvent::DisplayCleared);
        Ok(())
    }

    /// Cancel button: local-only reset of the display and edit fields. No
    /// flip is committed and the backend is not contacted.
    pub async fn cancel_edit(&self) {
        let mut guard = self.inner.lock().await;
        if matches!(guard.display, DisplayState::Idle) {
            return;
        }
        guard.display = DisplayState::Idle;
        drop(guard);

        let _ = self.events.send(ClientEvent::DisplayCleared);
    }

    pub async fn set_status(&self, status: VialStatus) {
        let mut guard = self.inner.lock().await;
        if let DisplayState::Displaying { edit, .. } = &mut guard.display {
            edit.status = status;
        }
    }

    pub async fn set_flip_time(&self, flip_time: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        if let DisplayState::Displaying { edit, .. } = &mut guard.display {
            edit.flip_time = flip_time.into();
        }
    }

    pub async fn set_comment(&self, comment: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        if let DisplayState::Displaying { edit, .. } = &mut guard.display {
            edit.comment = comment.into();
        }
    }

    /// Stop-scanning / unload path: drain the pending flip, clear the view,
    /// stop the active session. Safe to invoke repeatedly; the in-progress
    /// flag and the idled state keep a stop racing an unload from
    /// double-submitting the same flip.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if guard.tearing_down {
            return;
        }
        guard.tearing_down = true;

        if !matches!(guard.display, DisplayState::Idle) {
            // Best-effort: a failed commit is reported through the event
            // stream and teardown continues.
            let _ = self.flip_displayed(&guard).await;
            guard.display = DisplayState::Idle;
            let _ = self.events.send(ClientEvent::DisplayCleared);
        }

        if let Some(session_id) = guard.session.take() {
            // Fire-and-forget: the stopped notification always goes out so
            // the frontend never sticks in a scanning state.
            if let Err(err) = self.scan.stop_scan(session_id).await {
                warn!(session_id = session_id.0, "stop scan request failed: {err}");
            }
            let _ = self.events.send(ClientEvent::SessionStopped);
        }

        guard.tearing_down = false;
    }

    /// Teardown without awaiting completion, for termination paths that
    /// cannot block on asynchronous work. Best-effort by nature.
    pub fn spawn_shutdown(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.shutdown().await })
    }
}

fn build_flip_request(record: &ScannedRecord, edit: &EditFields) -> FlipRequest {
    FlipRequest {
        unique_id: record.unique_id().to_owned(),
        status: edit.status,
        flip_time: edit.flip_time.clone(),
        comment: (!edit.comment.is_empty()).then(|| edit.comment.clone()),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/cart_tests.rs"]
mod cart_tests;
