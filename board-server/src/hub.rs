//! Broadcast Hub
//!
//! Owns the last known snapshot and the registry of live viewer
//! connections, and fans each ingested `DiffBatch` out to every connected
//! viewer. A single mutex around the hub state serializes `ingest` against
//! itself and against `connect`/`disconnect`; combined with the FIFO
//! per-viewer queues this is the ordering guarantee that keeps every
//! viewer's room table consistent.
//!
//! Delivery is non-blocking: each viewer has a bounded queue, and a viewer
//! whose queue is full is disconnected rather than allowed to slow down
//! ingestion or other viewers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::diff;
use crate::models::{DiffBatch, Snapshot};

/// Lifecycle state of one viewer connection.
///
/// `Connecting` only persists while no snapshot has ever been ingested;
/// the first ingested batch doubles as the viewer's bootstrap and moves it
/// to `Synced`. Disconnection is terminal and modeled by removal from the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewerState {
    Connecting,
    Synced,
}

struct Viewer {
    state: ViewerState,
    tx: mpsc::Sender<Arc<DiffBatch>>,
}

struct HubState {
    current: Option<Snapshot>,
    viewers: HashMap<Uuid, Viewer>,
}

/// Receive side of one viewer's outbound queue.
///
/// The transport task (e.g. the WebSocket handler) drains `rx` and writes
/// each batch to the wire. `rx` yielding `None` means the hub dropped the
/// viewer, typically for falling behind.
pub struct ViewerHandle {
    pub id: Uuid,
    pub rx: mpsc::Receiver<Arc<DiffBatch>>,
}

pub struct BroadcastHub {
    state: Mutex<HubState>,
    queue_capacity: usize,
}

impl BroadcastHub {
    /// Create a hub with the given per-viewer queue capacity.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState {
                current: None,
                viewers: HashMap::new(),
            }),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Ingest one diff batch: advance the held snapshot to
    /// `batch.new_version` and enqueue the batch to every live viewer.
    ///
    /// Callers must submit batches in the order they were produced; the
    /// internal mutex guarantees no two ingests interleave. Viewers that
    /// connected before the first snapshot receive this batch as their
    /// bootstrap and transition to `Synced`.
    pub async fn ingest(&self, batch: DiffBatch) {
        let mut state = self.state.lock().await;

        let mut entries = state
            .current
            .as_ref()
            .map(|s| s.entries.clone())
            .unwrap_or_default();
        diff::apply(&mut entries, &batch.changes);
        state.current = Some(Snapshot {
            version: batch.new_version,
            captured_at: Utc::now(),
            entries,
        });

        let batch = Arc::new(batch);
        let is_bootstrap = batch.base_version.is_none();
        let mut dropped = Vec::new();
        for (id, viewer) in state.viewers.iter_mut() {
            // A delta only goes to synced viewers; a viewer still pending
            // syncs on a bootstrap batch.
            if viewer.state == ViewerState::Connecting && !is_bootstrap {
                continue;
            }
            match viewer.tx.try_send(Arc::clone(&batch)) {
                Ok(()) => viewer.state = ViewerState::Synced,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(viewer = %id, "viewer overloaded, disconnecting");
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(viewer = %id, "viewer queue closed, removing");
                    dropped.push(*id);
                }
            }
        }
        for id in dropped {
            state.viewers.remove(&id);
        }

        tracing::debug!(
            version = batch.new_version,
            changes = batch.changes.len(),
            viewers = state.viewers.len(),
            "batch ingested"
        );
    }

    /// Register a new viewer connection.
    ///
    /// If a snapshot has been ingested, the viewer immediately receives a
    /// synthetic full-state batch (`base_version = None`) and is `Synced`;
    /// otherwise it stays `Connecting` until the first ingest. Either way
    /// the viewer sees a self-consistent starting point without racing
    /// live updates.
    pub async fn connect(&self) -> ViewerHandle {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = Uuid::new_v4();

        let mut state = self.state.lock().await;
        let viewer_state = match &state.current {
            Some(current) => {
                let bootstrap = Arc::new(diff::diff(None, current));
                // The queue is empty and capacity is at least 1, so this
                // cannot fail.
                let _ = tx.try_send(bootstrap);
                ViewerState::Synced
            }
            None => ViewerState::Connecting,
        };
        state.viewers.insert(
            id,
            Viewer {
                state: viewer_state,
                tx,
            },
        );
        tracing::info!(viewer = %id, state = ?viewer_state, total = state.viewers.len(), "viewer connected");

        ViewerHandle { id, rx }
    }

    /// Remove a viewer and drop its queue. Idempotent; unknown ids are a
    /// no-op.
    pub async fn disconnect(&self, id: Uuid) {
        let mut state = self.state.lock().await;
        if state.viewers.remove(&id).is_some() {
            tracing::info!(viewer = %id, remaining = state.viewers.len(), "viewer disconnected");
        }
    }

    /// Clone of the last known snapshot, if any.
    pub async fn current_snapshot(&self) -> Option<Snapshot> {
        self.state.lock().await.current.clone()
    }

    /// Number of live viewer connections.
    pub async fn viewer_count(&self) -> usize {
        self.state.lock().await.viewers.len()
    }
}
