//! Debounced pushes to the remote tier.
//!
//! ```text
//! schedule(A) ──┐
//! schedule(B) ──┼── quiet window restarts on every snapshot ──► push(C)
//! schedule(C) ──┘
//! ```
//!
//! Only the newest snapshot is pushed. Stopping (or dropping) the debouncer
//! discards a pending push.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{SyncEvent, SyncStatus};
use super::remote::RemoteSync;
use crate::types::TimezoneEntry;

/// Default capacity for the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Owner of the background push task
pub struct Debouncer {
    snapshot_tx: mpsc::UnboundedSender<Vec<TimezoneEntry>>,
    event_tx: broadcast::Sender<SyncEvent>,
    status: Arc<Mutex<SyncStatus>>,
    quiet_period: Duration,
    task_handle: JoinHandle<()>,
}

impl Debouncer {
    /// Spawn the push task on the current tokio runtime
    pub fn start(remote: Arc<dyn RemoteSync>, quiet_period: Duration) -> Self {
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let status = Arc::new(Mutex::new(SyncStatus::Idle));

        let task_handle = tokio::spawn(Self::push_task(
            snapshot_rx,
            remote,
            quiet_period,
            event_tx.clone(),
            status.clone(),
        ));

        debug!(?quiet_period, "Debouncer started");

        Self {
            snapshot_tx,
            event_tx,
            status,
            quiet_period,
            task_handle,
        }
    }

    /// Queue a snapshot; restarts the quiet window
    pub fn schedule(&self, snapshot: Vec<TimezoneEntry>) {
        // Send before marking Pending so the task never sees Pending without
        // the snapshot queued
        if self.snapshot_tx.send(snapshot).is_err() {
            warn!("Debouncer task is gone, dropping snapshot");
            return;
        }
        *self.status.lock() = SyncStatus::Pending;
    }

    /// Subscribe to sync events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Publish an event on behalf of the owner (initial fetch and seed)
    pub(crate) fn emit(&self, event: SyncEvent) {
        if let SyncEvent::Failed { message } = &event {
            *self.status.lock() = SyncStatus::Error(message.clone());
        }
        let _ = self.event_tx.send(event);
    }

    /// Cancel the task, discarding any pending push
    pub fn stop(self) {
        drop(self);
    }

    async fn push_task(
        mut snapshot_rx: mpsc::UnboundedReceiver<Vec<TimezoneEntry>>,
        remote: Arc<dyn RemoteSync>,
        quiet_period: Duration,
        event_tx: broadcast::Sender<SyncEvent>,
        status: Arc<Mutex<SyncStatus>>,
    ) {
        while let Some(mut latest) = snapshot_rx.recv().await {
            // Wait for a quiet window, replacing the snapshot on every new edit
            loop {
                tokio::select! {
                    next = snapshot_rx.recv() => match next {
                        Some(snapshot) => latest = snapshot,
                        None => {
                            debug!("Debouncer channel closed with a pending push");
                            return;
                        }
                    },
                    _ = tokio::time::sleep(quiet_period) => break,
                }
            }

            let count = latest.len();
            let result = remote.push(&latest).await;

            // A snapshot queued during the push keeps the status Pending
            {
                let mut status = status.lock();
                if snapshot_rx.is_empty() {
                    *status = match &result {
                        Ok(()) => SyncStatus::Idle,
                        Err(e) => SyncStatus::Error(e.to_string()),
                    };
                }
            }

            match result {
                Ok(()) => {
                    info!(count, "Pushed timezones to remote");
                    let _ = event_tx.send(SyncEvent::Pushed { count });
                }
                Err(e) => {
                    // No retry: the next edit schedules a fresh push
                    warn!(error = %e, "Remote push failed");
                    let _ = event_tx.send(SyncEvent::Failed {
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
