//! Repeating tick that keeps the virtual clock moving.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::time_model::SharedTimeModel;

/// Owned handle to the tick task
///
/// The task stops when the handle is stopped or dropped, so a view that
/// starts a ticker cannot leak it.
pub struct Ticker {
    task_handle: JoinHandle<()>,
    base_time_rx: watch::Receiver<i64>,
}

impl Ticker {
    /// Spawn a task calling [`TimeModel::tick`](crate::TimeModel::tick) every `period`
    pub fn start(model: SharedTimeModel, period: Duration) -> Self {
        let (base_time_tx, base_time_rx) = watch::channel(model.read().base_time());

        let task_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let base_time = {
                    let mut model = model.write();
                    model.tick();
                    model.base_time()
                };
                if base_time_tx.send(base_time).is_err() {
                    // Every receiver is gone, including ours: the handle was dropped
                    break;
                }
            }
        });

        debug!(?period, "Ticker started");
        Self {
            task_handle,
            base_time_rx,
        }
    }

    /// Receiver notified with the virtual time after every tick
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.base_time_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Cancel the tick task
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task_handle.abort();
        debug!("Ticker stopped");
    }
}
