//! Bomb Fuse Scheduler
//!
//! A fuse is a one-shot timer that feeds a message back into the host's
//! command queue. Fuses are never cancelled; the engine rejects stale bombs.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delivers messages to a queue after a fixed delay.
///
/// Holds only a weak handle to the queue so pending fuses never keep a
/// stopped host alive.
#[derive(Debug, Clone)]
pub struct FuseScheduler<T> {
    fuse: Duration,
    queue: mpsc::WeakSender<T>,
}

impl<T: Send + 'static> FuseScheduler<T> {
    /// Scheduler for `queue` with the given delay.
    pub fn new(fuse: Duration, queue: &mpsc::Sender<T>) -> Self {
        Self {
            fuse,
            queue: queue.downgrade(),
        }
    }

    /// Configured delay.
    pub fn fuse(&self) -> Duration {
        self.fuse
    }

    /// Send `message` once the fuse burns down.
    pub fn schedule(&self, message: T) -> JoinHandle<()> {
        let fuse = self.fuse;
        let queue = self.queue.clone();

        tokio::spawn(async move {
            tokio::time::sleep(fuse).await;

            let Some(queue) = queue.upgrade() else {
                warn!("Fuse fired after the host queue closed");
                return;
            };
            if queue.send(message).await.is_err() {
                warn!("Fuse fired after the host queue closed");
            } else {
                debug!("Fuse fired after {:?}", fuse);
            }
        })
    }
}
