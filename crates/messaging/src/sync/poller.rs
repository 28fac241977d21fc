//! Cancellable fetch-on-interval primitive
//!
//! At most one job runs at a time. A tick or trigger that arrives while a
//! job is running sets a queued flag, and exactly one follow-up run starts
//! when the current one finishes. Dropping the poller aborts its task; a
//! blocking call already in flight keeps running but its result is never
//! applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct Poller {
    handle: JoinHandle<()>,
    nudge: Arc<Notify>,
}

impl Poller {
    /// Start polling. The first run happens immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let nudge = Arc::new(Notify::new());
        let notified = nudge.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = notified.notified() => {}
                }

                loop {
                    let run = job();
                    tokio::pin!(run);
                    let mut queued = false;
                    loop {
                        tokio::select! {
                            _ = &mut run => break,
                            _ = interval.tick() => queued = true,
                            _ = notified.notified() => queued = true,
                        }
                    }
                    if !queued {
                        break;
                    }
                }
            }
        });

        Self { handle, nudge }
    }

    /// Request an immediate out-of-cycle run
    pub fn trigger(&self) {
        self.nudge.notify_one();
    }

    /// Stop polling
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
