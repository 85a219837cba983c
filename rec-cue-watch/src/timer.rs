//! Single-deadline scheduler.
//!
//! Owners keep an explicit deadline and rearm by replacing it; one background
//! thread sleeps until the nearest deadline and runs the expiry callback with
//! no timer lock held. A fire that races with a rearm is harmless as long as
//! the callback re-checks its owner's own deadline.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// One-shot timer that can be rearmed any number of times.
///
/// Arming never blocks beyond a short lock; dropping the timer stops and joins
/// its thread (unless dropped from inside its own callback).
pub struct DeadlineTimer {
    shared: Arc<TimerShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl std::fmt::Debug for DeadlineTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineTimer")
            .field("deadline", &self.deadline())
            .finish_non_exhaustive()
    }
}

impl DeadlineTimer {
    /// Spawn the scheduler thread. `on_expire` runs each time an armed
    /// deadline passes without having been replaced or disarmed.
    pub fn spawn(
        name: &str,
        mut on_expire: impl FnMut() + Send + 'static,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(TimerShared::default());
        let worker = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = worker.state.lock();
                loop {
                    if state.shutdown {
                        break;
                    }
                    let deadline = state.deadline;
                    match deadline {
                        None => worker.wake.wait(&mut state),
                        Some(at) if Instant::now() >= at => {
                            state.deadline = None;
                            MutexGuard::unlocked(&mut state, &mut on_expire);
                        }
                        Some(at) => {
                            worker.wake.wait_until(&mut state, at);
                        }
                    }
                }
            })?;
        let thread_id = handle.thread().id();

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
            thread_id,
        })
    }

    /// Fire at `deadline`, replacing any pending deadline.
    pub fn arm_at(&self, deadline: Instant) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }
        state.deadline = Some(deadline);
        self.shared.wake.notify_one();
    }

    /// Fire `delay` from now, replacing any pending deadline.
    pub fn arm_after(&self, delay: Duration) {
        self.arm_at(Instant::now() + delay);
    }

    /// Cancel the pending deadline, if any.
    pub fn disarm(&self) {
        let mut state = self.shared.state.lock();
        if state.deadline.take().is_some() {
            self.shared.wake.notify_one();
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.shared.state.lock().deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline().is_some()
    }

    /// Stop the scheduler thread. Idempotent; later arms are ignored.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.deadline = None;
            self.shared.wake.notify_one();
        }
        if std::thread::current().id() == self.thread_id {
            // Called from our own callback; the loop exits once it returns.
            return;
        }
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
