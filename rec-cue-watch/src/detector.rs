//! Debounced recording-activity state machine.
//!
//! `Inactive` --pulse--> `Active` (emits `true`)
//! `Active` --pulse--> `Active` (deadline pushed out, no event)
//! `Active` --deadline passes--> `Inactive` (emits `false`)
//!
//! The deadline is an explicit value recomputed on every pulse; the scheduler
//! only wakes us up, and expiry re-checks the value under the state lock, so
//! a wake racing with a fresh pulse can't drop the state early.

use crate::error::WatchError;
use crate::timer::DeadlineTimer;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// Default inactivity timeout.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Consistent view of the detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub is_active: bool,
    pub last_pulse: Option<Instant>,
    /// When the detector will go inactive unless another pulse arrives.
    pub deadline: Option<Instant>,
}

#[derive(Debug, Default)]
struct ActivityState {
    is_active: bool,
    last_pulse: Option<Instant>,
    deadline: Option<Instant>,
    subscribers: Vec<Sender<bool>>,
}

impl ActivityState {
    /// Queue a transition for every live subscriber, dropping closed ones.
    ///
    /// Sent while the state lock is held so receivers always observe edges in
    /// the order they happened.
    fn publish(&mut self, active: bool) {
        self.subscribers.retain(|tx| tx.send(active).is_ok());
    }
}

#[derive(Debug)]
struct DetectorCore {
    state: Mutex<ActivityState>,
    timeout: Duration,
}

impl DetectorCore {
    fn on_deadline(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let deadline = state.deadline;
        match deadline {
            Some(at) if state.is_active && now >= at => {
                state.is_active = false;
                state.deadline = None;
                log::info!(
                    "Recording activity stopped ({:?} without writes)",
                    self.timeout
                );
                state.publish(false);
            }
            _ => log::trace!("Inactivity wake superseded by a newer pulse"),
        }
    }
}

/// Turns a stream of activity pulses into a stable active/inactive signal.
///
/// Cloning yields another handle to the same state machine.
#[derive(Debug, Clone)]
pub struct ActivityStateMachine {
    core: Arc<DetectorCore>,
    timer: Arc<DeadlineTimer>,
}

impl ActivityStateMachine {
    /// Create an inactive state machine with the given inactivity timeout.
    pub fn new(timeout: Duration) -> Result<Self, WatchError> {
        let core = Arc::new(DetectorCore {
            state: Mutex::new(ActivityState::default()),
            timeout,
        });
        let expiring = Arc::clone(&core);
        let timer = DeadlineTimer::spawn("rec-cue-inactivity", move || expiring.on_deadline())
            .map_err(|source| WatchError::Spawn {
                name: "rec-cue-inactivity",
                source,
            })?;
        Ok(Self {
            core,
            timer: Arc::new(timer),
        })
    }

    /// Record one activity pulse.
    pub fn on_pulse(&self) {
        let mut state = self.core.state.lock();
        let now = Instant::now();
        let deadline = now + self.core.timeout;
        state.last_pulse = Some(now);
        state.deadline = Some(deadline);
        if !state.is_active {
            state.is_active = true;
            log::info!("Recording activity started");
            state.publish(true);
        }
        self.timer.arm_at(deadline);
    }

    /// Receive every future transition (`true` = became active).
    pub fn subscribe(&self) -> Receiver<bool> {
        let (tx, rx) = channel();
        self.core.state.lock().subscribers.push(tx);
        rx
    }

    pub fn is_active(&self) -> bool {
        self.core.state.lock().is_active
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        let state = self.core.state.lock();
        ActivitySnapshot {
            is_active: state.is_active,
            last_pulse: state.last_pulse,
            deadline: state.deadline,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.core.timeout
    }

    /// Stop the deadline scheduler. The current state is kept but will no
    /// longer time out. Idempotent.
    pub fn dispose(&self) {
        self.timer.shutdown();
    }
}
