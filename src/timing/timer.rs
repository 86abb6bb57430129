// Repeating timer capability - wall-clock tick drivers for the schedulers

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

/// Timer errors
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("Failed to spawn timer thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Tick callback invoked once per armed interval
pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Handle to an armed repeating tick
///
/// Disarming is idempotent. Dropping the handle also disarms it, so no
/// timer can outlive the scheduler that armed it.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    /// Cancel the repeating tick
    pub fn disarm(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the tick has been cancelled
    pub fn is_disarmed(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Repeating-timer capability
///
/// The driver must fire the callback serially: two invocations of the same
/// tick never overlap, and no tick fires after its handle is disarmed and
/// the in-flight invocation (if any) has returned.
pub trait RepeatingTimer: Send + Sync {
    /// Arm `tick` to fire every `interval`
    ///
    /// Arming failures (host resource exhaustion) propagate to the caller.
    fn arm(&self, interval: Duration, tick: TickFn) -> Result<TimerHandle, TimerError>;
}

/// Thread-backed repeating timer
///
/// Each armed tick runs on its own named thread that sleeps for the
/// interval, checks the cancel flag, and fires. The flag is re-checked
/// after every sleep and every tick so a disarmed timer exits promptly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTimer;

impl ThreadTimer {
    pub fn new() -> Self {
        Self
    }
}

impl RepeatingTimer for ThreadTimer {
    fn arm(&self, interval: Duration, mut tick: TickFn) -> Result<TimerHandle, TimerError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::Builder::new()
            .name("cadence-timer".to_string())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    tick();
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                }
            })?;

        Ok(TimerHandle::new(cancelled))
    }
}

struct ManualEntry {
    interval: Duration,
    tick: Arc<Mutex<TickFn>>,
    cancelled: Arc<AtomicBool>,
}

/// Deterministic timer fired explicitly by the caller
///
/// Used by the test suites (and usable by headless hosts) to drive every
/// armed tick without waiting on wall-clock time. `fire` runs one round of
/// all live ticks in arming order; callbacks may arm or disarm timers
/// re-entrantly.
#[derive(Default)]
pub struct ManualTimer {
    armed: Mutex<Vec<ManualEntry>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one round of every live tick, in arming order
    pub fn fire(&self) {
        let snapshot: Vec<(Arc<Mutex<TickFn>>, Arc<AtomicBool>)> = {
            let mut armed = self.armed.lock();
            armed.retain(|entry| !entry.cancelled.load(Ordering::Acquire));
            armed
                .iter()
                .map(|entry| (Arc::clone(&entry.tick), Arc::clone(&entry.cancelled)))
                .collect()
        };

        // Callbacks run outside the list lock so they can re-arm; the
        // cancel flag is re-checked in case an earlier callback in this
        // round disarmed a later entry.
        for (tick, cancelled) in snapshot {
            if !cancelled.load(Ordering::Acquire) {
                let mut tick = tick.lock();
                (*tick)();
            }
        }
    }

    /// Fire `rounds` consecutive rounds
    pub fn fire_rounds(&self, rounds: usize) {
        for _ in 0..rounds {
            self.fire();
        }
    }

    /// Number of live (armed, not disarmed) ticks
    pub fn active_count(&self) -> usize {
        self.armed
            .lock()
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Intervals of the live ticks, in arming order
    pub fn active_intervals(&self) -> Vec<Duration> {
        self.armed
            .lock()
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::Acquire))
            .map(|entry| entry.interval)
            .collect()
    }
}

impl RepeatingTimer for ManualTimer {
    fn arm(&self, interval: Duration, tick: TickFn) -> Result<TimerHandle, TimerError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.armed.lock().push(ManualEntry {
            interval,
            tick: Arc::new(Mutex::new(tick)),
            cancelled: Arc::clone(&cancelled),
        });
        Ok(TimerHandle::new(cancelled))
    }
}
