// Cadence driver - single live handle per scheduler, retune in place

use std::sync::Arc;
use std::time::Duration;

use crate::timing::timer::{RepeatingTimer, TickFn, TimerError, TimerHandle};

/// Owns the repeating tick of one scheduler
///
/// At most one handle is ever live: `arm` cancels the previous handle
/// before installing the replacement, so a burst of retunes leaves exactly
/// one repeating tick armed and none leaked.
pub struct CadenceDriver {
    timer: Arc<dyn RepeatingTimer>,
    handle: Option<TimerHandle>,
}

impl CadenceDriver {
    pub fn new(timer: Arc<dyn RepeatingTimer>) -> Self {
        Self {
            timer,
            handle: None,
        }
    }

    /// Arm `tick` at `interval`, replacing any live handle
    ///
    /// On failure the previous handle is already disarmed and the driver is
    /// left unarmed; the error propagates to the caller.
    pub fn arm(&mut self, interval: Duration, tick: TickFn) -> Result<(), TimerError> {
        self.disarm();
        self.handle = Some(self.timer.arm(interval, tick)?);
        Ok(())
    }

    /// Disarm the live handle, if any; idempotent
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disarm();
        }
    }

    /// Whether a tick is currently armed
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_disarmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::timer::ManualTimer;

    #[test]
    fn test_rearming_leaves_exactly_one_live_tick() {
        let timer = Arc::new(ManualTimer::new());
        let mut driver = CadenceDriver::new(Arc::clone(&timer) as Arc<dyn RepeatingTimer>);

        for retune in 1..=5u64 {
            driver
                .arm(Duration::from_millis(100 * retune), Box::new(|| {}))
                .unwrap();
            assert_eq!(timer.active_count(), 1);
        }
        assert_eq!(timer.active_intervals(), vec![Duration::from_millis(500)]);

        driver.disarm();
        assert_eq!(timer.active_count(), 0);
        assert!(!driver.is_armed());
    }

    #[test]
    fn test_disarm_without_handle_is_noop() {
        let timer = Arc::new(ManualTimer::new());
        let mut driver = CadenceDriver::new(timer as Arc<dyn RepeatingTimer>);

        driver.disarm();
        assert!(!driver.is_armed());
    }
}
