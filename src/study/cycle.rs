// Study/pause cycle - countdown alternating study blocks and breaks

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use ringbuf::traits::Producer;

use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel,
};
use crate::messaging::notification::Notification;
use crate::timing::driver::CadenceDriver;
use crate::timing::timer::{RepeatingTimer, TimerError};

/// Cadence of the countdown
const SECOND: Duration = Duration::from_secs(1);

/// Channel capacity for study notifications
const NOTIFICATION_CAPACITY: usize = 32;

/// Phase of the study/pause cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyPhase {
    Studying,
    Break,
}

/// Outcome of one countdown second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyEvent {
    /// The countdown crossed into a new phase
    PhaseChanged(StudyPhase),
    /// The final study block ran out; the cycle is over
    Finished,
}

/// Study/pause countdown state machine
///
/// Runs `cycles` study blocks separated by breaks; the final study block
/// ends the cycle with no trailing break. Advanced externally at 1 Hz.
#[derive(Debug, Clone)]
pub struct StudyPauseCycle {
    study_secs: u32,
    pause_secs: u32,
    cycles: u32,
    current_cycle: u32,
    phase: StudyPhase,
    time_left: u32,
    finished: bool,
}

impl StudyPauseCycle {
    /// `study_minutes` per block, `pause_minutes` per break, `cycles`
    /// study blocks in total; each must be at least one
    pub fn new(study_minutes: u32, pause_minutes: u32, cycles: u32) -> Self {
        assert!(study_minutes >= 1, "Study duration must be at least one minute");
        assert!(pause_minutes >= 1, "Pause duration must be at least one minute");
        assert!(cycles >= 1, "Cycle count must be at least one");

        let study_secs = study_minutes * 60;
        Self {
            study_secs,
            pause_secs: pause_minutes * 60,
            cycles,
            current_cycle: 0,
            phase: StudyPhase::Studying,
            time_left: study_secs,
            finished: false,
        }
    }

    /// Advance the countdown by one second
    pub fn tick_second(&mut self) -> Option<StudyEvent> {
        if self.finished {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return None;
        }

        match self.phase {
            StudyPhase::Studying => {
                // The last study block ends the cycle without a break
                if self.current_cycle + 1 >= self.cycles {
                    self.finished = true;
                    Some(StudyEvent::Finished)
                } else {
                    self.phase = StudyPhase::Break;
                    self.time_left = self.pause_secs;
                    Some(StudyEvent::PhaseChanged(StudyPhase::Break))
                }
            }
            StudyPhase::Break => {
                self.current_cycle += 1;
                self.phase = StudyPhase::Studying;
                self.time_left = self.study_secs;
                Some(StudyEvent::PhaseChanged(StudyPhase::Studying))
            }
        }
    }

    pub fn phase(&self) -> StudyPhase {
        self.phase
    }

    /// Seconds left in the current block
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Zero-based index of the current study cycle
    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Return to cycle zero, studying, with a full countdown
    pub fn reset(&mut self) {
        self.current_cycle = 0;
        self.phase = StudyPhase::Studying;
        self.time_left = self.study_secs;
        self.finished = false;
    }
}

/// Read-only snapshot of a running study session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudySnapshot {
    pub phase: StudyPhase,
    pub time_left: u32,
    pub current_cycle: u32,
    pub running: bool,
    pub finished: bool,
}

struct StudyCore {
    cycle: StudyPauseCycle,
    driver: CadenceDriver,
    running: bool,
    notifications: NotificationProducer,
    self_ref: Weak<Mutex<StudyCore>>,
}

impl StudyCore {
    fn arm_tick(&mut self) -> Result<(), TimerError> {
        let weak = self.self_ref.clone();
        self.driver.arm(
            SECOND,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    StudyCore::on_tick(&core);
                }
            }),
        )
    }

    fn on_tick(core: &Arc<Mutex<Self>>) {
        let mut study = core.lock();
        if !study.running {
            return;
        }
        if let Some(event) = study.cycle.tick_second() {
            match event {
                StudyEvent::PhaseChanged(phase) => {
                    let cycle = study.cycle.current_cycle();
                    study.notify(Notification::StudyPhaseChanged { phase, cycle });
                }
                StudyEvent::Finished => {
                    study.running = false;
                    study.driver.disarm();
                    study.notify(Notification::StudyCycleFinished);
                }
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.try_push(notification).is_err() {
            log::warn!("Study notification buffer full, event dropped");
        }
    }
}

/// Study/pause timer widget driver
///
/// Wraps [`StudyPauseCycle`] with a one-second cadence on the shared timer
/// capability. Pausing keeps the countdown position; `reset` stops the
/// cadence and restores the initial snapshot.
pub struct StudySession {
    core: Arc<Mutex<StudyCore>>,
    consumer: Option<NotificationConsumer>,
}

impl StudySession {
    pub fn new(timer: Arc<dyn RepeatingTimer>, cycle: StudyPauseCycle) -> Self {
        let (producer, consumer) = create_notification_channel(NOTIFICATION_CAPACITY);
        let core = Arc::new(Mutex::new(StudyCore {
            cycle,
            driver: CadenceDriver::new(timer),
            running: false,
            notifications: producer,
            self_ref: Weak::new(),
        }));
        core.lock().self_ref = Arc::downgrade(&core);
        Self {
            core,
            consumer: Some(consumer),
        }
    }

    /// Take the notification consumer; `None` after the first call
    pub fn take_notifications(&mut self) -> Option<NotificationConsumer> {
        self.consumer.take()
    }

    /// Replace the countdown configuration; stops any running cadence
    pub fn configure(&self, cycle: StudyPauseCycle) {
        let mut core = self.core.lock();
        core.driver.disarm();
        core.running = false;
        core.cycle = cycle;
    }

    /// Start or resume the countdown; no-op while running or finished
    pub fn start(&self) -> Result<(), TimerError> {
        let mut core = self.core.lock();
        if core.running || core.cycle.is_finished() {
            return Ok(());
        }
        core.arm_tick()?;
        core.running = true;
        Ok(())
    }

    /// Pause the countdown, keeping its position
    pub fn pause(&self) {
        let mut core = self.core.lock();
        core.driver.disarm();
        core.running = false;
    }

    /// Stop and restore the initial snapshot
    pub fn reset(&self) {
        let mut core = self.core.lock();
        core.driver.disarm();
        core.running = false;
        core.cycle.reset();
    }

    pub fn snapshot(&self) -> StudySnapshot {
        let core = self.core.lock();
        StudySnapshot {
            phase: core.cycle.phase(),
            time_left: core.cycle.time_left(),
            current_cycle: core.cycle.current_cycle(),
            running: core.running,
            finished: core.cycle.is_finished(),
        }
    }
}
