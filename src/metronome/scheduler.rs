// Beat scheduler - the repeating-tick state machine driving the metronome

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use ringbuf::traits::Producer;

use crate::messaging::channels::NotificationProducer;
use crate::messaging::notification::Notification;
use crate::metronome::PlaybackMode;
use crate::metronome::ramp::{RampPlan, TempoRamp};
use crate::metronome::shared::SharedBeatState;
use crate::metronome::tempo::{Tempo, TimeSignature};
use crate::sound::{SoundId, SoundPlayback};
use crate::timing::driver::CadenceDriver;
use crate::timing::timer::{RepeatingTimer, TimerError};

/// How long a previewed sound is held before being cut off
const PREVIEW_HOLD: Duration = Duration::from_secs(10);

/// Beat scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
}

/// The authoritative beat scheduler of one session
///
/// Owns the beat cursor, the repeating tick, and the progressive ramp
/// hook. Exactly one live timer handle exists while running; tempo changes
/// retune that handle in place instead of stopping and restarting, which
/// would drift and double-fire. All other collaborators observe the
/// session through [`SharedBeatState`] and the notification channel.
pub struct BeatScheduler {
    driver: CadenceDriver,
    preview_driver: CadenceDriver,
    state: SchedulerState,
    current_beat: u32,
    tempo: Tempo,
    time_signature: TimeSignature,
    mode: PlaybackMode,
    ramp: Option<TempoRamp>,
    sound: SoundId,
    playback: Arc<dyn SoundPlayback>,
    shared: Arc<SharedBeatState>,
    notifications: NotificationProducer,
    self_ref: Weak<Mutex<BeatScheduler>>,
}

impl BeatScheduler {
    pub(crate) fn new(
        timer: Arc<dyn RepeatingTimer>,
        playback: Arc<dyn SoundPlayback>,
        shared: Arc<SharedBeatState>,
        notifications: NotificationProducer,
    ) -> Arc<Mutex<Self>> {
        let core = Arc::new(Mutex::new(Self {
            driver: CadenceDriver::new(Arc::clone(&timer)),
            preview_driver: CadenceDriver::new(timer),
            state: SchedulerState::Stopped,
            current_beat: 0,
            tempo: Tempo::default(),
            time_signature: TimeSignature::default(),
            mode: PlaybackMode::Standard,
            ramp: None,
            sound: SoundId::default(),
            playback,
            shared,
            notifications,
            self_ref: Weak::new(),
        }));
        core.lock().self_ref = Arc::downgrade(&core);
        core
    }

    /// Start ticking at the current tempo; no-op while already running
    ///
    /// The beat cursor is not re-zeroed here: `stop` and mode switches
    /// already did, so the first tick emits beat 1 and the accented
    /// downbeat arrives on the wrap.
    pub(crate) fn start(&mut self) -> Result<(), TimerError> {
        if self.state == SchedulerState::Running {
            return Ok(());
        }
        self.preview_driver.disarm();
        self.arm_tick()?;
        self.state = SchedulerState::Running;
        self.shared.set_playing(true);
        Ok(())
    }

    /// Stop ticking, reset the beat cursor, halt the in-flight sound
    ///
    /// Effective regardless of prior state, including from within tick
    /// processing.
    pub(crate) fn stop(&mut self) {
        let was_running = self.state == SchedulerState::Running;
        self.driver.disarm();
        self.preview_driver.disarm();
        self.state = SchedulerState::Stopped;
        self.current_beat = 0;
        self.playback.stop();
        self.shared.set_playing(false);
        self.shared.set_current_beat(0);
        if was_running {
            self.notify(Notification::Stopped);
        }
    }

    /// Re-arm the repeating tick at the current tempo, preserving the cursor
    ///
    /// No-op while stopped. On arming failure the session is left cleanly
    /// stopped and the error propagates.
    pub(crate) fn retune(&mut self) -> Result<(), TimerError> {
        if self.state != SchedulerState::Running {
            return Ok(());
        }
        match self.arm_tick() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    /// Adopt `tempo` and retune a running cadence in place
    pub(crate) fn set_tempo(&mut self, tempo: Tempo) -> Result<(), TimerError> {
        self.tempo = tempo;
        self.shared.set_current_bpm(tempo.bpm());
        self.notify(Notification::TempoChanged { bpm: tempo.bpm() });
        self.retune()
    }

    pub(crate) fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub(crate) fn set_sound(&mut self, sound: SoundId) {
        self.sound = sound;
    }

    /// Switch playback mode
    ///
    /// Always stops a running cadence and rewinds the ramp to its initial
    /// BPM; entering progressive mode adopts that initial BPM as the
    /// session tempo.
    pub(crate) fn set_mode(&mut self, mode: PlaybackMode) {
        self.stop();
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.reset();
        }
        self.mode = mode;
        if mode == PlaybackMode::Progressive {
            if let Some(initial) = self.ramp.as_ref().map(|ramp| ramp.plan().initial_bpm()) {
                self.adopt_bpm(initial);
            }
        }
    }

    /// Install a fresh ramp; in progressive mode this restarts the session
    /// at the plan's initial BPM
    pub(crate) fn set_ramp_plan(&mut self, plan: RampPlan) {
        self.ramp = Some(TempoRamp::new(plan));
        if self.mode == PlaybackMode::Progressive {
            self.stop();
            self.adopt_bpm(plan.initial_bpm());
        }
    }

    /// Dispatch the selected sound once and cut it off after ten seconds
    pub(crate) fn preview_sound(&mut self) -> Result<(), TimerError> {
        self.playback.play(self.sound, false);
        let weak = self.self_ref.clone();
        self.preview_driver.arm(
            PREVIEW_HOLD,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    let mut scheduler = core.lock();
                    scheduler.preview_driver.disarm();
                    if scheduler.state != SchedulerState::Running {
                        scheduler.playback.stop();
                    }
                }
            }),
        )
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    fn arm_tick(&mut self) -> Result<(), TimerError> {
        let weak = self.self_ref.clone();
        self.driver.arm(
            self.tempo.interval(),
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    BeatScheduler::on_tick(&core);
                }
            }),
        )
    }

    /// One tick: advance the cursor, dispatch the sound, feed the ramp
    ///
    /// Ticks lock the core for their whole duration, so they serialize
    /// against each other and against facade calls; a handle disarmed
    /// while its firing was in flight is detected by the state check.
    fn on_tick(core: &Arc<Mutex<Self>>) {
        let mut scheduler = core.lock();
        if scheduler.state != SchedulerState::Running {
            return;
        }

        let beats = u32::from(scheduler.time_signature.beats_per_measure());
        let next_beat = (scheduler.current_beat + 1) % beats;
        let downbeat = next_beat == 0;

        scheduler.playback.play(scheduler.sound, downbeat);

        if downbeat && scheduler.mode == PlaybackMode::Progressive {
            scheduler.apply_ramp_step();
            if scheduler.state != SchedulerState::Running {
                // A failed mid-tick retune halted the session
                return;
            }
        }

        scheduler.current_beat = next_beat;
        scheduler.shared.set_current_beat(next_beat);
        scheduler.notify(Notification::Beat {
            index: next_beat,
            downbeat,
        });
    }

    /// Count the measure that just completed and apply any due ramp step
    /// before the next tick is scheduled
    fn apply_ramp_step(&mut self) {
        let was_complete = self.ramp.as_ref().is_some_and(|ramp| ramp.is_complete());
        let stepped = self.ramp.as_mut().and_then(|ramp| ramp.on_measure_complete());

        if let Some(bpm) = stepped {
            self.adopt_bpm(bpm);
            self.notify(Notification::TempoChanged { bpm });
            if let Err(e) = self.retune() {
                log::error!("Tempo ramp retune failed, playback halted: {e}");
                return;
            }
        }

        let now_complete = self.ramp.as_ref().is_some_and(|ramp| ramp.is_complete());
        if now_complete && !was_complete {
            if let Some(target) = self.ramp.as_ref().map(|ramp| ramp.plan().target_bpm()) {
                self.notify(Notification::RampCompleted { target_bpm: target });
            }
        }
    }

    // Ramp plans only carry validated positive tempos, so the conversion
    // cannot fail; an invalid value is dropped rather than adopted.
    fn adopt_bpm(&mut self, bpm: f64) {
        if let Ok(tempo) = Tempo::new(bpm) {
            self.tempo = tempo;
            self.shared.set_current_bpm(bpm);
        }
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.try_push(notification).is_err() {
            log::warn!("Notification buffer full, event dropped");
        }
    }
}
