// Metronome session - the authoritative facade UI collaborators talk to

use std::sync::Arc;

use parking_lot::Mutex;

use crate::messaging::channels::{NotificationConsumer, create_notification_channel};
use crate::metronome::scheduler::BeatScheduler;
use crate::metronome::shared::SharedBeatState;
use crate::metronome::subdivision::{NoteValue, SubdivisionScheduler};
use crate::metronome::tap_tempo::TapTempo;
use crate::metronome::tempo::{Tempo, TimeSignature};
use crate::metronome::{MetronomeError, PlaybackMode};
use crate::metronome::ramp::RampPlan;
use crate::sound::{SoundId, SoundPlayback};
use crate::timing::clock::{Clock, SystemClock};
use crate::timing::timer::{RepeatingTimer, ThreadTimer};

/// Default session tempo
const DEFAULT_BPM: f64 = 60.0;

/// Notification channel capacity; overflow drops events with a warning
const NOTIFICATION_CAPACITY: usize = 256;

/// One metronome session
///
/// The single owner of playback state: every UI collaborator writes
/// through this facade and reads back through the lock-free observables
/// ([`SharedBeatState`]) or the notification channel. The beat scheduler
/// and the subdivision scheduler each own their repeating tick; this
/// facade keeps their tempo and lifecycle in step.
pub struct Metronome {
    scheduler: Arc<Mutex<BeatScheduler>>,
    subdivision: SubdivisionScheduler,
    tap: TapTempo,
    clock: Arc<dyn Clock>,
    shared: Arc<SharedBeatState>,
    notifications: Option<NotificationConsumer>,
}

impl Metronome {
    /// Create a session over the given timer, playback, and clock
    /// capabilities
    pub fn new(
        timer: Arc<dyn RepeatingTimer>,
        playback: Arc<dyn SoundPlayback>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let shared = SharedBeatState::new(DEFAULT_BPM);
        let (producer, consumer) = create_notification_channel(NOTIFICATION_CAPACITY);
        let scheduler = BeatScheduler::new(
            Arc::clone(&timer),
            playback,
            Arc::clone(&shared),
            producer,
        );
        let subdivision = SubdivisionScheduler::new(timer, Arc::clone(&shared));

        Self {
            scheduler,
            subdivision,
            tap: TapTempo::new(),
            clock,
            shared,
            notifications: Some(consumer),
        }
    }

    /// Create a session on spawned-thread timers and the system clock
    pub fn threaded(playback: Arc<dyn SoundPlayback>) -> Self {
        Self::new(
            Arc::new(ThreadTimer::new()),
            playback,
            Arc::new(SystemClock::new()),
        )
    }

    /// Take the notification consumer; `None` after the first call
    pub fn take_notifications(&mut self) -> Option<NotificationConsumer> {
        self.notifications.take()
    }

    /// Shared observable state, cheap to clone into UI collaborators
    pub fn shared(&self) -> Arc<SharedBeatState> {
        Arc::clone(&self.shared)
    }

    /// Set the tempo
    ///
    /// Rejects non-positive BPM, leaving the session untouched. A running
    /// cadence (beat and subdivision) retunes in place.
    pub fn set_bpm(&self, bpm: f64) -> Result<(), MetronomeError> {
        let tempo = Tempo::new(bpm)?;
        self.scheduler.lock().set_tempo(tempo)?;
        self.subdivision.set_tempo(tempo)?;
        Ok(())
    }

    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.scheduler.lock().set_time_signature(time_signature);
        self.subdivision.set_time_signature(time_signature);
    }

    /// Switch between standard and progressive playback
    ///
    /// Any running cadence stops and the ramp rewinds to its initial BPM.
    pub fn set_mode(&self, mode: PlaybackMode) {
        self.scheduler.lock().set_mode(mode);
        self.subdivision.stop();
    }

    /// Install a progressive ramp plan
    ///
    /// In progressive mode this restarts the session at the plan's initial
    /// BPM; in standard mode the plan waits for the next mode switch.
    pub fn set_ramp_plan(&self, plan: RampPlan) {
        let mut scheduler = self.scheduler.lock();
        scheduler.set_ramp_plan(plan);
        let progressive = scheduler.mode() == PlaybackMode::Progressive;
        drop(scheduler);
        if progressive {
            self.subdivision.stop();
        }
    }

    pub fn set_sound(&self, sound: SoundId) {
        self.scheduler.lock().set_sound(sound);
    }

    /// Select a beat sound by its UI name
    ///
    /// Unknown names are a warned no-op; the current selection stays.
    pub fn select_sound_by_name(&self, name: &str) {
        match SoundId::from_name(name) {
            Some(sound) => self.set_sound(sound),
            None => log::warn!("Unknown beat sound {name:?}, keeping the current selection"),
        }
    }

    /// Select the subdivision note value for the visual pulse
    pub fn set_note_value(&self, value: NoteValue) -> Result<(), MetronomeError> {
        self.subdivision.set_note_value(value)?;
        Ok(())
    }

    /// Register a tap at the session clock's current time
    pub fn register_tap(&mut self) -> Result<Option<f64>, MetronomeError> {
        self.register_tap_at(self.clock.now_ms())
    }

    /// Register a tap at an explicit timestamp
    ///
    /// Accepted estimates are applied to the tempo (retuning a running
    /// cadence); debounced or out-of-range taps return `Ok(None)` and the
    /// previous tempo stays in force.
    pub fn register_tap_at(&mut self, now_ms: u64) -> Result<Option<f64>, MetronomeError> {
        match self.tap.register(now_ms) {
            Some(bpm) => {
                self.set_bpm(bpm)?;
                Ok(Some(bpm))
            }
            None => Ok(None),
        }
    }

    /// Start playback; no-op while already playing
    pub fn start(&self) -> Result<(), MetronomeError> {
        self.scheduler.lock().start()?;
        if let Err(e) = self.subdivision.start() {
            self.scheduler.lock().stop();
            return Err(e.into());
        }
        Ok(())
    }

    /// Stop playback, reset the beat cursor, halt any in-flight sound
    pub fn stop(&self) {
        self.scheduler.lock().stop();
        self.subdivision.stop();
    }

    /// Re-arm running cadences at the current tempo, preserving the beat
    /// cursor; no-op while stopped
    pub fn retune(&self) -> Result<(), MetronomeError> {
        let mut scheduler = self.scheduler.lock();
        scheduler.retune()?;
        let tempo = scheduler.tempo();
        drop(scheduler);
        self.subdivision.set_tempo(tempo)?;
        Ok(())
    }

    /// Play the selected sound once, cut off after ten seconds
    pub fn preview_sound(&self) -> Result<(), MetronomeError> {
        self.scheduler.lock().preview_sound()?;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.shared.is_playing()
    }

    /// Current beat index in `[0, beats_per_measure)`
    pub fn current_beat(&self) -> u32 {
        self.shared.current_beat()
    }

    /// Current tempo in BPM, including progressive ramp steps
    pub fn current_bpm(&self) -> f64 {
        self.shared.current_bpm()
    }

    /// Active subdivision pulse index, -1 when no pulse is lit
    pub fn active_subdivision(&self) -> i32 {
        self.shared.active_subdivision()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.scheduler.lock().mode()
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.scheduler.lock().time_signature()
    }

    pub fn sound(&self) -> SoundId {
        self.scheduler.lock().sound()
    }

    pub fn note_value(&self) -> NoteValue {
        self.subdivision.note_value()
    }
}
