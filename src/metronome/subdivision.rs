// Rhythm subdivision - visual pulse scheduling at BPM x subdivision count

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::metronome::shared::SharedBeatState;
use crate::metronome::tempo::{Tempo, TimeSignature};
use crate::timing::driver::CadenceDriver;
use crate::timing::timer::{RepeatingTimer, TimerError};

/// Note value selecting how many visual pulses subdivide one beat
///
/// `Breve` and `Semibreve` carry special pulse policies (see
/// [`SubdivisionScheduler`]); every other value cycles through its pulse
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteValue {
    None,
    Breve,
    Semibreve,
    Minima,
    Tercina,
    Seminima,
    QuialteraUp,
    Sextina,
    QuialteraDown,
    Colcheia,
    Semicolcheia,
    Fusa,
    Semifusa,
}

impl NoteValue {
    /// Pulses per beat for this note value; 0 keeps the scheduler inactive
    pub fn subdivisions(&self) -> u32 {
        match self {
            NoteValue::None => 0,
            NoteValue::Breve | NoteValue::Semibreve => 1,
            NoteValue::Minima => 2,
            NoteValue::Tercina => 3,
            NoteValue::Seminima => 4,
            NoteValue::QuialteraUp => 5,
            NoteValue::Sextina => 6,
            NoteValue::QuialteraDown => 7,
            NoteValue::Colcheia => 8,
            NoteValue::Semicolcheia => 16,
            NoteValue::Fusa => 32,
            NoteValue::Semifusa => 64,
        }
    }

    /// Parse the selector name used by the UI; `None` for unknown values
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(NoteValue::None),
            "breve" => Some(NoteValue::Breve),
            "semibreve" => Some(NoteValue::Semibreve),
            "minima" => Some(NoteValue::Minima),
            "tercina" => Some(NoteValue::Tercina),
            "seminima" => Some(NoteValue::Seminima),
            "quialtera_up" => Some(NoteValue::QuialteraUp),
            "sextina" => Some(NoteValue::Sextina),
            "quialtera_down" => Some(NoteValue::QuialteraDown),
            "colcheia" => Some(NoteValue::Colcheia),
            "semicolcheia" => Some(NoteValue::Semicolcheia),
            "fusa" => Some(NoteValue::Fusa),
            "semifusa" => Some(NoteValue::Semifusa),
            _ => None,
        }
    }

    /// Selector name of this note value
    pub fn name(&self) -> &'static str {
        match self {
            NoteValue::None => "none",
            NoteValue::Breve => "breve",
            NoteValue::Semibreve => "semibreve",
            NoteValue::Minima => "minima",
            NoteValue::Tercina => "tercina",
            NoteValue::Seminima => "seminima",
            NoteValue::QuialteraUp => "quialtera_up",
            NoteValue::Sextina => "sextina",
            NoteValue::QuialteraDown => "quialtera_down",
            NoteValue::Colcheia => "colcheia",
            NoteValue::Semicolcheia => "semicolcheia",
            NoteValue::Fusa => "fusa",
            NoteValue::Semifusa => "semifusa",
        }
    }
}

impl Default for NoteValue {
    fn default() -> Self {
        NoteValue::Seminima
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

struct SubdivisionCore {
    driver: CadenceDriver,
    note_value: NoteValue,
    tempo: Tempo,
    time_signature: TimeSignature,
    counter: u32,
    running: bool,
    shared: Arc<SharedBeatState>,
    self_ref: Weak<Mutex<SubdivisionCore>>,
}

impl SubdivisionCore {
    /// Pulse interval at the current tempo; `None` when the note value
    /// carries no subdivisions
    fn interval(&self) -> Option<Duration> {
        let subdivisions = self.note_value.subdivisions();
        (subdivisions > 0).then(|| {
            Duration::from_secs_f64(self.tempo.interval_ms() / f64::from(subdivisions) / 1_000.0)
        })
    }

    fn arm_tick(&mut self) -> Result<(), TimerError> {
        match self.interval() {
            Some(interval) => {
                let weak = self.self_ref.clone();
                self.driver.arm(
                    interval,
                    Box::new(move || {
                        if let Some(core) = weak.upgrade() {
                            SubdivisionCore::on_tick(&core);
                        }
                    }),
                )
            }
            None => {
                self.driver.disarm();
                self.shared.set_active_subdivision(-1);
                Ok(())
            }
        }
    }

    fn on_tick(core: &Arc<Mutex<Self>>) {
        let mut sub = core.lock();
        if !sub.running {
            return;
        }
        sub.process_pulse();
        sub.follow_shared_tempo();
    }

    fn process_pulse(&mut self) {
        match self.note_value {
            NoteValue::None => {}
            NoteValue::Breve => {
                // Pinned: the single pulse stays lit, no cycling
                self.shared.set_active_subdivision(0);
            }
            NoteValue::Semibreve => {
                // Lights its pulse once per measure; the counter cycles
                // over beats, not subdivisions
                let index = if self.counter == 0 { 0 } else { -1 };
                self.shared.set_active_subdivision(index);
                self.counter =
                    (self.counter + 1) % u32::from(self.time_signature.beats_per_measure());
            }
            _ => {
                let subdivisions = self.note_value.subdivisions();
                self.shared.set_active_subdivision(self.counter as i32);
                self.counter = (self.counter + 1) % subdivisions;
            }
        }
    }

    /// Follow the published session BPM on the next natural tick
    ///
    /// Ramp steps retune the beat scheduler mid-measure; this scheduler
    /// reads the shared tempo each tick and re-arms itself when it moved.
    fn follow_shared_tempo(&mut self) {
        let bpm = self.shared.current_bpm();
        if bpm == self.tempo.bpm() {
            return;
        }
        if let Ok(tempo) = Tempo::new(bpm) {
            self.tempo = tempo;
            if let Err(e) = self.arm_tick() {
                log::error!("Subdivision retune failed, visual pulse halted: {e}");
                self.halt();
            }
        }
    }

    fn halt(&mut self) {
        self.driver.disarm();
        self.running = false;
        self.counter = 0;
        self.shared.set_active_subdivision(-1);
    }
}

/// Independent scheduler lighting subdivision pulses for visual feedback
///
/// Runs on its own timer at `BPM x subdivision count`, parameterized by
/// the same tempo and meter as the beat scheduler but never sharing its
/// handle. Stopping clears the timer and parks the pulse index at -1.
pub struct SubdivisionScheduler {
    core: Arc<Mutex<SubdivisionCore>>,
}

impl SubdivisionScheduler {
    pub fn new(timer: Arc<dyn RepeatingTimer>, shared: Arc<SharedBeatState>) -> Self {
        let tempo = match Tempo::new(shared.current_bpm()) {
            Ok(tempo) => tempo,
            Err(_) => Tempo::default(),
        };
        let core = Arc::new(Mutex::new(SubdivisionCore {
            driver: CadenceDriver::new(timer),
            note_value: NoteValue::default(),
            tempo,
            time_signature: TimeSignature::default(),
            counter: 0,
            running: false,
            shared,
            self_ref: Weak::new(),
        }));
        core.lock().self_ref = Arc::downgrade(&core);
        Self { core }
    }

    /// Start cycling pulses; with `NoteValue::None` no timer is armed and
    /// the index stays at -1
    pub fn start(&self) -> Result<(), TimerError> {
        let mut core = self.core.lock();
        if core.running {
            return Ok(());
        }
        core.counter = 0;
        // Adopt the published session tempo so the first cycle is already
        // in step with the beat cadence
        if let Ok(tempo) = Tempo::new(core.shared.current_bpm()) {
            core.tempo = tempo;
        }
        core.arm_tick()?;
        core.running = true;
        Ok(())
    }

    /// Clear the timer and reset the pulse index to -1
    pub fn stop(&self) {
        self.core.lock().halt();
    }

    /// Select a note value; a running scheduler re-arms at the new
    /// interval and restarts its pulse cycle
    pub fn set_note_value(&self, value: NoteValue) -> Result<(), TimerError> {
        let mut core = self.core.lock();
        core.note_value = value;
        core.counter = 0;
        if core.running { core.arm_tick() } else { Ok(()) }
    }

    /// Adopt a new tempo, retuning a running pulse cycle in place
    pub fn set_tempo(&self, tempo: Tempo) -> Result<(), TimerError> {
        let mut core = self.core.lock();
        core.tempo = tempo;
        if core.running { core.arm_tick() } else { Ok(()) }
    }

    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.core.lock().time_signature = time_signature;
    }

    pub fn note_value(&self) -> NoteValue {
        self.core.lock().note_value
    }

    pub fn is_running(&self) -> bool {
        self.core.lock().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::timer::ManualTimer;

    fn setup(note_value: NoteValue) -> (Arc<ManualTimer>, Arc<SharedBeatState>, SubdivisionScheduler) {
        let timer = Arc::new(ManualTimer::new());
        let shared = SharedBeatState::new(60.0);
        let scheduler = SubdivisionScheduler::new(
            Arc::clone(&timer) as Arc<dyn RepeatingTimer>,
            Arc::clone(&shared),
        );
        scheduler.set_note_value(note_value).unwrap();
        (timer, shared, scheduler)
    }

    #[test]
    fn test_subdivision_counts_match_catalog() {
        assert_eq!(NoteValue::None.subdivisions(), 0);
        assert_eq!(NoteValue::Breve.subdivisions(), 1);
        assert_eq!(NoteValue::Semibreve.subdivisions(), 1);
        assert_eq!(NoteValue::Minima.subdivisions(), 2);
        assert_eq!(NoteValue::Tercina.subdivisions(), 3);
        assert_eq!(NoteValue::Seminima.subdivisions(), 4);
        assert_eq!(NoteValue::QuialteraUp.subdivisions(), 5);
        assert_eq!(NoteValue::Sextina.subdivisions(), 6);
        assert_eq!(NoteValue::QuialteraDown.subdivisions(), 7);
        assert_eq!(NoteValue::Colcheia.subdivisions(), 8);
        assert_eq!(NoteValue::Semicolcheia.subdivisions(), 16);
        assert_eq!(NoteValue::Fusa.subdivisions(), 32);
        assert_eq!(NoteValue::Semifusa.subdivisions(), 64);
    }

    #[test]
    fn test_name_round_trip() {
        for value in [
            NoteValue::None,
            NoteValue::Breve,
            NoteValue::Semibreve,
            NoteValue::Minima,
            NoteValue::Tercina,
            NoteValue::Seminima,
            NoteValue::QuialteraUp,
            NoteValue::Sextina,
            NoteValue::QuialteraDown,
            NoteValue::Colcheia,
            NoteValue::Semicolcheia,
            NoteValue::Fusa,
            NoteValue::Semifusa,
        ] {
            assert_eq!(NoteValue::from_name(value.name()), Some(value));
        }
        assert_eq!(NoteValue::from_name("crotchet"), None);
    }

    #[test]
    fn test_seminima_cycles_four_pulses_at_250ms() {
        let (timer, shared, scheduler) = setup(NoteValue::Seminima);

        scheduler.start().unwrap();
        // 60 BPM / 4 subdivisions -> 250ms pulses
        assert_eq!(timer.active_intervals(), vec![Duration::from_millis(250)]);

        let mut indices = Vec::new();
        for _ in 0..6 {
            timer.fire();
            indices.push(shared.active_subdivision());
        }
        assert_eq!(indices, vec![0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_none_never_arms_a_timer() {
        let (timer, shared, scheduler) = setup(NoteValue::None);

        scheduler.start().unwrap();
        assert_eq!(timer.active_count(), 0);
        assert_eq!(shared.active_subdivision(), -1);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_breve_pins_first_pulse() {
        let (timer, shared, scheduler) = setup(NoteValue::Breve);

        scheduler.start().unwrap();
        for _ in 0..5 {
            timer.fire();
            assert_eq!(shared.active_subdivision(), 0);
        }
    }

    #[test]
    fn test_semibreve_lights_once_per_measure() {
        let (timer, shared, scheduler) = setup(NoteValue::Semibreve);

        scheduler.start().unwrap();
        let mut indices = Vec::new();
        for _ in 0..9 {
            timer.fire();
            indices.push(shared.active_subdivision());
        }
        // 4/4 measure: first subdivision tick lights pulse 0, the rest of
        // the measure stays dark
        assert_eq!(indices, vec![0, -1, -1, -1, 0, -1, -1, -1, 0]);
    }

    #[test]
    fn test_stop_clears_timer_and_index() {
        let (timer, shared, scheduler) = setup(NoteValue::Seminima);

        scheduler.start().unwrap();
        timer.fire_rounds(3);
        assert_eq!(shared.active_subdivision(), 2);

        scheduler.stop();
        assert_eq!(shared.active_subdivision(), -1);
        assert_eq!(timer.active_count(), 0);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_note_value_change_rearms_and_restarts_cycle() {
        let (timer, shared, scheduler) = setup(NoteValue::Seminima);

        scheduler.start().unwrap();
        timer.fire_rounds(2);
        assert_eq!(shared.active_subdivision(), 1);

        scheduler.set_note_value(NoteValue::Minima).unwrap();
        assert_eq!(timer.active_count(), 1);
        assert_eq!(timer.active_intervals(), vec![Duration::from_millis(500)]);

        timer.fire();
        assert_eq!(shared.active_subdivision(), 0);

        // Switching to none while running disarms and parks the index
        scheduler.set_note_value(NoteValue::None).unwrap();
        assert_eq!(timer.active_count(), 0);
        assert_eq!(shared.active_subdivision(), -1);
    }

    #[test]
    fn test_follows_published_session_tempo() {
        let (timer, shared, scheduler) = setup(NoteValue::Seminima);

        scheduler.start().unwrap();
        timer.fire();
        assert_eq!(timer.active_intervals(), vec![Duration::from_millis(250)]);

        // The beat scheduler published a ramped tempo; the next pulse tick
        // re-arms at the matching interval
        shared.set_current_bpm(120.0);
        timer.fire();
        assert_eq!(timer.active_count(), 1);
        assert_eq!(timer.active_intervals(), vec![Duration::from_millis(125)]);
    }
}
