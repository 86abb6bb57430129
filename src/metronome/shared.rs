// Shared observables - lock-free snapshot state for UI collaborators

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

/// Read-only observable state published by the schedulers
///
/// Thread-safe via atomics so UI collaborators never contend with tick
/// processing. Each field has exactly one writer: the scheduler that owns
/// the corresponding piece of session state.
#[derive(Debug)]
pub struct SharedBeatState {
    playing: AtomicBool,
    current_beat: AtomicU32,
    // f64 bit pattern; BPM can be fractional after percentage ramp steps
    current_bpm_bits: AtomicU64,
    active_subdivision: AtomicI32,
}

impl SharedBeatState {
    /// Create shared state for a new session
    pub fn new(initial_bpm: f64) -> Arc<Self> {
        Arc::new(Self {
            playing: AtomicBool::new(false),
            current_beat: AtomicU32::new(0),
            current_bpm_bits: AtomicU64::new(initial_bpm.to_bits()),
            active_subdivision: AtomicI32::new(-1),
        })
    }

    /// Whether the beat scheduler is running
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    /// Current beat index in `[0, beats_per_measure)`
    pub fn current_beat(&self) -> u32 {
        self.current_beat.load(Ordering::Relaxed)
    }

    pub(crate) fn set_current_beat(&self, beat: u32) {
        self.current_beat.store(beat, Ordering::Relaxed);
    }

    /// Current tempo in BPM
    pub fn current_bpm(&self) -> f64 {
        f64::from_bits(self.current_bpm_bits.load(Ordering::Relaxed))
    }

    pub(crate) fn set_current_bpm(&self, bpm: f64) {
        self.current_bpm_bits.store(bpm.to_bits(), Ordering::Relaxed);
    }

    /// Active subdivision pulse index, -1 when no pulse is lit
    pub fn active_subdivision(&self) -> i32 {
        self.active_subdivision.load(Ordering::Relaxed)
    }

    pub(crate) fn set_active_subdivision(&self, index: i32) {
        self.active_subdivision.store(index, Ordering::Relaxed);
    }
}
