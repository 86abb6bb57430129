// Tempo and meter - validated BPM with its derived tick interval

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Tempo validation errors
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TempoError {
    #[error("Invalid tempo: {bpm} BPM (tempo must be greater than 0)")]
    InvalidTempo { bpm: f64 },
}

/// Milliseconds in one minute, the base of every interval derivation
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Tempo in BPM (Beats Per Minute)
///
/// The UI offers 30-240 BPM; the core accepts any positive value and
/// rejects the rest with [`TempoError::InvalidTempo`], leaving the prior
/// value untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo; fails on non-positive or non-finite BPM
    pub fn new(bpm: f64) -> Result<Self, TempoError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(TempoError::InvalidTempo { bpm });
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value; the prior value is untouched on error
    pub fn set_bpm(&mut self, bpm: f64) -> Result<(), TempoError> {
        self.bpm = Self::new(bpm)?.bpm;
        Ok(())
    }

    /// Duration of one beat in milliseconds
    pub fn interval_ms(&self) -> f64 {
        MS_PER_MINUTE / self.bpm
    }

    /// Duration of one beat
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_ms() / 1_000.0)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 60.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Time signature numerator: beats per measure
///
/// The UI offers 2-7 over a quarter-note denominator; the core accepts any
/// count of at least one. Drives the modulo wraparound of the beat cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    beats_per_measure: u8,
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(beats_per_measure: u8) -> Self {
        assert!(
            beats_per_measure >= 1,
            "Time signature must have at least one beat per measure"
        );
        Self { beats_per_measure }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3)
    }

    /// Number of beats per measure
    pub fn beats_per_measure(&self) -> u8 {
        self.beats_per_measure
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/4", self.beats_per_measure)
    }
}
