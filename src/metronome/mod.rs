// Metronome module - tempo, tap input, scheduling, ramp, and the session facade

pub mod ramp;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod subdivision;
pub mod tap_tempo;
pub mod tempo;

pub use ramp::{ProgressionStep, RampError, RampPlan, TempoRamp};
pub use scheduler::SchedulerState;
pub use session::Metronome;
pub use shared::SharedBeatState;
pub use subdivision::{NoteValue, SubdivisionScheduler};
pub use tap_tempo::TapTempo;
pub use tempo::{Tempo, TempoError, TimeSignature};

use thiserror::Error;

use crate::timing::timer::TimerError;

/// Playback mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Fixed tempo set by the user
    #[default]
    Standard,
    /// Tempo ramps toward a target over completed measures
    Progressive,
}

/// Metronome session errors
#[derive(Debug, Error)]
pub enum MetronomeError {
    #[error("Tempo error: {0}")]
    Tempo(#[from] TempoError),

    #[error("Ramp error: {0}")]
    Ramp(#[from] RampError),

    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),
}

pub type MetronomeResult<T> = Result<T, MetronomeError>;
