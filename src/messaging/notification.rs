// Engine notifications pushed to UI collaborators

use crate::study::cycle::StudyPhase;

/// Events published by the schedulers over the notification channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// A beat fired; `downbeat` marks the measure's first beat
    Beat { index: u32, downbeat: bool },
    /// The tempo changed, from user input or a ramp step
    TempoChanged { bpm: f64 },
    /// A progressive ramp reached its target for the first time;
    /// playback keeps ticking at the target tempo
    RampCompleted { target_bpm: f64 },
    /// Playback stopped and the beat cursor reset
    Stopped,
    /// The study/pause cycle moved to a new phase
    StudyPhaseChanged { phase: StudyPhase, cycle: u32 },
    /// The study/pause cycle finished its last study block
    StudyCycleFinished,
}
