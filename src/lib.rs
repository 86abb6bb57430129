// Pulse Metronome - Library exports

pub mod messaging;
pub mod metronome;
pub mod sound;
pub mod study;
pub mod timing;

// Re-export commonly used types for convenience
pub use messaging::channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use messaging::notification::Notification;
pub use metronome::{
    Metronome, MetronomeError, MetronomeResult, NoteValue, PlaybackMode, ProgressionStep,
    RampError, RampPlan, SharedBeatState, SubdivisionScheduler, TapTempo, Tempo, TempoError,
    TempoRamp, TimeSignature,
};
pub use sound::{NullPlayback, SoundId, SoundPlayback};
pub use study::{StudyPauseCycle, StudyPhase, StudySession, StudySnapshot};
pub use timing::{
    CadenceDriver, Clock, ManualClock, ManualTimer, RepeatingTimer, SystemClock, ThreadTimer,
    TimerError, TimerHandle,
};
