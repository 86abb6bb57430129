// Sound module - beat sound catalog and the playback capability

use std::fmt;

/// Dispatch volume for the accented downbeat
pub const DOWNBEAT_VOLUME: f32 = 1.0;

/// Dispatch volume for the remaining beats of a measure
pub const BEAT_VOLUME: f32 = 0.75;

/// Built-in beat sounds selectable by UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundId {
    Classical,
    Metronome,
    Drumstick,
    Camera,
    Interface,
    Modern,
    Pro,
    Typewriter,
    Handgun,
}

impl SoundId {
    /// Every sound in the catalog, in selector order
    pub const ALL: [SoundId; 9] = [
        SoundId::Classical,
        SoundId::Metronome,
        SoundId::Drumstick,
        SoundId::Camera,
        SoundId::Interface,
        SoundId::Modern,
        SoundId::Pro,
        SoundId::Typewriter,
        SoundId::Handgun,
    ];

    /// Parse the selector name used by the UI; `None` for unknown sounds
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classical" => Some(SoundId::Classical),
            "metronome" => Some(SoundId::Metronome),
            "drumstick" => Some(SoundId::Drumstick),
            "camera" => Some(SoundId::Camera),
            "interface" => Some(SoundId::Interface),
            "modern" => Some(SoundId::Modern),
            "pro" => Some(SoundId::Pro),
            "typewriter" => Some(SoundId::Typewriter),
            "handgun" => Some(SoundId::Handgun),
            _ => None,
        }
    }

    /// Selector name of this sound
    pub fn name(&self) -> &'static str {
        match self {
            SoundId::Classical => "classical",
            SoundId::Metronome => "metronome",
            SoundId::Drumstick => "drumstick",
            SoundId::Camera => "camera",
            SoundId::Interface => "interface",
            SoundId::Modern => "modern",
            SoundId::Pro => "pro",
            SoundId::Typewriter => "typewriter",
            SoundId::Handgun => "handgun",
        }
    }
}

impl Default for SoundId {
    fn default() -> Self {
        SoundId::Classical
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Volume a dispatch should use for the given accent flag
pub fn accent_volume(accent: bool) -> f32 {
    if accent { DOWNBEAT_VOLUME } else { BEAT_VOLUME }
}

/// Sound playback capability invoked once per scheduler tick
///
/// Implementations own a single audio slot: `play` replaces whatever was
/// sounding (resetting its position first), `stop` halts the in-flight
/// sound immediately. The engine never lets two schedulers hold the slot
/// at the same time.
pub trait SoundPlayback: Send + Sync {
    /// Dispatch one beat; `accent` marks the measure's downbeat
    fn play(&self, sound: SoundId, accent: bool);

    /// Halt the in-flight sound and reset its position
    fn stop(&self);
}

/// Playback that discards every dispatch, for headless hosts and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl SoundPlayback for NullPlayback {
    fn play(&self, _sound: SoundId, _accent: bool) {}

    fn stop(&self) {}
}
