//! End-to-end metronome session tests
//!
//! Drives the whole engine (facade, beat scheduler, ramp, subdivision,
//! tap tempo) through the deterministic manual timer and clock, the way a
//! UI host would but without wall-clock waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use ringbuf::traits::Consumer;

use pulse_metronome::{
    Clock, ManualClock, ManualTimer, Metronome, Notification, NotificationConsumer, NoteValue,
    PlaybackMode, ProgressionStep, RampPlan, RepeatingTimer, SoundId, SoundPlayback, Tempo,
    TimeSignature,
};

#[derive(Debug, Default)]
struct RecordingPlayback {
    events: Mutex<Vec<(SoundId, bool)>>,
    stops: AtomicU32,
}

impl RecordingPlayback {
    fn accents(&self) -> Vec<bool> {
        self.events.lock().iter().map(|(_, accent)| *accent).collect()
    }

    fn sounds(&self) -> Vec<SoundId> {
        self.events.lock().iter().map(|(sound, _)| *sound).collect()
    }
}

impl SoundPlayback for RecordingPlayback {
    fn play(&self, sound: SoundId, accent: bool) {
        self.events.lock().push((sound, accent));
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }
}

struct Harness {
    timer: Arc<ManualTimer>,
    clock: Arc<ManualClock>,
    playback: Arc<RecordingPlayback>,
    session: Metronome,
    notifications: NotificationConsumer,
}

fn harness() -> Harness {
    let timer = Arc::new(ManualTimer::new());
    let clock = Arc::new(ManualClock::new(0));
    let playback = Arc::new(RecordingPlayback::default());
    let mut session = Metronome::new(
        Arc::clone(&timer) as Arc<dyn RepeatingTimer>,
        Arc::clone(&playback) as Arc<dyn SoundPlayback>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let notifications = session.take_notifications().unwrap();
    Harness {
        timer,
        clock,
        playback,
        session,
        notifications,
    }
}

fn drain(notifications: &mut NotificationConsumer) -> Vec<Notification> {
    std::iter::from_fn(|| notifications.try_pop()).collect()
}

#[test]
fn beat_cursor_wraps_and_accents_the_downbeat() {
    let mut h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    h.session.start().unwrap();
    assert!(h.session.is_playing());

    let mut observed = Vec::new();
    for _ in 0..8 {
        h.timer.fire();
        observed.push(h.session.current_beat());
    }

    assert_eq!(observed, vec![1, 2, 3, 0, 1, 2, 3, 0]);
    assert_eq!(
        h.playback.accents(),
        vec![false, false, false, true, false, false, false, true]
    );

    let beats: Vec<_> = drain(&mut h.notifications)
        .into_iter()
        .filter(|n| matches!(n, Notification::Beat { .. }))
        .collect();
    assert_eq!(beats.len(), 8);
}

#[test]
fn three_four_time_wraps_every_three_beats() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();
    h.session.set_time_signature(TimeSignature::three_four());

    h.session.start().unwrap();
    let mut observed = Vec::new();
    for _ in 0..6 {
        h.timer.fire();
        observed.push(h.session.current_beat());
    }
    assert_eq!(observed, vec![1, 2, 0, 1, 2, 0]);
}

#[test]
fn retune_while_running_keeps_one_timer_and_the_cursor() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    h.session.start().unwrap();
    h.timer.fire_rounds(2);
    assert_eq!(h.session.current_beat(), 2);

    for bpm in [80.0, 100.0, 132.0, 178.0, 90.0] {
        h.session.set_bpm(bpm).unwrap();
        assert_eq!(h.timer.active_count(), 1);
    }
    assert_eq!(
        h.timer.active_intervals(),
        vec![Tempo::new(90.0).unwrap().interval()]
    );
    assert_eq!(h.session.current_bpm(), 90.0);

    // The measure continues where it left off
    h.timer.fire();
    assert_eq!(h.session.current_beat(), 3);
}

#[test]
fn stop_resets_the_cursor_and_halts_sound() {
    let mut h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    h.session.start().unwrap();
    h.timer.fire_rounds(5);
    assert_eq!(h.session.current_beat(), 1);

    h.session.stop();
    assert!(!h.session.is_playing());
    assert_eq!(h.session.current_beat(), 0);
    assert_eq!(h.playback.stops.load(Ordering::Relaxed), 1);
    assert_eq!(h.timer.active_count(), 0);

    assert!(
        drain(&mut h.notifications)
            .iter()
            .any(|n| matches!(n, Notification::Stopped))
    );
}

#[test]
fn tap_tempo_drives_the_session_tempo() {
    let mut h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();
    h.session.start().unwrap();

    // First tap: no estimate yet
    assert_eq!(h.session.register_tap().unwrap(), None);

    // Second tap 500ms later: 120 BPM, applied and retuned in place
    h.clock.advance(500);
    assert_eq!(h.session.register_tap().unwrap(), Some(120.0));
    assert_eq!(h.session.current_bpm(), 120.0);
    assert_eq!(
        h.timer.active_intervals(),
        vec![Tempo::new(120.0).unwrap().interval()]
    );

    // A tap inside the debounce window changes nothing
    h.clock.advance(200);
    assert_eq!(h.session.register_tap().unwrap(), None);
    assert_eq!(h.session.current_bpm(), 120.0);

    // A 2.2s gap estimates 27 BPM: out of range, previous tempo retained
    h.clock.advance(2_200);
    assert_eq!(h.session.register_tap().unwrap(), None);
    assert_eq!(h.session.current_bpm(), 120.0);
}

#[test]
fn progressive_ramp_reaches_target_and_keeps_ticking() {
    let mut h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    let plan = RampPlan::new(60.0, 120.0, ProgressionStep::Bpm(10.0), 2).unwrap();
    h.session.set_mode(PlaybackMode::Progressive);
    h.session.set_ramp_plan(plan);
    h.session.start().unwrap();
    assert_eq!(h.session.current_bpm(), 60.0);

    // Two 4/4 measures per step
    h.timer.fire_rounds(8);
    assert_eq!(h.session.current_bpm(), 70.0);

    h.timer.fire_rounds(16);
    assert_eq!(h.session.current_bpm(), 90.0);

    // Run well past the target: clamped and still playing
    h.timer.fire_rounds(100);
    assert_eq!(h.session.current_bpm(), 120.0);
    assert!(h.session.is_playing());

    let notifications = drain(&mut h.notifications);
    assert_eq!(
        notifications
            .iter()
            .filter(
                |n| matches!(n, Notification::RampCompleted { target_bpm } if *target_bpm == 120.0)
            )
            .count(),
        1
    );
}

#[test]
fn percentage_ramp_steps_by_share_of_initial() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    let plan = RampPlan::new(80.0, 160.0, ProgressionStep::Percentage(25.0), 1).unwrap();
    h.session.set_mode(PlaybackMode::Progressive);
    h.session.set_ramp_plan(plan);
    h.session.start().unwrap();

    // 25% of the initial 80 BPM = +20 per measure
    h.timer.fire_rounds(4);
    assert_eq!(h.session.current_bpm(), 100.0);
    h.timer.fire_rounds(4);
    assert_eq!(h.session.current_bpm(), 120.0);
}

#[test]
fn mode_switch_stops_playback_and_rewinds_the_ramp() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    let plan = RampPlan::new(60.0, 120.0, ProgressionStep::Bpm(20.0), 1).unwrap();
    h.session.set_mode(PlaybackMode::Progressive);
    h.session.set_ramp_plan(plan);
    h.session.start().unwrap();
    h.timer.fire_rounds(8);
    assert_eq!(h.session.current_bpm(), 100.0);

    h.session.set_mode(PlaybackMode::Standard);
    assert!(!h.session.is_playing());
    assert_eq!(h.session.current_beat(), 0);
    assert_eq!(h.timer.active_count(), 0);

    h.session.set_mode(PlaybackMode::Progressive);
    assert_eq!(h.session.current_bpm(), 60.0);
    assert_eq!(h.session.mode(), PlaybackMode::Progressive);
}

#[test]
fn subdivision_pulses_cycle_with_the_beat_cadence() {
    let h = harness();
    h.session.set_note_value(NoteValue::Seminima).unwrap();

    h.session.start().unwrap();
    // Beat cadence at 60 BPM plus pulses at 250ms
    let intervals = h.timer.active_intervals();
    assert_eq!(intervals.len(), 2);
    assert!(intervals.contains(&Duration::from_secs(1)));
    assert!(intervals.contains(&Duration::from_millis(250)));

    let mut indices = Vec::new();
    for _ in 0..5 {
        h.timer.fire();
        indices.push(h.session.active_subdivision());
    }
    assert_eq!(indices, vec![0, 1, 2, 3, 0]);

    h.session.stop();
    assert_eq!(h.session.active_subdivision(), -1);
    assert_eq!(h.timer.active_count(), 0);
}

#[test]
fn subdivision_follows_a_ramped_tempo() {
    let h = harness();
    h.session.set_note_value(NoteValue::Seminima).unwrap();

    let plan = RampPlan::new(60.0, 120.0, ProgressionStep::Bpm(60.0), 1).unwrap();
    h.session.set_mode(PlaybackMode::Progressive);
    h.session.set_ramp_plan(plan);
    h.session.start().unwrap();

    // One full measure steps the ramp straight to 120 BPM
    h.timer.fire_rounds(4);
    assert_eq!(h.session.current_bpm(), 120.0);

    // The pulse scheduler picks the new tempo up on its next tick
    h.timer.fire();
    assert!(
        h.timer
            .active_intervals()
            .contains(&Duration::from_millis(125))
    );
}

#[test]
fn sound_selection_and_preview() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    // Unknown names are a warned no-op
    h.session.select_sound_by_name("vuvuzela");
    assert_eq!(h.session.sound(), SoundId::Classical);

    h.session.select_sound_by_name("drumstick");
    assert_eq!(h.session.sound(), SoundId::Drumstick);

    // Preview dispatches once and cuts off after its hold expires
    h.session.preview_sound().unwrap();
    assert_eq!(h.playback.sounds(), vec![SoundId::Drumstick]);
    assert_eq!(h.timer.active_intervals(), vec![Duration::from_secs(10)]);

    h.timer.fire();
    assert_eq!(h.playback.stops.load(Ordering::Relaxed), 1);
    assert_eq!(h.timer.active_count(), 0);
}

#[test]
fn starting_playback_cancels_a_pending_preview() {
    let h = harness();
    h.session.set_note_value(NoteValue::None).unwrap();

    h.session.preview_sound().unwrap();
    h.session.start().unwrap();

    assert_eq!(h.timer.active_intervals(), vec![Duration::from_secs(1)]);
    h.timer.fire_rounds(3);
    // Only beat dispatches, no preview cutoff stop
    assert_eq!(h.playback.stops.load(Ordering::Relaxed), 0);
    assert_eq!(h.session.current_beat(), 3);
}
