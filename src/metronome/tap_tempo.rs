// Tap tempo - BPM estimation from a sequence of tap timestamps

use crate::metronome::tempo::MS_PER_MINUTE;

/// Minimum gap between taps; closer taps are debounced away
const DEBOUNCE_MS: u64 = 300;

/// Estimates at or below this BPM are dropped
const MIN_BPM_EXCLUSIVE: f64 = 40.0;

/// Estimates at or above this BPM are dropped
const MAX_BPM_EXCLUSIVE: f64 = 240.0;

/// Tap-tempo estimator
///
/// Keeps the two most recent tap timestamps and derives a BPM estimate
/// from their gap. The estimator only mutates its own buffer; the caller
/// decides whether to apply an accepted estimate to the tempo model.
#[derive(Debug, Default)]
pub struct TapTempo {
    taps: Vec<u64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap at `now_ms`
    ///
    /// Returns the accepted BPM estimate, rounded to the nearest integer.
    /// Returns `None` when the tap lands inside the debounce window, when
    /// there is only one tap so far, or when the estimate falls outside
    /// the open `(40, 240)` range; in every `None` case the previous tempo
    /// stays in force.
    pub fn register(&mut self, now_ms: u64) -> Option<f64> {
        if let Some(&last) = self.taps.last() {
            if now_ms.saturating_sub(last) < DEBOUNCE_MS {
                return None;
            }
        }

        self.taps.push(now_ms);
        if self.taps.len() > 2 {
            self.taps.remove(0);
        }

        if self.taps.len() < 2 {
            return None;
        }

        let interval = self.taps[1] - self.taps[0];
        let bpm = (MS_PER_MINUTE / interval as f64).round();
        (bpm > MIN_BPM_EXCLUSIVE && bpm < MAX_BPM_EXCLUSIVE).then_some(bpm)
    }

    /// Forget all buffered taps
    pub fn reset(&mut self) {
        self.taps.clear();
    }

    /// Buffered tap timestamps, oldest first
    pub fn taps(&self) -> &[u64] {
        &self.taps
    }
}
