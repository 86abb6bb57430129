// Progressive tempo ramp - steps BPM toward a target over completed measures

use thiserror::Error;

/// Ramp configuration errors
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum RampError {
    #[error("Ramp target {target} BPM must be above the initial {initial} BPM")]
    TargetNotAboveInitial { initial: f64, target: f64 },

    #[error("Ramp tempos must be greater than 0 (got initial {initial}, target {target})")]
    InvalidBpm { initial: f64, target: f64 },

    #[error("Ramp step must be greater than 0")]
    InvalidStep,

    #[error("Ramp must complete at least one measure per step")]
    InvalidRepeats,
}

/// How each ramp increment is sized
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionStep {
    /// Step by a percentage of the initial BPM
    Percentage(f64),
    /// Step by an absolute BPM amount
    Bpm(f64),
}

/// Progressive ramp configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPlan {
    initial_bpm: f64,
    target_bpm: f64,
    step: ProgressionStep,
    repeats_per_step: u32,
}

impl RampPlan {
    /// Create a plan; `target_bpm` must exceed `initial_bpm`, both positive,
    /// with a positive step applied every `repeats_per_step` measures
    pub fn new(
        initial_bpm: f64,
        target_bpm: f64,
        step: ProgressionStep,
        repeats_per_step: u32,
    ) -> Result<Self, RampError> {
        if !initial_bpm.is_finite()
            || !target_bpm.is_finite()
            || initial_bpm <= 0.0
            || target_bpm <= 0.0
        {
            return Err(RampError::InvalidBpm {
                initial: initial_bpm,
                target: target_bpm,
            });
        }
        if target_bpm <= initial_bpm {
            return Err(RampError::TargetNotAboveInitial {
                initial: initial_bpm,
                target: target_bpm,
            });
        }
        let step_size = match step {
            ProgressionStep::Percentage(pct) => pct,
            ProgressionStep::Bpm(delta) => delta,
        };
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(RampError::InvalidStep);
        }
        if repeats_per_step == 0 {
            return Err(RampError::InvalidRepeats);
        }

        Ok(Self {
            initial_bpm,
            target_bpm,
            step,
            repeats_per_step,
        })
    }

    pub fn initial_bpm(&self) -> f64 {
        self.initial_bpm
    }

    pub fn target_bpm(&self) -> f64 {
        self.target_bpm
    }

    pub fn step(&self) -> ProgressionStep {
        self.step
    }

    pub fn repeats_per_step(&self) -> u32 {
        self.repeats_per_step
    }

    /// BPM added by one increment step
    fn step_delta(&self) -> f64 {
        match self.step {
            ProgressionStep::Percentage(pct) => self.initial_bpm * (pct / 100.0),
            ProgressionStep::Bpm(delta) => delta,
        }
    }
}

/// Progressive ramp state machine, advanced once per completed measure
///
/// The current BPM stays clamped to `[initial_bpm, target_bpm]`. Reaching
/// the target marks the ramp complete but never stops playback; the
/// session keeps ticking at the target tempo indefinitely.
#[derive(Debug, Clone)]
pub struct TempoRamp {
    plan: RampPlan,
    current_bpm: f64,
    measures_completed: u32,
    completed: bool,
}

impl TempoRamp {
    pub fn new(plan: RampPlan) -> Self {
        Self {
            plan,
            current_bpm: plan.initial_bpm(),
            measures_completed: 0,
            completed: false,
        }
    }

    pub fn plan(&self) -> &RampPlan {
        &self.plan
    }

    /// Current ramped tempo
    pub fn current_bpm(&self) -> f64 {
        self.current_bpm
    }

    /// Whether the ramp has reached its target
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Record one completed measure
    ///
    /// Returns the new BPM when this measure triggered an increment step,
    /// `None` otherwise (including once the target is held).
    pub fn on_measure_complete(&mut self) -> Option<f64> {
        self.measures_completed += 1;
        if self.measures_completed < self.plan.repeats_per_step() {
            return None;
        }
        self.measures_completed = 0;

        let stepped = (self.current_bpm + self.plan.step_delta()).min(self.plan.target_bpm());
        if stepped >= self.plan.target_bpm() {
            self.completed = true;
        }
        if stepped == self.current_bpm {
            return None;
        }

        self.current_bpm = stepped;
        Some(stepped)
    }

    /// Return to the initial BPM with a fresh measure count
    pub fn reset(&mut self) {
        self.current_bpm = self.plan.initial_bpm();
        self.measures_completed = 0;
        self.completed = false;
    }
}
