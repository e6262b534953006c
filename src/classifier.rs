//! Per-exercise posture classification and edge-triggered rep counting.
//!
//! Every counting exercise reduces to the same shape: derive a scalar
//! feature from a pair of joints, threshold it into an up/down phase, and
//! credit a repetition the instant the phase flips into the contracted
//! phase. Flipping back to the extended phase rearms the detector; repeated
//! frames in the same phase are no-ops, so a physical rep can never be
//! counted twice regardless of frame rate. The plank is the exception: it
//! gates a wall-clock duration accumulator on a posture check instead.
//!
//! Vertical comparisons work in normalized image space where y increases
//! downward, which stands in for relative limb position without any 3-D
//! reconstruction. It assumes a roughly side-on or front-on framing.

use crate::landmark::LandmarkFrame;
use std::time::{Duration, Instant};

/// Normalized shoulder/hip offset below which a plank posture counts as
/// aligned. Empirical, not calibrated per subject.
pub const PLANK_ALIGNMENT_THRESHOLD: f64 = 0.1;

/// Normalized knee/ankle horizontal offset below which a lunge counts as
/// dropped. Empirical, not calibrated per subject.
pub const LUNGE_STRIDE_THRESHOLD: f64 = 0.1;

/// Binary posture phase used by the counting exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Up,
    Down,
}

/// Edge-triggered repetition counter.
///
/// A rep is credited only on the transition from the resting phase into
/// `counted_on`; any observation of the opposite phase rearms the detector.
#[derive(Debug, Clone)]
pub struct RepCounter {
    phase: Phase,
    counted_on: Phase,
    repetitions: u32,
}

impl RepCounter {
    pub fn new(starting_phase: Phase, counted_on: Phase) -> Self {
        Self {
            phase: starting_phase,
            counted_on,
            repetitions: 0,
        }
    }

    /// Feed one frame's observed phase. Returns true when this observation
    /// completed a repetition.
    pub fn observe(&mut self, observed: Phase) -> bool {
        if observed == self.counted_on {
            if self.phase != self.counted_on {
                self.phase = observed;
                self.repetitions += 1;
                return true;
            }
            false
        } else {
            self.phase = observed;
            false
        }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Duration accumulator for static holds.
///
/// While the posture check passes, the held duration tracks wall-clock time
/// since the session started; while it fails, the duration keeps its last
/// value. It never resets mid-session.
#[derive(Debug, Clone)]
pub struct HoldTimer {
    started_at: Instant,
    held: Duration,
}

impl HoldTimer {
    pub fn new(session_start: Instant) -> Self {
        Self {
            started_at: session_start,
            held: Duration::ZERO,
        }
    }

    /// Feed one frame's posture check. Returns the accumulated duration.
    pub fn observe(&mut self, aligned: bool) -> Duration {
        if aligned {
            self.held = self.started_at.elapsed();
        }
        self.held
    }

    pub fn held(&self) -> Duration {
        self.held
    }
}

/// Push-up: down once the elbow midline sinks below the shoulder midline.
pub fn push_up_phase(frame: &LandmarkFrame) -> Phase {
    if frame.elbow_y() > frame.shoulder_y() {
        Phase::Down
    } else {
        Phase::Up
    }
}

/// Squat: down once the knee midline sits below the hip midline.
pub fn squat_phase(frame: &LandmarkFrame) -> Phase {
    if frame.knee_y() > frame.hip_y() {
        Phase::Down
    } else {
        Phase::Up
    }
}

/// Pull-up: up once the elbow midline rises above the shoulder midline.
/// The inverse polarity of the push-up.
pub fn pull_up_phase(frame: &LandmarkFrame) -> Phase {
    if frame.elbow_y() < frame.shoulder_y() {
        Phase::Up
    } else {
        Phase::Down
    }
}

/// Lunge: down once the front knee stacks horizontally over its ankle.
pub fn lunge_phase(frame: &LandmarkFrame) -> Phase {
    let (knee, ankle) = frame.front_leg();
    if (knee.x - ankle.x).abs() < LUNGE_STRIDE_THRESHOLD {
        Phase::Down
    } else {
        Phase::Up
    }
}

/// Plank posture check: shoulders and hips roughly level.
pub fn plank_aligned(frame: &LandmarkFrame) -> bool {
    (frame.shoulder_y() - frame.hip_y()).abs() < PLANK_ALIGNMENT_THRESHOLD
}
