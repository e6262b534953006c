//! Time-window scheduling: mapping caller-declared exercise intervals onto
//! frame indices and picking the active exercise for each frame.

use crate::error::ScheduleError;
use crate::exercise::Exercise;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One caller-declared time window: the subject performs `exercise` between
/// `start` and `end` seconds of video playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInterval {
    pub start: f64,
    pub end: f64,
    pub exercise: Exercise,
}

impl ExerciseInterval {
    pub fn new(start: f64, end: f64, exercise: Exercise) -> Self {
        Self {
            start,
            end,
            exercise,
        }
    }
}

/// A full session's schedule: the video frame rate plus the ordered interval
/// list. This is the caller-facing setup contract; `validate` runs before
/// any frame is processed and rejects malformed input outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub fps: f64,
    #[serde(rename = "interval", default)]
    pub intervals: Vec<ExerciseInterval>,
}

impl SessionPlan {
    pub fn new(fps: f64, intervals: Vec<ExerciseInterval>) -> Self {
        Self { fps, intervals }
    }

    /// Fail fast on malformed bounds or ordering. Overlap between adjacent
    /// intervals is deliberately not checked; the dispatcher resolves it by
    /// cursor order.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ScheduleError::InvalidFrameRate { fps: self.fps });
        }

        let mut previous_start = f64::NEG_INFINITY;
        for (index, interval) in self.intervals.iter().enumerate() {
            if !interval.start.is_finite()
                || !interval.end.is_finite()
                || interval.start < 0.0
                || interval.start >= interval.end
            {
                return Err(ScheduleError::InvalidInterval {
                    index,
                    start: interval.start,
                    end: interval.end,
                });
            }
            if interval.start < previous_start {
                return Err(ScheduleError::UnorderedInterval {
                    index,
                    start: interval.start,
                });
            }
            previous_start = interval.start;
        }

        Ok(())
    }
}

/// An interval with its bounds converted to inclusive frame indices.
#[derive(Debug, Clone, Copy)]
struct FrameWindow {
    start_frame: u64,
    end_frame: u64,
    exercise: Exercise,
}

/// Assigns each consumed frame to at most one exercise.
///
/// The cursor walks the interval list monotonically: once a frame lands past
/// the current window's end the cursor advances exactly once and nothing is
/// active for that frame. The check is not retried against the next window
/// within the same frame, so a window shorter than one frame step can be
/// stepped over entirely.
#[derive(Debug)]
pub struct WindowDispatcher {
    windows: Vec<FrameWindow>,
    cursor: usize,
}

impl WindowDispatcher {
    /// Build a dispatcher from a validated plan. Interval bounds are
    /// converted once, via `floor(seconds * fps)`, for comparison with the
    /// integer frame counter.
    pub fn new(plan: &SessionPlan) -> Result<Self, ScheduleError> {
        plan.validate()?;

        let windows = plan
            .intervals
            .iter()
            .map(|interval| FrameWindow {
                start_frame: (interval.start * plan.fps).floor() as u64,
                end_frame: (interval.end * plan.fps).floor() as u64,
                exercise: interval.exercise,
            })
            .collect::<Vec<_>>();

        for window in &windows {
            debug!(
                "Scheduled {} for frames {}..={}",
                window.exercise, window.start_frame, window.end_frame
            );
        }

        Ok(Self { windows, cursor: 0 })
    }

    /// Resolve the active exercise for `frame_index`. Frames must be fed in
    /// video order; the cursor never moves backwards.
    pub fn active_exercise(&mut self, frame_index: u64) -> Option<Exercise> {
        let window = self.windows.get(self.cursor)?;

        if frame_index >= window.start_frame && frame_index <= window.end_frame {
            Some(window.exercise)
        } else if frame_index > window.end_frame {
            debug!(
                "Frame {} past {} window, advancing to interval {}",
                frame_index,
                window.exercise,
                self.cursor + 1
            );
            self.cursor += 1;
            None
        } else {
            None
        }
    }

    /// True once every interval has been consumed.
    pub fn exhausted(&self) -> bool {
        self.cursor >= self.windows.len()
    }
}
