use crate::error::RepcamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The exercises the engine can recognize.
///
/// Every caller-facing label (session plans, workout plans, reports) uses the
/// kebab-case form; anything else is rejected before processing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    PushUp,
    Squat,
    PullUp,
    Plank,
    Lunge,
}

impl Exercise {
    pub const ALL: [Exercise; 5] = [
        Exercise::PushUp,
        Exercise::Squat,
        Exercise::PullUp,
        Exercise::Plank,
        Exercise::Lunge,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Exercise::PushUp => "push-up",
            Exercise::Squat => "squat",
            Exercise::PullUp => "pull-up",
            Exercise::Plank => "plank",
            Exercise::Lunge => "lunge",
        }
    }

    /// Whether this exercise is a static hold measured in seconds rather
    /// than a counted movement.
    pub fn is_hold(&self) -> bool {
        matches!(self, Exercise::Plank)
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Exercise {
    type Err = RepcamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exercise::ALL
            .iter()
            .find(|exercise| exercise.label() == s)
            .copied()
            .ok_or_else(|| RepcamError::UnknownExercise {
                label: s.to_string(),
            })
    }
}
