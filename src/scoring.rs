//! Scoring a finished session against a named workout plan.
//!
//! Pure lookup-and-ratio arithmetic downstream of the counting engine: each
//! plan exercise contributes a completion percentage capped at 100, the
//! overall score is their unweighted average, and the grade comes from fixed
//! percentage bands.

use crate::error::ScoringError;
use crate::exercise::Exercise;
use crate::session::SessionReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A named workout plan: per-exercise targets, counts for rep exercises and
/// seconds for holds.
#[derive(Debug, Clone, Copy)]
pub struct WorkoutPlan {
    pub name: &'static str,
    pub targets: &'static [(Exercise, f64)],
}

pub const PLANS: [WorkoutPlan; 5] = [
    WorkoutPlan {
        name: "beginner",
        targets: &[
            (Exercise::PushUp, 10.0),
            (Exercise::Squat, 20.0),
            (Exercise::Plank, 30.0),
        ],
    },
    WorkoutPlan {
        name: "classic",
        targets: &[
            (Exercise::PushUp, 15.0),
            (Exercise::Squat, 30.0),
            (Exercise::PullUp, 10.0),
            (Exercise::Plank, 45.0),
        ],
    },
    WorkoutPlan {
        name: "full-body",
        targets: &[
            (Exercise::PushUp, 20.0),
            (Exercise::Squat, 30.0),
            (Exercise::PullUp, 15.0),
            (Exercise::Plank, 60.0),
            (Exercise::Lunge, 20.0),
        ],
    },
    WorkoutPlan {
        name: "strength",
        targets: &[
            (Exercise::PushUp, 30.0),
            (Exercise::PullUp, 20.0),
            (Exercise::Plank, 90.0),
        ],
    },
    WorkoutPlan {
        name: "legs-and-core",
        targets: &[
            (Exercise::Squat, 40.0),
            (Exercise::Lunge, 30.0),
            (Exercise::Plank, 60.0),
        ],
    },
];

/// Look up a built-in plan by name.
pub fn find_plan(name: &str) -> Result<&'static WorkoutPlan, ScoringError> {
    PLANS
        .iter()
        .find(|plan| plan.name == name)
        .ok_or_else(|| ScoringError::UnknownPlan {
            name: name.to_string(),
        })
}

/// Discrete grade from fixed percentage bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grade {
    Excellent,
    Good,
    Satisfactory,
    Poor,
    VeryPoor,
}

impl Grade {
    /// Band boundaries are inclusive at the lower edge: exactly 90 is still
    /// the top grade.
    pub fn from_percent(overall_percent: f64) -> Self {
        if overall_percent >= 90.0 {
            Grade::Excellent
        } else if overall_percent >= 70.0 {
            Grade::Good
        } else if overall_percent >= 50.0 {
            Grade::Satisfactory
        } else if overall_percent >= 30.0 {
            Grade::Poor
        } else {
            Grade::VeryPoor
        }
    }

    /// The 1-5 numeric grade.
    pub fn score(self) -> u8 {
        match self {
            Grade::Excellent => 5,
            Grade::Good => 4,
            Grade::Satisfactory => 3,
            Grade::Poor => 2,
            Grade::VeryPoor => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Satisfactory => "satisfactory",
            Grade::Poor => "poor",
            Grade::VeryPoor => "very poor",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.score(), self.label())
    }
}

/// One plan exercise's completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseScore {
    pub target: f64,
    pub actual: f64,
    pub percent: u32,
}

/// Full scoring result for a session against one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutScore {
    pub plan: String,
    pub exercises: BTreeMap<Exercise, ExerciseScore>,
    pub overall_percent: f64,
    pub grade: Grade,
    pub grade_score: u8,
}

/// Score a finished session against the named plan. Holds are measured by
/// accumulated seconds, everything else by rep count; a plan exercise the
/// session never performed scores zero.
pub fn score_session(plan_name: &str, report: &SessionReport) -> Result<WorkoutScore, ScoringError> {
    let plan = find_plan(plan_name)?;

    let mut exercises = BTreeMap::new();
    let mut total_percent = 0u32;

    for &(exercise, target) in plan.targets {
        let actual = report
            .tally(exercise)
            .map(|tally| {
                if exercise.is_hold() {
                    tally.seconds
                } else {
                    f64::from(tally.count)
                }
            })
            .unwrap_or(0.0);

        let percent = if target > 0.0 {
            (((actual / target) * 100.0).round() as u32).min(100)
        } else {
            0
        };

        debug!(
            "{}: {:.1} of {:.1} targeted ({}%)",
            exercise, actual, target, percent
        );

        exercises.insert(
            exercise,
            ExerciseScore {
                target,
                actual,
                percent,
            },
        );
        total_percent += percent;
    }

    let overall_percent = f64::from(total_percent) / plan.targets.len() as f64;
    let grade = Grade::from_percent(overall_percent);

    Ok(WorkoutScore {
        plan: plan.name.to_string(),
        exercises,
        overall_percent,
        grade,
        grade_score: grade.score(),
    })
}
