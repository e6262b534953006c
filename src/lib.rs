pub mod classifier;
pub mod config;
pub mod error;
pub mod exercise;
pub mod landmark;
pub mod schedule;
pub mod scoring;
pub mod session;
pub mod source;

#[cfg(feature = "service")]
pub mod service;

pub use classifier::{
    HoldTimer, Phase, RepCounter, LUNGE_STRIDE_THRESHOLD, PLANK_ALIGNMENT_THRESHOLD,
};
pub use config::{RepcamConfig, ReportConfig, ServiceConfig};
pub use error::{RepcamError, Result, ScheduleError, ScoringError, SourceError};
pub use exercise::Exercise;
pub use landmark::{Landmark, LandmarkFrame};
pub use schedule::{ExerciseInterval, SessionPlan, WindowDispatcher};
pub use scoring::{find_plan, score_session, Grade, WorkoutPlan, WorkoutScore, PLANS};
pub use session::{ExerciseTally, FrameAnnotation, SessionReport, SessionTracker};
pub use source::{load_session_plan, JsonlPoseSource, PoseObservation};

#[cfg(feature = "service")]
pub use service::{AnalyzeRequest, AnalyzeResponse, AnalyzeServer};
