//! Per-session state ownership and statistics accumulation.
//!
//! A `SessionTracker` is built fresh for every video: it owns one typed
//! state slot per exercise, routes each frame's landmarks to the classifier
//! the dispatcher selects, and projects the results into the final report.
//! Nothing is shared between sessions.

use crate::classifier::{
    lunge_phase, plank_aligned, pull_up_phase, push_up_phase, squat_phase, HoldTimer, Phase,
    RepCounter,
};
use crate::error::Result;
use crate::exercise::Exercise;
use crate::landmark::LandmarkFrame;
use crate::schedule::{SessionPlan, WindowDispatcher};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Accumulated results for one exercise. `seconds` is attributed playback
/// time for counting exercises and held duration for the plank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTally {
    pub count: u32,
    #[serde(rename = "time")]
    pub seconds: f64,
}

impl ExerciseTally {
    fn zero() -> Self {
        Self {
            count: 0,
            seconds: 0.0,
        }
    }

    fn is_zero(&self) -> bool {
        self.count == 0 && self.seconds == 0.0
    }
}

/// One persisted classifier state per exercise, named fields so the shape
/// is statically checked.
struct ExerciseStates {
    push_ups: RepCounter,
    squats: RepCounter,
    pull_ups: RepCounter,
    plank: HoldTimer,
    lunges: RepCounter,
}

impl ExerciseStates {
    fn new(session_start: Instant) -> Self {
        Self {
            push_ups: RepCounter::new(Phase::Up, Phase::Down),
            squats: RepCounter::new(Phase::Up, Phase::Down),
            pull_ups: RepCounter::new(Phase::Down, Phase::Up),
            plank: HoldTimer::new(session_start),
            lunges: RepCounter::new(Phase::Up, Phase::Down),
        }
    }
}

struct ExerciseTallies {
    push_ups: ExerciseTally,
    squats: ExerciseTally,
    pull_ups: ExerciseTally,
    plank: ExerciseTally,
    lunges: ExerciseTally,
}

impl ExerciseTallies {
    fn new() -> Self {
        Self {
            push_ups: ExerciseTally::zero(),
            squats: ExerciseTally::zero(),
            pull_ups: ExerciseTally::zero(),
            plank: ExerciseTally::zero(),
            lunges: ExerciseTally::zero(),
        }
    }

    fn get(&self, exercise: Exercise) -> &ExerciseTally {
        match exercise {
            Exercise::PushUp => &self.push_ups,
            Exercise::Squat => &self.squats,
            Exercise::PullUp => &self.pull_ups,
            Exercise::Plank => &self.plank,
            Exercise::Lunge => &self.lunges,
        }
    }

    fn get_mut(&mut self, exercise: Exercise) -> &mut ExerciseTally {
        match exercise {
            Exercise::PushUp => &mut self.push_ups,
            Exercise::Squat => &mut self.squats,
            Exercise::PullUp => &mut self.pull_ups,
            Exercise::Plank => &mut self.plank,
            Exercise::Lunge => &mut self.lunges,
        }
    }
}

/// Per-frame output for an external overlay renderer: which exercise was
/// active and the raw landmarks, if any were detected.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrameAnnotation<'a> {
    pub frame_index: u64,
    pub active: Option<Exercise>,
    pub landmarks: Option<&'a LandmarkFrame>,
}

/// Final per-session statistics. Exercises with nothing to report are
/// filtered out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub frames_processed: u64,
    pub frames_detected: u64,
    pub processing_time: f64,
    pub exercises: BTreeMap<Exercise, ExerciseTally>,
}

impl SessionReport {
    pub fn tally(&self, exercise: Exercise) -> Option<&ExerciseTally> {
        self.exercises.get(&exercise)
    }
}

/// Streaming reduction over one video's frames.
///
/// Frames must be fed strictly in video order, exactly once each. A frame
/// with no detection still advances the schedule and accrues attributed
/// time, but leaves every classifier state untouched.
pub struct SessionTracker {
    dispatcher: WindowDispatcher,
    fps: f64,
    states: ExerciseStates,
    tallies: ExerciseTallies,
    frames_seen: u64,
    frames_detected: u64,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl SessionTracker {
    /// Validate the plan and set up fresh per-exercise state. Configuration
    /// errors surface here, before any frame is consumed.
    pub fn new(plan: &SessionPlan) -> Result<Self> {
        let dispatcher = WindowDispatcher::new(plan)?;
        let started = Instant::now();

        info!(
            "Session tracking {} intervals at {} fps",
            plan.intervals.len(),
            plan.fps
        );

        Ok(Self {
            dispatcher,
            fps: plan.fps,
            states: ExerciseStates::new(started),
            tallies: ExerciseTallies::new(),
            frames_seen: 0,
            frames_detected: 0,
            started,
            started_at: Utc::now(),
        })
    }

    /// Consume the next frame in video order.
    pub fn process_frame<'a>(&mut self, landmarks: Option<&'a LandmarkFrame>) -> FrameAnnotation<'a> {
        let frame_index = self.frames_seen;
        self.frames_seen += 1;
        if landmarks.is_some() {
            self.frames_detected += 1;
        }

        let active = self.dispatcher.active_exercise(frame_index);

        if let Some(exercise) = active {
            self.tallies.get_mut(exercise).seconds += 1.0 / self.fps;

            if let Some(frame) = landmarks {
                match exercise {
                    Exercise::PushUp => {
                        if self.states.push_ups.observe(push_up_phase(frame)) {
                            debug!(
                                "Push-up rep {} at frame {}",
                                self.states.push_ups.repetitions(),
                                frame_index
                            );
                        }
                        self.tallies.push_ups.count = self.states.push_ups.repetitions();
                    }
                    Exercise::Squat => {
                        if self.states.squats.observe(squat_phase(frame)) {
                            debug!(
                                "Squat rep {} at frame {}",
                                self.states.squats.repetitions(),
                                frame_index
                            );
                        }
                        self.tallies.squats.count = self.states.squats.repetitions();
                    }
                    Exercise::PullUp => {
                        if self.states.pull_ups.observe(pull_up_phase(frame)) {
                            debug!(
                                "Pull-up rep {} at frame {}",
                                self.states.pull_ups.repetitions(),
                                frame_index
                            );
                        }
                        self.tallies.pull_ups.count = self.states.pull_ups.repetitions();
                    }
                    Exercise::Plank => {
                        let held = self.states.plank.observe(plank_aligned(frame));
                        self.tallies.plank.seconds = held.as_secs_f64();
                    }
                    Exercise::Lunge => {
                        if self.states.lunges.observe(lunge_phase(frame)) {
                            debug!(
                                "Lunge rep {} at frame {}",
                                self.states.lunges.repetitions(),
                                frame_index
                            );
                        }
                        self.tallies.lunges.count = self.states.lunges.repetitions();
                    }
                }
            }
        }

        FrameAnnotation {
            frame_index,
            active,
            landmarks,
        }
    }

    /// Number of frames consumed so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_seen
    }

    /// Close out the session and produce the filtered report.
    pub fn finish(self) -> SessionReport {
        let exercises = Exercise::ALL
            .into_iter()
            .map(|exercise| (exercise, *self.tallies.get(exercise)))
            .filter(|(_, tally)| !tally.is_zero())
            .collect::<BTreeMap<_, _>>();

        let report = SessionReport {
            session_id: Uuid::new_v4(),
            started_at: self.started_at,
            frames_processed: self.frames_seen,
            frames_detected: self.frames_detected,
            processing_time: self.started.elapsed().as_secs_f64(),
            exercises,
        };

        info!(
            "Session {} finished: {} frames ({} with detections) in {:.3}s, {} exercises reported",
            report.session_id,
            report.frames_processed,
            report.frames_detected,
            report.processing_time,
            report.exercises.len()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use crate::schedule::ExerciseInterval;

    fn frame_with_legs(hip_y: f64, knee_y: f64) -> LandmarkFrame {
        let at = Landmark::new(0.5, 0.5);
        let mut frame = LandmarkFrame {
            left_shoulder: at,
            right_shoulder: at,
            left_elbow: at,
            right_elbow: at,
            left_hip: at,
            right_hip: at,
            left_knee: at,
            right_knee: at,
            left_ankle: at,
            right_ankle: at,
        };
        frame.left_hip.y = hip_y;
        frame.right_hip.y = hip_y;
        frame.left_knee.y = knee_y;
        frame.right_knee.y = knee_y;
        frame
    }

    fn frame_with_arms(shoulder_y: f64, elbow_y: f64) -> LandmarkFrame {
        let mut frame = frame_with_legs(0.5, 0.5);
        frame.left_shoulder.y = shoulder_y;
        frame.right_shoulder.y = shoulder_y;
        frame.left_elbow.y = elbow_y;
        frame.right_elbow.y = elbow_y;
        frame
    }

    #[test]
    fn test_single_squat_over_marked_interval() {
        // 10 fps synthetic stream: standing for a second, below parallel for
        // a second, standing again, all inside one squat interval.
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(0.0, 3.0, Exercise::Squat)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();

        let up = frame_with_legs(0.5, 0.4);
        let down = frame_with_legs(0.5, 0.6);
        for i in 0..30 {
            let frame = if (10..20).contains(&i) { &down } else { &up };
            tracker.process_frame(Some(frame));
        }

        let report = tracker.finish();
        assert_eq!(report.frames_processed, 30);

        let squat = report.tally(Exercise::Squat).unwrap();
        assert_eq!(squat.count, 1);
        assert!((squat.seconds - 3.0).abs() < 1e-9);

        // Exercises without a matching interval never appear.
        assert_eq!(report.exercises.len(), 1);
        assert!(report.tally(Exercise::PushUp).is_none());
    }

    #[test]
    fn test_missing_detection_preserves_state_but_accrues_time() {
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(0.0, 1.0, Exercise::PushUp)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();

        let down = frame_with_arms(0.5, 0.6);
        tracker.process_frame(Some(&frame_with_arms(0.5, 0.4)));
        // Estimator dropout mid-descent: no state change, time still counts.
        for _ in 0..4 {
            let annotation = tracker.process_frame(None);
            assert!(annotation.landmarks.is_none());
        }
        tracker.process_frame(Some(&down));

        let report = tracker.finish();
        let push_ups = report.tally(Exercise::PushUp).unwrap();
        assert_eq!(push_ups.count, 1);
        assert!((push_ups.seconds - 0.6).abs() < 1e-9);
        assert_eq!(report.frames_detected, 2);
    }

    #[test]
    fn test_frames_outside_any_interval_do_not_classify() {
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(1.0, 2.0, Exercise::Squat)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();

        // A full squat cycle before the interval opens: nothing counted.
        tracker.process_frame(Some(&frame_with_legs(0.5, 0.4)));
        tracker.process_frame(Some(&frame_with_legs(0.5, 0.6)));
        tracker.process_frame(Some(&frame_with_legs(0.5, 0.4)));

        let last_frame = frame_with_legs(0.5, 0.4);
        let annotation = tracker.process_frame(Some(&last_frame));
        assert_eq!(annotation.active, None);

        let report = tracker.finish();
        assert!(report.exercises.is_empty());
    }

    #[test]
    fn test_annotation_reports_active_exercise() {
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(0.0, 1.0, Exercise::Lunge)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();

        let frame = frame_with_legs(0.5, 0.5);
        let annotation = tracker.process_frame(Some(&frame));
        assert_eq!(annotation.frame_index, 0);
        assert_eq!(annotation.active, Some(Exercise::Lunge));
        assert!(annotation.landmarks.is_some());
    }

    #[test]
    fn test_plank_time_follows_held_duration() {
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(0.0, 1.0, Exercise::Plank)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();

        // Aligned posture: shoulders and hips level.
        let mut aligned = frame_with_legs(0.5, 0.5);
        aligned.left_shoulder.y = 0.48;
        aligned.right_shoulder.y = 0.48;

        let mut previous = 0.0;
        for _ in 0..5 {
            std::thread::sleep(std::time::Duration::from_millis(1));
            tracker.process_frame(Some(&aligned));
            let held = tracker.tallies.plank.seconds;
            assert!(held >= previous);
            previous = held;
        }

        // Sagging posture freezes the reported time.
        let mut sagging = aligned.clone();
        sagging.left_hip.y = 0.7;
        sagging.right_hip.y = 0.7;
        tracker.process_frame(Some(&sagging));
        assert_eq!(tracker.tallies.plank.seconds, previous);

        let report = tracker.finish();
        let plank = report.tally(Exercise::Plank).unwrap();
        assert_eq!(plank.count, 0);
        assert!((plank.seconds - previous).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serializes_with_label_keys() {
        let plan = SessionPlan::new(
            10.0,
            vec![ExerciseInterval::new(0.0, 1.0, Exercise::Squat)],
        );
        let mut tracker = SessionTracker::new(&plan).unwrap();
        tracker.process_frame(Some(&frame_with_legs(0.5, 0.4)));
        tracker.process_frame(Some(&frame_with_legs(0.5, 0.6)));

        let report = tracker.finish();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exercises"]["squat"]["count"], 1);
        assert!(json["exercises"]["squat"]["time"].is_number());
        assert!(json["exercises"].get("push-up").is_none());
    }
}
