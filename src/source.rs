//! Ingest boundary: recorded pose-estimator output and session plan files.
//!
//! The pose estimator is an external collaborator; the engine consumes its
//! per-frame output as a JSONL stream, one line per video frame, each line
//! either a landmark frame object or `null` for a frame with no detection.

use crate::error::{Result, SourceError};
use crate::landmark::LandmarkFrame;
use crate::schedule::SessionPlan;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// One frame's estimator output: a detection or the lack of one.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseObservation {
    Detected(LandmarkFrame),
    Missing,
}

impl PoseObservation {
    pub fn landmarks(&self) -> Option<&LandmarkFrame> {
        match self {
            PoseObservation::Detected(frame) => Some(frame),
            PoseObservation::Missing => None,
        }
    }
}

/// Reader over a recorded landmark stream. Line order is frame order; blank
/// lines are ignored.
pub struct JsonlPoseSource<R> {
    reader: R,
    line: u64,
}

impl JsonlPoseSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading landmark stream from {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlPoseSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    /// Next frame's observation, or `None` at end of stream.
    pub fn next_observation(&mut self) -> Result<Option<PoseObservation>> {
        loop {
            let mut buffer = String::new();
            let read = self
                .reader
                .read_line(&mut buffer)
                .map_err(|source| SourceError::StreamRead {
                    line: self.line + 1,
                    source,
                })?;
            if read == 0 {
                debug!("Landmark stream exhausted after {} lines", self.line);
                return Ok(None);
            }
            self.line += 1;

            let trimmed = buffer.trim();
            if trimmed.is_empty() {
                continue;
            }

            let parsed: Option<LandmarkFrame> =
                serde_json::from_str(trimmed).map_err(|source| SourceError::MalformedFrame {
                    line: self.line,
                    source,
                })?;

            return Ok(Some(match parsed {
                Some(frame) => PoseObservation::Detected(frame),
                None => PoseObservation::Missing,
            }));
        }
    }
}

impl<R: BufRead> Iterator for JsonlPoseSource<R> {
    type Item = Result<PoseObservation>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_observation().transpose()
    }
}

/// Load and validate a session plan from a TOML or JSON file. Any malformed
/// bound, ordering violation or unknown exercise label fails here, before a
/// single frame is read.
pub fn load_session_plan<P: AsRef<Path>>(path: P) -> Result<SessionPlan> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;

    let plan: SessionPlan = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)?,
        Some("json") => serde_json::from_str(&contents)?,
        _ => {
            return Err(SourceError::UnsupportedPlanFormat {
                path: path.display().to_string(),
            }
            .into())
        }
    };

    plan.validate()?;
    info!(
        "Loaded session plan from {}: {} intervals at {} fps",
        path.display(),
        plan.intervals.len(),
        plan.fps
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepcamError;
    use crate::exercise::Exercise;
    use std::io::Cursor;
    use std::io::Write;

    const FRAME_JSON: &str = r#"{"left_shoulder":{"x":0.5,"y":0.3},"right_shoulder":{"x":0.6,"y":0.3},"left_elbow":{"x":0.4,"y":0.4},"right_elbow":{"x":0.7,"y":0.4},"left_hip":{"x":0.5,"y":0.5},"right_hip":{"x":0.6,"y":0.5},"left_knee":{"x":0.5,"y":0.7},"right_knee":{"x":0.6,"y":0.7},"left_ankle":{"x":0.5,"y":0.9},"right_ankle":{"x":0.6,"y":0.9}}"#;

    #[test]
    fn test_stream_yields_detections_and_gaps_in_order() {
        let input = format!("{}\nnull\n{}\n", FRAME_JSON, FRAME_JSON);
        let mut source = JsonlPoseSource::new(Cursor::new(input));

        assert!(matches!(
            source.next_observation().unwrap(),
            Some(PoseObservation::Detected(_))
        ));
        assert_eq!(
            source.next_observation().unwrap(),
            Some(PoseObservation::Missing)
        );
        assert!(matches!(
            source.next_observation().unwrap(),
            Some(PoseObservation::Detected(_))
        ));
        assert_eq!(source.next_observation().unwrap(), None);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = format!("\n{}\n\n", FRAME_JSON);
        let observations: Vec<_> = JsonlPoseSource::new(Cursor::new(input))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(observations.len(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = format!("{}\nnot json\n", FRAME_JSON);
        let mut source = JsonlPoseSource::new(Cursor::new(input));
        source.next_observation().unwrap();

        let err = source.next_observation().unwrap_err();
        match err {
            RepcamError::Source(SourceError::MalformedFrame { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_loads_toml_session_plan() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "fps = 30.0\n\n[[interval]]\nstart = 0.0\nend = 12.0\nexercise = \"squat\"\n\n[[interval]]\nstart = 12.0\nend = 20.0\nexercise = \"plank\"\n"
        )
        .unwrap();

        let plan = load_session_plan(file.path()).unwrap();
        assert_eq!(plan.fps, 30.0);
        assert_eq!(plan.intervals.len(), 2);
        assert_eq!(plan.intervals[0].exercise, Exercise::Squat);
        assert_eq!(plan.intervals[1].exercise, Exercise::Plank);
    }

    #[test]
    fn test_loads_json_session_plan() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"fps": 24.0, "interval": [{{"start": 1.0, "end": 2.0, "exercise": "pull-up"}}]}}"#
        )
        .unwrap();

        let plan = load_session_plan(file.path()).unwrap();
        assert_eq!(plan.fps, 24.0);
        assert_eq!(plan.intervals[0].exercise, Exercise::PullUp);
    }

    #[test]
    fn test_unknown_label_fails_at_plan_load() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "fps = 30.0\n\n[[interval]]\nstart = 0.0\nend = 5.0\nexercise = \"burpee\"\n"
        )
        .unwrap();

        assert!(matches!(
            load_session_plan(file.path()),
            Err(RepcamError::Toml(_))
        ));
    }

    #[test]
    fn test_invalid_bounds_fail_at_plan_load() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "fps = 30.0\n\n[[interval]]\nstart = 9.0\nend = 4.0\nexercise = \"squat\"\n"
        )
        .unwrap();

        assert!(matches!(
            load_session_plan(file.path()),
            Err(RepcamError::Schedule(_))
        ));
    }

    #[test]
    fn test_unsupported_plan_extension_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "fps: 30").unwrap();

        assert!(matches!(
            load_session_plan(file.path()),
            Err(RepcamError::Source(SourceError::UnsupportedPlanFormat { .. }))
        ));
    }
}
