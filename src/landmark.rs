use serde::{Deserialize, Serialize};

/// A single estimated body keypoint in normalized image coordinates.
///
/// Coordinates are relative to frame dimensions: x in [0, 1] left to right,
/// y in [0, 1] top to bottom. The visibility score is whatever confidence
/// the upstream pose estimator reports; it is carried through but not
/// consulted by any classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }
}

/// One frame's worth of pose estimation output for a single subject.
///
/// Only the joints the classifiers read are represented. The estimator is a
/// black box; whatever produces these frames must supply every joint, so a
/// deserialized frame is always complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_elbow: Landmark,
    pub right_elbow: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
    pub left_knee: Landmark,
    pub right_knee: Landmark,
    pub left_ankle: Landmark,
    pub right_ankle: Landmark,
}

impl LandmarkFrame {
    /// Vertical midline of the two shoulders.
    pub fn shoulder_y(&self) -> f64 {
        (self.left_shoulder.y + self.right_shoulder.y) / 2.0
    }

    /// Vertical midline of the two elbows.
    pub fn elbow_y(&self) -> f64 {
        (self.left_elbow.y + self.right_elbow.y) / 2.0
    }

    /// Vertical midline of the two hips.
    pub fn hip_y(&self) -> f64 {
        (self.left_hip.y + self.right_hip.y) / 2.0
    }

    /// Vertical midline of the two knees.
    pub fn knee_y(&self) -> f64 {
        (self.left_knee.y + self.right_knee.y) / 2.0
    }

    /// The knee closest to the left image edge, paired with the ankle of the
    /// same leg. Used to decide which leg is forward in a lunge.
    pub fn front_leg(&self) -> (&Landmark, &Landmark) {
        if self.left_knee.x < self.right_knee.x {
            (&self.left_knee, &self.left_ankle)
        } else {
            (&self.right_knee, &self.right_ankle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(y: f64) -> LandmarkFrame {
        let at = Landmark::new(0.5, y);
        LandmarkFrame {
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
        }
    }

    #[test]
    fn test_midlines_average_both_sides() {
        let mut frame = uniform_frame(0.5);
        frame.left_shoulder = Landmark::new(0.4, 0.2);
        frame.right_shoulder = Landmark::new(0.6, 0.4);

        assert!((frame.shoulder_y() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_front_leg_picks_smaller_x() {
        let mut frame = uniform_frame(0.5);
        frame.left_knee = Landmark::new(0.3, 0.7);
        frame.left_ankle = Landmark::new(0.32, 0.9);
        frame.right_knee = Landmark::new(0.6, 0.7);
        frame.right_ankle = Landmark::new(0.62, 0.9);

        let (knee, ankle) = frame.front_leg();
        assert_eq!(knee.x, 0.3);
        assert_eq!(ankle.x, 0.32);

        frame.left_knee.x = 0.8;
        let (knee, ankle) = frame.front_leg();
        assert_eq!(knee.x, 0.6);
        assert_eq!(ankle.x, 0.62);
    }

    #[test]
    fn test_frame_roundtrips_through_json() {
        let mut frame = uniform_frame(0.5);
        frame.left_shoulder = Landmark::with_visibility(0.4, 0.2, 0.98);

        let json = serde_json::to_string(&frame).unwrap();
        let back: LandmarkFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_frame_rejects_missing_joint() {
        // A frame without every named joint is a contract violation from the
        // estimator, surfaced as a deserialization error.
        let partial = r#"{"left_shoulder": {"x": 0.5, "y": 0.5}}"#;
        assert!(serde_json::from_str::<LandmarkFrame>(partial).is_err());
    }
}
