//! Distress gesture classification: both arms raised in a "Y".
//!
//! Each frame is classified on its own. Temporal stability is the alert
//! channel's job, not ours.

use crate::pose::{BodyPart, Keypoint, LandmarkSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn arm(self) -> (BodyPart, BodyPart, BodyPart) {
        match self {
            Side::Left => (
                BodyPart::LeftShoulder,
                BodyPart::LeftElbow,
                BodyPart::LeftWrist,
            ),
            Side::Right => (
                BodyPart::RightShoulder,
                BodyPart::RightElbow,
                BodyPart::RightWrist,
            ),
        }
    }
}

/// Per-arm classification of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureReading {
    pub left_raised: bool,
    pub right_raised: bool,
}

impl GestureReading {
    pub fn is_distress(&self) -> bool {
        self.left_raised && self.right_raised
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GestureClassifier {
    /// Keypoints below this visibility count as absent. 0.0 accepts any reported keypoint.
    min_visibility: f32,
}

impl GestureClassifier {
    pub fn new(min_visibility: f32) -> Self {
        Self { min_visibility }
    }

    pub fn min_visibility(&self) -> f32 {
        self.min_visibility
    }

    pub fn classify(&self, landmarks: &LandmarkSet) -> GestureReading {
        GestureReading {
            left_raised: self.arm_raised(landmarks, Side::Left),
            right_raised: self.arm_raised(landmarks, Side::Right),
        }
    }

    /// True iff both arms are raised. Missing keypoints never count as raised.
    pub fn is_distress_gesture(&self, landmarks: &LandmarkSet) -> bool {
        self.classify(landmarks).is_distress()
    }

    // Image y grows downward, so "above" means a smaller y. Normalized
    // coordinates compare the same as pixel ones.
    fn arm_raised(&self, landmarks: &LandmarkSet, side: Side) -> bool {
        let (shoulder, elbow, wrist) = side.arm();
        let (Some(shoulder), Some(elbow), Some(wrist)) = (
            self.usable(landmarks, shoulder),
            self.usable(landmarks, elbow),
            self.usable(landmarks, wrist),
        ) else {
            return false;
        };
        wrist.y < shoulder.y && elbow.y < shoulder.y
    }

    fn usable<'a>(&self, landmarks: &'a LandmarkSet, part: BodyPart) -> Option<&'a Keypoint> {
        landmarks
            .get(part)
            .filter(|kp| kp.visibility >= self.min_visibility)
    }
}
