//! Text annotations for operator display.
//!
//! A pure render of one frame's pipeline output: pixel-space coordinates for
//! a few body landmarks and a gesture marker. Nothing here feeds back into
//! the pipeline.

use crate::pose::{BodyPart, LandmarkSet};

pub const GESTURE_MARKER: &str = "SOS GESTURE DETECTED!";

const LABELLED_PARTS: [(BodyPart, &str); 5] = [
    (BodyPart::Nose, "Head"),
    (BodyPart::LeftWrist, "L.Hand"),
    (BodyPart::RightWrist, "R.Hand"),
    (BodyPart::LeftAnkle, "L.Foot"),
    (BodyPart::RightAnkle, "R.Foot"),
];

// Labels sit this many pixels above their landmark.
const LABEL_OFFSET_Y: i64 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    /// Anchor position in pixels.
    pub x: i64,
    pub y: i64,
}

/// Annotations for one frame. Landmarks the model did not report are skipped.
pub fn annotate(
    landmarks: &LandmarkSet,
    gesture_detected: bool,
    width: u32,
    height: u32,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    if gesture_detected {
        annotations.push(Annotation {
            text: GESTURE_MARKER.to_string(),
            x: 10,
            y: 60,
        });
    }
    for (part, label) in LABELLED_PARTS {
        let Some(kp) = landmarks.get(part) else {
            continue;
        };
        let (x, y) = kp.to_pixel(width, height);
        annotations.push(Annotation {
            text: format!("{}: ({}, {})", label, x, y),
            x,
            y: y - LABEL_OFFSET_Y,
        });
    }
    annotations
}
