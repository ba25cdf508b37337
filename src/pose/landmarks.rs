use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single body keypoint in normalized image coordinates.
///
/// `x` and `y` are relative to frame width and height; `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Keypoint {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Pixel position for a frame of the given size, truncated like a draw call would.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i64, i64) {
        (
            (self.x as f64 * width as f64) as i64,
            (self.y as f64 * height as f64) as i64,
        )
    }
}

/// The 33-point body topology reported by common single-person pose models.
///
/// Discriminants are the model output indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyPart {
    pub const COUNT: usize = 33;

    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEyeInner,
        BodyPart::LeftEye,
        BodyPart::LeftEyeOuter,
        BodyPart::RightEyeInner,
        BodyPart::RightEye,
        BodyPart::RightEyeOuter,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::MouthLeft,
        BodyPart::MouthRight,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftPinky,
        BodyPart::RightPinky,
        BodyPart::LeftIndex,
        BodyPart::RightIndex,
        BodyPart::LeftThumb,
        BodyPart::RightThumb,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
        BodyPart::LeftHeel,
        BodyPart::RightHeel,
        BodyPart::LeftFootIndex,
        BodyPart::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Keypoints reported for one frame. Parts the model did not report are absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: BTreeMap<BodyPart, Keypoint>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from index-ordered model output. Entries past the known topology are ignored.
    pub fn from_indexed<I>(keypoints: I) -> Self
    where
        I: IntoIterator<Item = Option<Keypoint>>,
    {
        let points = keypoints
            .into_iter()
            .enumerate()
            .filter_map(|(index, kp)| Some((BodyPart::from_index(index)?, kp?)))
            .collect();
        Self { points }
    }

    pub fn insert(&mut self, part: BodyPart, keypoint: Keypoint) -> Option<Keypoint> {
        self.points.insert(part, keypoint)
    }

    pub fn with(mut self, part: BodyPart, keypoint: Keypoint) -> Self {
        self.points.insert(part, keypoint);
        self
    }

    pub fn get(&self, part: BodyPart) -> Option<&Keypoint> {
        self.points.get(&part)
    }

    pub fn remove(&mut self, part: BodyPart) -> Option<Keypoint> {
        self.points.remove(&part)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, &Keypoint)> {
        self.points.iter().map(|(part, kp)| (*part, kp))
    }
}
