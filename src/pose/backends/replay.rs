//! Replay backend.
//!
//! Reads pose model output recorded as JSON lines, one line per frame:
//!
//! ```text
//! null
//! {"score": 0.93, "landmarks": {"left_shoulder": {"x": 0.41, "y": 0.52, "visibility": 0.99}}}
//! {"score": 0.88, "landmarks": [{"x": 0.5, "y": 0.2, "visibility": 0.9}, null, ...]}
//! ```
//!
//! `landmarks` is either keyed by snake_case body part name or an array in
//! model index order. Records scoring below the minimum detection confidence
//! are reported as "no pose", as the model itself would. Once the file is
//! exhausted every further frame reports no pose.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::frame::Frame;
use crate::pose::backend::PoseBackend;
use crate::pose::landmarks::{Keypoint, LandmarkSet};

/// Default minimum detection confidence.
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default = "full_score")]
    score: f32,
    landmarks: ReplayLandmarks,
}

fn full_score() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLandmarks {
    Indexed(Vec<Option<Keypoint>>),
    Named(LandmarkSet),
}

impl ReplayLandmarks {
    fn into_set(self) -> LandmarkSet {
        match self {
            ReplayLandmarks::Indexed(points) => LandmarkSet::from_indexed(points),
            ReplayLandmarks::Named(set) => set,
        }
    }
}

pub struct ReplayBackend {
    reader: Box<dyn BufRead + Send>,
    source: String,
    min_detection_confidence: f32,
    line_no: u64,
    exhausted: bool,
}

impl ReplayBackend {
    pub fn open(path: &Path, min_detection_confidence: f32) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("open pose replay file {}", path.display()))?;
        Ok(Self::from_reader(
            BufReader::new(file),
            path.display().to_string(),
            min_detection_confidence,
        ))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(
        reader: R,
        source: impl Into<String>,
        min_detection_confidence: f32,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            source: source.into(),
            min_detection_confidence,
            line_no: 0,
            exhausted: false,
        }
    }

    /// Number of records consumed so far.
    pub fn records_read(&self) -> u64 {
        self.line_no
    }

    fn next_record(&mut self) -> Result<Option<ReplayRecord>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .with_context(|| format!("read pose replay {}", self.source))?;
        if read == 0 {
            self.exhausted = true;
            log::info!(
                "ReplayBackend: {} exhausted after {} records",
                self.source,
                self.line_no
            );
            return Ok(None);
        }
        self.line_no += 1;

        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<ReplayRecord>>(line)
            .with_context(|| format!("invalid pose record at {}:{}", self.source, self.line_no))
    }
}

impl PoseBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        let Some(record) = self.next_record()? else {
            return Ok(None);
        };
        if record.score < self.min_detection_confidence {
            log::trace!(
                "ReplayBackend: record {} below detection confidence ({:.2} < {:.2})",
                self.line_no,
                record.score,
                self.min_detection_confidence
            );
            return Ok(None);
        }
        Ok(Some(record.landmarks.into_set()))
    }
}
