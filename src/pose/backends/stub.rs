use anyhow::Result;

use crate::frame::Frame;
use crate::pose::backend::PoseBackend;
use crate::pose::landmarks::LandmarkSet;

/// Backend that never detects anyone. Used when no pose model is configured,
/// so only the brightness signal is monitored.
#[derive(Default)]
pub struct StubBackend {
    frames_seen: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl PoseBackend for StubBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        self.frames_seen += 1;
        Ok(None)
    }
}
