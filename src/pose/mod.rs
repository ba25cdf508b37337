//! Pose estimation boundary.
//!
//! The pose model is an external collaborator. This module defines the data
//! it hands over (`LandmarkSet`) and the `PoseBackend` seam, plus the
//! backends selectable from configuration:
//! - `none`: no model, never detects a person
//! - `replay:<path>`: recorded model output, one JSON line per frame

use anyhow::{anyhow, Result};
use std::path::Path;

mod backend;
mod backends;
mod landmarks;

pub use backend::PoseBackend;
pub use backends::{ReplayBackend, StubBackend, DEFAULT_MIN_DETECTION_CONFIDENCE};
pub use landmarks::{BodyPart, Keypoint, LandmarkSet};

/// Open the backend named by a configuration string.
pub fn open_backend(spec: &str, min_detection_confidence: f32) -> Result<Box<dyn PoseBackend>> {
    let spec = spec.trim();
    if spec.is_empty() || spec == "none" || spec == "stub" {
        return Ok(Box::new(StubBackend::new()));
    }
    if let Some(path) = spec.strip_prefix("replay:") {
        if path.is_empty() {
            return Err(anyhow!("replay pose backend requires a file path"));
        }
        let backend = ReplayBackend::open(Path::new(path), min_detection_confidence)?;
        return Ok(Box::new(backend));
    }
    Err(anyhow!(
        "unknown pose backend '{}'; expected 'none' or 'replay:<path>'",
        spec
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_backend_selects_by_name() -> Result<()> {
        assert_eq!(open_backend("none", 0.5)?.name(), "none");
        assert_eq!(open_backend("", 0.5)?.name(), "none");

        let file = tempfile::NamedTempFile::new()?;
        let spec = format!("replay:{}", file.path().display());
        assert_eq!(open_backend(&spec, 0.5)?.name(), "replay");
        Ok(())
    }

    #[test]
    fn open_backend_rejects_unknown_names() {
        assert!(open_backend("tract:model.onnx", 0.5).is_err());
        assert!(open_backend("replay:", 0.5).is_err());
        assert!(open_backend("replay:/nonexistent/poses.jsonl", 0.5).is_err());
    }
}
