use anyhow::Result;

use crate::frame::Frame;

use super::landmarks::LandmarkSet;

/// Pose estimation backend.
///
/// Backends are black boxes to the pipeline: a frame goes in, the keypoints
/// of the single most prominent person come out, or `None` when nobody was
/// detected. An `Err` is a per-frame fault; the pipeline logs it and moves on.
pub trait PoseBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run pose inference on a frame.
    ///
    /// Implementations must treat the frame as read-only and must not retain
    /// pixel data past the call.
    fn infer(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
