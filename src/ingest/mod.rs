//! Frame acquisition.
//!
//! Sources are selected by URL:
//! - `stub://<scene>`: synthetic frames with a scripted brightness schedule
//! - `v4l2:///dev/videoN` or `/dev/videoN`: local camera (feature: ingest-v4l2)
//! - `images://<dir>`: a directory of still images replayed in name order
//!   (feature: ingest-images)
//!
//! Every source hands out validated `Frame`s numbered from 1. `Ok(None)` means
//! the stream ended cleanly; `Err` is an acquisition failure and is fatal to
//! the pipeline.

use anyhow::{anyhow, Result};

use crate::frame::Frame;

#[cfg(feature = "ingest-images")]
pub mod images;
#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

#[cfg(feature = "ingest-images")]
pub use images::ImageDirSource;
pub use synthetic::{LumaSchedule, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

pub const DEFAULT_SOURCE_URL: &str = "stub://camera";
pub const DEFAULT_TARGET_FPS: u32 = 10;
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Configuration shared by all frame sources.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    /// Source URL, see module docs.
    pub url: String,
    /// Target frame rate. Synthetic sources pace themselves to it; 0 disables pacing.
    pub target_fps: u32,
    /// Requested frame width.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            target_fps: DEFAULT_TARGET_FPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

pub trait FrameSource {
    /// Open the underlying device or stream. Failure here is fatal.
    fn connect(&mut self) -> Result<()>;

    /// Block until the next frame is available. `Ok(None)` is end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Frame source chosen from a `SourceConfig` URL.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-v4l2")]
    V4l2(V4l2Source),
    #[cfg(feature = "ingest-images")]
    Images(ImageDirSource),
}

impl CameraSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(anyhow!("frame source url must not be empty"));
        }
        if url.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticSource::new(config)),
            });
        }
        if url.starts_with("v4l2://") || url.starts_with("/dev/video") {
            #[cfg(feature = "ingest-v4l2")]
            {
                return Ok(Self {
                    backend: CameraBackend::V4l2(V4l2Source::new(config)?),
                });
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                return Err(anyhow!("camera capture requires the ingest-v4l2 feature"));
            }
        }
        if url.starts_with("images://") {
            #[cfg(feature = "ingest-images")]
            {
                return Ok(Self {
                    backend: CameraBackend::Images(ImageDirSource::new(config)?),
                });
            }
            #[cfg(not(feature = "ingest-images"))]
            {
                return Err(anyhow!(
                    "image directory replay requires the ingest-images feature"
                ));
            }
        }
        Err(anyhow!("unsupported frame source url '{}'", url))
    }
}

impl FrameSource for CameraSource {
    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.connect(),
            #[cfg(feature = "ingest-images")]
            CameraBackend::Images(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.next_frame(),
            #[cfg(feature = "ingest-images")]
            CameraBackend::Images(source) => source.next_frame(),
        }
    }

    fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.is_healthy(),
            #[cfg(feature = "ingest-images")]
            CameraBackend::Images(source) => source.is_healthy(),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
            #[cfg(feature = "ingest-images")]
            CameraBackend::Images(source) => source.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> SourceConfig {
        SourceConfig {
            url: url.to_string(),
            target_fps: 0,
            width: 32,
            height: 24,
        }
    }

    #[test]
    fn stub_urls_open_synthetic_source() -> Result<()> {
        let mut source = CameraSource::new(config("stub://dark"))?;
        source.connect()?;
        let frame = source.next_frame()?.expect("synthetic frame");
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 24);
        assert_eq!(frame.sequence(), 1);
        assert!(source.is_healthy());
        assert_eq!(source.stats().frames_captured, 1);
        Ok(())
    }

    #[test]
    fn rejects_unknown_and_empty_urls() {
        assert!(CameraSource::new(config("rtsp://camera")).is_err());
        assert!(CameraSource::new(config("  ")).is_err());
    }

    #[cfg(not(feature = "ingest-v4l2"))]
    #[test]
    fn camera_urls_require_feature() {
        let err = CameraSource::new(config("/dev/video0")).err().unwrap();
        assert!(err.to_string().contains("ingest-v4l2"));
    }
}
