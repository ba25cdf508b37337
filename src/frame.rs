//! Frame container handed from the ingest layer to the pipeline.
//!
//! A `Frame` is validated once at construction: non-zero dimensions and a
//! buffer length matching the declared pixel format. Everything downstream
//! (brightness, pose backends, overlay) can then treat it as well-formed.

use anyhow::{anyhow, Result};
use std::time::Instant;

/// Pixel layout of a frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte of intensity per pixel.
    Gray8,
    /// Packed R, G, B bytes.
    Rgb24,
    /// Packed B, G, R bytes (the usual camera/OpenCV order).
    Bgr24,
    /// Full-resolution Y plane followed by an interleaved half-resolution UV plane.
    Nv12,
}

impl PixelFormat {
    /// Expected buffer length for a frame of the given dimensions.
    pub fn buffer_len(self, width: u32, height: u32) -> Result<usize> {
        let area = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        let len = match self {
            PixelFormat::Gray8 => Some(area),
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => area.checked_mul(3),
            PixelFormat::Nv12 => area.checked_add(area / 2),
        };
        len.ok_or_else(|| anyhow!("frame dimensions overflow"))
    }
}

/// One acquired video frame.
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    /// Position of this frame in its source's stream, starting at 1.
    sequence: u64,
    captured_at: Instant,
}

impl Frame {
    /// Wrap a pixel buffer. Rejects zero-area frames and length mismatches.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("zero-area frame ({}x{})", width, height));
        }
        if format == PixelFormat::Nv12 && (width % 2 != 0 || height % 2 != 0) {
            return Err(anyhow!(
                "NV12 frame dimensions must be even, got {}x{}",
                width,
                height
            ));
        }
        let expected = format.buffer_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "{:?} frame length mismatch: expected {}, got {}",
                format,
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            sequence: 0,
            captured_at: Instant::now(),
        })
    }

    /// A frame where every pixel has intensity `value`.
    ///
    /// Colour formats repeat `value` in every channel; NV12 gets a neutral
    /// chroma plane so the decoded colour is gray as well.
    pub fn uniform(width: u32, height: u32, format: PixelFormat, value: u8) -> Result<Self> {
        let len = format.buffer_len(width, height)?;
        let mut data = vec![value; len];
        if format == PixelFormat::Nv12 {
            let y_plane = width as usize * height as usize;
            data[y_plane..].fill(128);
        }
        Self::new(data, width, height, format)
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Override the capture timestamp, e.g. with a driver-reported one.
    pub fn with_captured_at(mut self, captured_at: Instant) -> Self {
        self.captured_at = captured_at;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Raw pixel bytes in `format()` layout. Pose backends read this.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}
