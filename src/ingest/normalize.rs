use anyhow::{anyhow, Result};

use crate::frame::{Frame, PixelFormat};

/// Layouts camera drivers commonly hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaptureFormat {
    Rgb24,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuyv,
    Nv12,
}

impl CaptureFormat {
    pub(crate) fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(CaptureFormat::Rgb24),
            b"YUYV" => Some(CaptureFormat::Yuyv),
            b"NV12" => Some(CaptureFormat::Nv12),
            _ => None,
        }
    }
}

/// Turn a driver buffer into a `Frame`.
///
/// Drivers may hand out buffers longer than the image (padding to page size),
/// so only the leading image bytes are kept. YUYV keeps just its luma bytes;
/// nothing downstream needs chroma from it.
pub(crate) fn capture_to_frame(
    buf: &[u8],
    width: u32,
    height: u32,
    format: CaptureFormat,
) -> Result<Frame> {
    match format {
        CaptureFormat::Rgb24 => {
            let expected = PixelFormat::Rgb24.buffer_len(width, height)?;
            let pixels = leading(buf, expected, "RGB")?;
            Frame::new(pixels.to_vec(), width, height, PixelFormat::Rgb24)
        }
        CaptureFormat::Nv12 => {
            let expected = PixelFormat::Nv12.buffer_len(width, height)?;
            let pixels = leading(buf, expected, "NV12")?;
            Frame::new(pixels.to_vec(), width, height, PixelFormat::Nv12)
        }
        CaptureFormat::Yuyv => {
            let expected = PixelFormat::Gray8
                .buffer_len(width, height)?
                .checked_mul(2)
                .ok_or_else(|| anyhow!("YUYV frame dimensions overflow"))?;
            let pixels = leading(buf, expected, "YUYV")?;
            let luma = pixels.iter().step_by(2).copied().collect();
            Frame::new(luma, width, height, PixelFormat::Gray8)
        }
    }
}

fn leading<'a>(buf: &'a [u8], expected: usize, label: &str) -> Result<&'a [u8]> {
    buf.get(..expected).ok_or_else(|| {
        anyhow!(
            "{} frame too short: expected {}, got {}",
            label,
            expected,
            buf.len()
        )
    })
}
