use crate::frame::{Frame, PixelFormat};

/// Default low-light threshold on the 0-255 luminance scale.
pub const DEFAULT_BRIGHTNESS_THRESHOLD: f64 = 30.0;

// ITU-R BT.601 luma weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Mean-luminance estimator.
///
/// Frames are validated at construction, so `estimate` is total: it never
/// sees a zero-area frame or a short buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrightnessEstimator;

impl BrightnessEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Arithmetic mean of per-pixel luminance, 0-255.
    pub fn estimate(&self, frame: &Frame) -> f64 {
        let pixels = frame.pixels();
        let count = frame.pixel_count();
        let sum: f64 = match frame.format() {
            PixelFormat::Gray8 => pixels.iter().map(|&p| p as f64).sum(),
            // The Y plane of NV12 already is the intensity channel.
            PixelFormat::Nv12 => pixels[..count].iter().map(|&p| p as f64).sum(),
            PixelFormat::Rgb24 => pixels
                .chunks_exact(3)
                .map(|px| luma(px[0], px[1], px[2]))
                .sum(),
            PixelFormat::Bgr24 => pixels
                .chunks_exact(3)
                .map(|px| luma(px[2], px[1], px[0]))
                .sum(),
        };
        sum / count as f64
    }
}

fn luma(r: u8, g: u8, b: u8) -> f64 {
    LUMA_R * r as f64 + LUMA_G * g as f64 + LUMA_B * b as f64
}

/// Low-light condition: strictly below the threshold.
pub fn is_low_light(score: f64, threshold: f64) -> bool {
    score < threshold
}
