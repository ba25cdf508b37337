//! Synthetic frame source (`stub://`) for tests and dry runs.
//!
//! Frames are uniform BGR images whose brightness follows a `LumaSchedule`:
//! - `stub://dark`: constantly below the default low-light threshold
//! - `stub://bright`: constantly well lit
//! - any other name: a lit scene that goes dark for a while, repeating

use anyhow::Result;
use rand::Rng;
use std::time::{Duration, Instant};

use super::{FrameSource, SourceConfig, SourceStats};
use crate::frame::{Frame, PixelFormat};

const BRIGHT_LUMA: u8 = 180;
const DARK_LUMA: u8 = 12;

/// Brightness script: `(luma, frames)` steps played in order.
#[derive(Clone, Debug, PartialEq)]
pub struct LumaSchedule {
    steps: Vec<(u8, u64)>,
    repeat: bool,
    /// Maximum per-frame luma jitter, applied uniformly to the whole frame.
    noise: u8,
}

impl LumaSchedule {
    /// Play `steps` once, then end the stream.
    pub fn once(steps: Vec<(u8, u64)>) -> Self {
        Self {
            steps,
            repeat: false,
            noise: 0,
        }
    }

    /// Play `steps` forever.
    pub fn cycle(steps: Vec<(u8, u64)>) -> Self {
        Self {
            steps,
            repeat: true,
            noise: 0,
        }
    }

    pub fn constant(luma: u8) -> Self {
        Self::cycle(vec![(luma, 1)])
    }

    pub fn with_noise(mut self, noise: u8) -> Self {
        self.noise = noise;
        self
    }

    /// Schedule for a `stub://` scene name.
    pub fn for_scene(name: &str) -> Self {
        match name {
            "dark" => Self::constant(DARK_LUMA),
            "bright" => Self::constant(BRIGHT_LUMA),
            _ => Self::cycle(vec![(BRIGHT_LUMA, 100), (DARK_LUMA, 30)]).with_noise(3),
        }
    }

    fn period(&self) -> u64 {
        self.steps.iter().map(|(_, frames)| *frames).sum()
    }

    /// Base luma for the zero-based frame `index`, or `None` past the end.
    fn luma_at(&self, index: u64) -> Option<u8> {
        let period = self.period();
        if period == 0 || (!self.repeat && index >= period) {
            return None;
        }
        let mut offset = index % period;
        for (luma, frames) in &self.steps {
            if offset < *frames {
                return Some(*luma);
            }
            offset -= frames;
        }
        None
    }
}

pub struct SyntheticSource {
    config: SourceConfig,
    schedule: LumaSchedule,
    frame_count: u64,
    last_frame_at: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        let scene = config.url.trim().trim_start_matches("stub://").to_string();
        let schedule = LumaSchedule::for_scene(&scene);
        Self::with_schedule(config, schedule)
    }

    pub fn with_schedule(config: SourceConfig, schedule: LumaSchedule) -> Self {
        Self {
            config,
            schedule,
            frame_count: 0,
            last_frame_at: None,
        }
    }

    /// Synthetic sources are always "connected".
    pub fn connect(&mut self) -> Result<()> {
        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            self.config.url,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(base) = self.schedule.luma_at(self.frame_count) else {
            log::info!(
                "SyntheticSource: {} ended after {} frames",
                self.config.url,
                self.frame_count
            );
            return Ok(None);
        };
        self.pace();
        self.frame_count += 1;

        let luma = self.jitter(base);
        let frame = Frame::uniform(
            self.config.width,
            self.config.height,
            PixelFormat::Bgr24,
            luma,
        )?;
        Ok(Some(frame.with_sequence(self.frame_count)))
    }

    pub fn is_healthy(&self) -> bool {
        true
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }

    fn jitter(&self, base: u8) -> u8 {
        if self.schedule.noise == 0 {
            return base;
        }
        let noise = self.schedule.noise as i16;
        let offset = rand::thread_rng().gen_range(-noise..=noise);
        (base as i16 + offset).clamp(0, 255) as u8
    }

    // Sleep off whatever is left of the frame interval, like a camera would.
    fn pace(&mut self) {
        if self.config.target_fps > 0 {
            let interval = Duration::from_secs(1) / self.config.target_fps;
            if let Some(last) = self.last_frame_at {
                let elapsed = last.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }
        self.last_frame_at = Some(Instant::now());
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        SyntheticSource::connect(self)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        SyntheticSource::next_frame(self)
    }

    fn is_healthy(&self) -> bool {
        SyntheticSource::is_healthy(self)
    }

    fn stats(&self) -> SourceStats {
        SyntheticSource::stats(self)
    }
}
