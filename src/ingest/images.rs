//! Image directory source (`images://<dir>`).
//!
//! Replays JPEG/PNG stills in lexical file-name order, one frame each, and
//! ends the stream after the last file. Handy for checking thresholds against
//! recorded footage exported as stills.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use super::{SourceConfig, SourceStats};
use crate::frame::{Frame, PixelFormat};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub struct ImageDirSource {
    config: SourceConfig,
    dir: PathBuf,
    files: Vec<PathBuf>,
    next_index: usize,
    frame_count: u64,
    last_error: Option<String>,
}

impl ImageDirSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let dir = config
            .url
            .trim()
            .strip_prefix("images://")
            .ok_or_else(|| anyhow!("image source url must start with images://"))?;
        if dir.is_empty() {
            return Err(anyhow!("image source requires a directory"));
        }
        Ok(Self {
            dir: PathBuf::from(dir),
            config,
            files: Vec::new(),
            next_index: 0,
            frame_count: 0,
            last_error: None,
        })
    }

    pub fn connect(&mut self) -> Result<()> {
        self.files = list_images(&self.dir)?;
        if self.files.is_empty() {
            return Err(anyhow!("no images found in {}", self.dir.display()));
        }
        log::info!(
            "ImageDirSource: {} images queued from {}",
            self.files.len(),
            self.dir.display()
        );
        Ok(())
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next_index) else {
            return Ok(None);
        };
        self.next_index += 1;

        let frame = decode(path).map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.frame_count += 1;
        Ok(Some(frame.with_sequence(self.frame_count)))
    }

    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read image dir {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn decode(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("decode image {}", path.display()))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    Frame::new(image.into_raw(), width, height, PixelFormat::Rgb24)
}
