//! sos_monitord - low-light and SOS gesture monitor
//!
//! This daemon:
//! 1. Opens the configured frame source (fatal if it cannot)
//! 2. Runs brightness estimation and pose-based gesture classification per frame
//! 3. Debounces both signals into sparse alerts
//! 4. Hands alerts to the configured notifier
//! 5. Stops cleanly on Ctrl-C or end of stream

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sos_monitor::{
    build_notifier, open_backend, CameraSource, FrameSource, MonitorConfig, MonitoringPipeline,
    NoPosePolicy,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "SOS_MONITOR_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source URL (stub://<scene>, v4l2:///dev/videoN, images://<dir>).
    #[arg(long)]
    source: Option<String>,
    /// Pose backend (none, replay:<path>).
    #[arg(long)]
    pose: Option<String>,
    /// Mean luminance (0-255) below which the scene counts as dark.
    #[arg(long)]
    brightness_threshold: Option<f64>,
    /// Seconds between repeated alerts for a condition that stays true.
    #[arg(long)]
    cooldown_secs: Option<f64>,
    /// What the gesture alert does on frames with nobody detected (freeze, reset).
    #[arg(long)]
    no_pose_policy: Option<NoPosePolicy>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

impl Args {
    fn apply(&self, cfg: &mut MonitorConfig) -> Result<()> {
        if let Some(source) = &self.source {
            cfg.source.url = source.clone();
        }
        if let Some(pose) = &self.pose {
            cfg.pose.backend = pose.clone();
        }
        if let Some(threshold) = self.brightness_threshold {
            cfg.alerts.brightness_threshold = threshold;
        }
        if let Some(secs) = self.cooldown_secs {
            cfg.set_cooldown_secs(secs, "--cooldown-secs")?;
        }
        if let Some(policy) = self.no_pose_policy {
            cfg.alerts.no_pose_policy = policy;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = MonitorConfig::load_from(args.config.as_deref())?;
    args.apply(&mut cfg)?;
    cfg.validate()?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("install Ctrl-C handler")?;
    }

    let mut source = CameraSource::new(cfg.source.clone())?;
    source
        .connect()
        .with_context(|| format!("failed to open frame source {}", cfg.source.url))?;

    let mut pose = open_backend(&cfg.pose.backend, cfg.pose.min_detection_confidence)?;
    pose.warm_up()?;

    let notifier = build_notifier(&cfg.notifier.kind, &cfg.notifier.command)?;

    log::info!(
        "monitoring {} (pose={}, notifier={})",
        cfg.source.url,
        pose.name(),
        notifier.name()
    );
    log::info!(
        "brightness_threshold={:.1}, cooldown={:.1}s, no_pose_policy={:?}",
        cfg.alerts.brightness_threshold,
        cfg.alerts.cooldown.as_secs_f64(),
        cfg.alerts.no_pose_policy
    );
    log::info!("press Ctrl-C to stop");

    let mut pipeline = MonitoringPipeline::new(cfg.pipeline_settings(), notifier);
    let summary = pipeline.run(&mut source, pose.as_mut(), &stop, args.max_frames)?;

    drop(source);
    log::info!(
        "monitoring stopped ({:?}): frames={} no_pose={} pose_errors={} alerts low_light={} gesture={} notify_failures={} in {:.1}s",
        summary.stop_reason,
        summary.stats.frames_processed,
        summary.stats.no_pose_frames,
        summary.stats.pose_errors,
        summary.stats.low_light_alerts,
        summary.stats.gesture_alerts,
        summary.stats.notify_failures,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
