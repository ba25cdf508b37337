//! Per-frame monitoring loop.
//!
//! For every acquired frame:
//! 1. estimate brightness and sample the low-light channel;
//! 2. ask the pose backend for landmarks;
//! 3. if a person was found, classify the gesture and sample the gesture
//!    channel; if not, leave that channel untouched (or reset it, under
//!    `NoPosePolicy::Reset`);
//! 4. hand fired alerts to the notifier.
//!
//! Acquisition errors end the run. Pose errors and notifier failures are
//! logged and only affect the frame they happened on; a pose error leaves the
//! gesture channel alone whatever the `NoPosePolicy`.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::alert::{AlertChannel, AlertKind, DEFAULT_ALERT_COOLDOWN};
use crate::brightness::{is_low_light, BrightnessEstimator, DEFAULT_BRIGHTNESS_THRESHOLD};
use crate::frame::Frame;
use crate::gesture::{GestureClassifier, GestureReading};
use crate::ingest::FrameSource;
use crate::notify::Notifier;
use crate::overlay;
use crate::pose::{LandmarkSet, PoseBackend};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// What to do with the gesture channel on frames where nobody was detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPosePolicy {
    /// Leave the channel as it was. A person briefly lost by the model keeps
    /// their alert state.
    #[default]
    Freeze,
    /// Treat "no pose" as "gesture absent", resetting the channel.
    Reset,
}

impl FromStr for NoPosePolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "freeze" => Ok(NoPosePolicy::Freeze),
            "reset" => Ok(NoPosePolicy::Reset),
            other => Err(anyhow!(
                "unknown no-pose policy '{}'; expected 'freeze' or 'reset'",
                other
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub brightness_threshold: f64,
    pub cooldown: Duration,
    /// Consecutive false samples before a channel resets.
    pub release_after: u32,
    pub min_visibility: f32,
    pub no_pose_policy: NoPosePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            cooldown: DEFAULT_ALERT_COOLDOWN,
            release_after: 1,
            min_visibility: 0.0,
            no_pose_policy: NoPosePolicy::Freeze,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    /// No person in the frame; the gesture channel was not asked.
    NoPose,
    /// The pose backend failed on this frame; the gesture channel was not asked.
    PoseError,
    Classified(GestureReading),
}

impl GestureOutcome {
    pub fn is_distress(&self) -> bool {
        matches!(self, GestureOutcome::Classified(reading) if reading.is_distress())
    }
}

/// Result of processing one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub sequence: u64,
    pub brightness: f64,
    pub low_light: bool,
    pub gesture: GestureOutcome,
    /// Alerts that fired on this frame, in dispatch order.
    pub alerts: Vec<AlertKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    StopRequested,
    EndOfStream,
    FrameLimit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub no_pose_frames: u64,
    pub pose_errors: u64,
    pub low_light_alerts: u64,
    pub gesture_alerts: u64,
    pub notify_failures: u64,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub stats: PipelineStats,
    pub elapsed: Duration,
}

/// What the pose backend produced for one frame.
#[derive(Clone, Copy, Debug)]
pub enum PoseObservation<'a> {
    Detected(&'a LandmarkSet),
    NoPose,
    Failed,
}

impl<'a> From<Option<&'a LandmarkSet>> for PoseObservation<'a> {
    fn from(landmarks: Option<&'a LandmarkSet>) -> Self {
        match landmarks {
            Some(landmarks) => PoseObservation::Detected(landmarks),
            None => PoseObservation::NoPose,
        }
    }
}

pub struct MonitoringPipeline {
    settings: PipelineSettings,
    estimator: BrightnessEstimator,
    classifier: GestureClassifier,
    low_light: AlertChannel,
    gesture: AlertChannel,
    notifier: Box<dyn Notifier>,
    stats: PipelineStats,
}

impl MonitoringPipeline {
    pub fn new(settings: PipelineSettings, notifier: Box<dyn Notifier>) -> Self {
        // Both conditions share one debounce policy.
        let channel = AlertChannel::new(settings.cooldown).with_release_after(settings.release_after);
        Self {
            estimator: BrightnessEstimator::new(),
            classifier: GestureClassifier::new(settings.min_visibility),
            low_light: channel.clone(),
            gesture: channel,
            settings,
            notifier,
            stats: PipelineStats::default(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn low_light_channel(&self) -> &AlertChannel {
        &self.low_light
    }

    pub fn gesture_channel(&self) -> &AlertChannel {
        &self.gesture
    }

    /// Process one frame and whatever the pose backend reported for it.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        landmarks: Option<&LandmarkSet>,
        now: Instant,
    ) -> FrameReport {
        self.process_observation(frame, landmarks.into(), now)
    }

    /// Like `process_frame`, but also accepts a failed inference, which
    /// samples only the low-light channel.
    pub fn process_observation(
        &mut self,
        frame: &Frame,
        pose: PoseObservation<'_>,
        now: Instant,
    ) -> FrameReport {
        self.stats.frames_processed += 1;
        let mut alerts = Vec::new();

        let brightness = self.estimator.estimate(frame);
        let low_light = is_low_light(brightness, self.settings.brightness_threshold);
        log::debug!(
            "frame #{} brightness={:.2}{}",
            frame.sequence(),
            brightness,
            if low_light { " (low light)" } else { "" }
        );
        if self.low_light.sample(low_light, now) {
            alerts.push(AlertKind::LowLight);
        }

        let gesture = match pose {
            PoseObservation::Detected(landmarks) => {
                let reading = self.classifier.classify(landmarks);
                if self.gesture.sample(reading.is_distress(), now) {
                    alerts.push(AlertKind::DistressGesture);
                }
                if log::log_enabled!(log::Level::Debug) {
                    let annotations = overlay::annotate(
                        landmarks,
                        reading.is_distress(),
                        frame.width(),
                        frame.height(),
                    );
                    for annotation in annotations {
                        log::debug!("frame #{} overlay {}", frame.sequence(), annotation.text);
                    }
                }
                GestureOutcome::Classified(reading)
            }
            PoseObservation::NoPose => {
                self.stats.no_pose_frames += 1;
                if self.settings.no_pose_policy == NoPosePolicy::Reset {
                    self.gesture.sample(false, now);
                }
                GestureOutcome::NoPose
            }
            PoseObservation::Failed => GestureOutcome::PoseError,
        };

        for kind in &alerts {
            self.dispatch(*kind, frame.sequence());
        }

        FrameReport {
            sequence: frame.sequence(),
            brightness,
            low_light,
            gesture,
            alerts,
        }
    }

    /// Drive the pipeline until stop, end of stream, or `max_frames`.
    ///
    /// `stop` is checked once per frame; a frame in flight always completes.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        pose: &mut dyn PoseBackend,
        stop: &AtomicBool,
        max_frames: Option<u64>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let mut last_health_log = Instant::now();
        let mut frames_this_run = 0u64;

        let stop_reason = loop {
            if stop.load(Ordering::SeqCst) {
                break StopReason::StopRequested;
            }
            if max_frames.is_some_and(|max| frames_this_run >= max) {
                break StopReason::FrameLimit;
            }

            let Some(frame) = source.next_frame().context("frame acquisition failed")? else {
                break StopReason::EndOfStream;
            };
            frames_this_run += 1;

            let inferred = pose.infer(&frame);
            let observation = match &inferred {
                Ok(landmarks) => PoseObservation::from(landmarks.as_ref()),
                Err(e) => {
                    self.stats.pose_errors += 1;
                    log::warn!(
                        "pose backend {} failed on frame #{}: {:#}",
                        pose.name(),
                        frame.sequence(),
                        e
                    );
                    PoseObservation::Failed
                }
            };
            self.process_observation(&frame, observation, frame.captured_at());

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let source_stats = source.stats();
                let fps = frames_this_run as f64 / started.elapsed().as_secs_f64();
                log::info!(
                    "source health={} frames={} fps={:.1} url={} alerts low_light={} gesture={}",
                    source.is_healthy(),
                    source_stats.frames_captured,
                    fps,
                    source_stats.url,
                    self.stats.low_light_alerts,
                    self.stats.gesture_alerts
                );
                last_health_log = Instant::now();
            }
        };

        log::info!(
            "monitoring loop finished ({:?}) after {} frames",
            stop_reason,
            frames_this_run
        );
        Ok(RunSummary {
            stop_reason,
            stats: self.stats.clone(),
            elapsed: started.elapsed(),
        })
    }

    fn dispatch(&mut self, kind: AlertKind, sequence: u64) {
        match kind {
            AlertKind::LowLight => self.stats.low_light_alerts += 1,
            AlertKind::DistressGesture => self.stats.gesture_alerts += 1,
        }
        log::info!("alert {:?} fired on frame #{}", kind, sequence);
        if let Err(e) = self.notifier.notify(kind.title(), kind.body()) {
            self.stats.notify_failures += 1;
            log::error!(
                "notifier {} failed to deliver {:?}: {:#}",
                self.notifier.name(),
                kind,
                e
            );
        }
    }
}
