use anyhow::{anyhow, Result};
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sos_monitor::ingest::SourceStats;
use sos_monitor::pose::{ReplayBackend, StubBackend};
use sos_monitor::{
    AlertKind, BodyPart, Frame, FrameSource, Keypoint, LandmarkSet, LumaSchedule,
    MonitoringPipeline, NoPosePolicy, Notifier, PipelineSettings, PixelFormat, PoseBackend,
    SourceConfig, StopReason, SyntheticSource,
};

#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<String>>>,
}

impl Notifier for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn notify(&mut self, title: &str, _body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(title.to_string());
        Ok(())
    }
}

fn source_config() -> SourceConfig {
    SourceConfig {
        url: "stub://scenario".to_string(),
        target_fps: 0,
        width: 32,
        height: 24,
    }
}

fn raised_arms() -> LandmarkSet {
    LandmarkSet::new()
        .with(BodyPart::LeftShoulder, Keypoint::new(0.6, 0.5, 0.9))
        .with(BodyPart::LeftElbow, Keypoint::new(0.7, 0.35, 0.9))
        .with(BodyPart::LeftWrist, Keypoint::new(0.7, 0.2, 0.9))
        .with(BodyPart::RightShoulder, Keypoint::new(0.4, 0.5, 0.9))
        .with(BodyPart::RightElbow, Keypoint::new(0.3, 0.35, 0.9))
        .with(BodyPart::RightWrist, Keypoint::new(0.3, 0.2, 0.9))
}

fn arms_down() -> LandmarkSet {
    raised_arms()
        .with(BodyPart::LeftWrist, Keypoint::new(0.7, 0.8, 0.9))
        .with(BodyPart::RightWrist, Keypoint::new(0.3, 0.8, 0.9))
        .with(BodyPart::LeftElbow, Keypoint::new(0.7, 0.65, 0.9))
        .with(BodyPart::RightElbow, Keypoint::new(0.3, 0.65, 0.9))
}

#[test]
fn dark_then_bright_fires_one_low_light_alert_on_first_frame() -> Result<()> {
    let schedule = LumaSchedule::once(vec![(10, 5), (200, 15)]);
    let mut source = SyntheticSource::with_schedule(source_config(), schedule);
    source.connect()?;
    let mut pose = StubBackend::new();
    let recorder = Recorder::default();
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(recorder.clone()));

    let stop = AtomicBool::new(false);
    let summary = pipeline.run(&mut source, &mut pose, &stop, None)?;

    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.stats.frames_processed, 20);
    assert_eq!(summary.stats.low_light_alerts, 1);
    assert_eq!(summary.stats.gesture_alerts, 0);
    assert_eq!(summary.stats.no_pose_frames, 20);
    assert_eq!(
        recorder.sent.lock().unwrap().as_slice(),
        &[AlertKind::LowLight.title().to_string()]
    );
    Ok(())
}

#[test]
fn dark_frames_report_alert_on_frame_one_only() -> Result<()> {
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));
    let t0 = Instant::now();
    let mut fired_on = Vec::new();
    for i in 1..=20u64 {
        let luma = if i <= 5 { 10 } else { 200 };
        let frame = Frame::uniform(32, 24, PixelFormat::Bgr24, luma)?;
        let report = pipeline.process_frame(&frame, None, t0 + Duration::from_millis(100 * i));
        if report.alerts.contains(&AlertKind::LowLight) {
            fired_on.push(i);
        }
    }
    assert_eq!(fired_on, vec![1]);
    Ok(())
}

#[test]
fn sustained_gesture_repeats_at_cooldown_cadence() -> Result<()> {
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));
    let frame = Frame::uniform(32, 24, PixelFormat::Bgr24, 200)?;
    let landmarks = raised_arms();
    let t0 = Instant::now();

    let fired_at: Vec<u64> = (0..25u64)
        .filter(|&s| {
            let report = pipeline.process_frame(&frame, Some(&landmarks), t0 + Duration::from_secs(s));
            report.alerts.contains(&AlertKind::DistressGesture)
        })
        .collect();

    // Repeats need strictly more than the cooldown, so 1 Hz sampling lands on 11 and 22.
    assert_eq!(fired_at.len(), 3);
    assert_eq!(fired_at, vec![0, 11, 22]);
    assert_eq!(pipeline.stats().gesture_alerts, 3);
    Ok(())
}

#[test]
fn replayed_poses_drive_gesture_alerts() -> Result<()> {
    let raised = serde_json::to_string(&raised_arms())?;
    let down = serde_json::to_string(&arms_down())?;
    let mut file = tempfile::NamedTempFile::new()?;
    for record in [
        format!(r#"{{"score": 0.9, "landmarks": {}}}"#, raised),
        format!(r#"{{"score": 0.9, "landmarks": {}}}"#, raised),
        "null".to_string(),
        format!(r#"{{"score": 0.9, "landmarks": {}}}"#, raised),
        format!(r#"{{"score": 0.9, "landmarks": {}}}"#, down),
        format!(r#"{{"score": 0.9, "landmarks": {}}}"#, raised),
    ] {
        writeln!(file, "{}", record)?;
    }

    let mut pose = ReplayBackend::open(file.path(), 0.5)?;
    let mut source = SyntheticSource::with_schedule(
        source_config(),
        LumaSchedule::once(vec![(200, 6)]),
    );
    let recorder = Recorder::default();
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(recorder.clone()));

    let summary = pipeline.run(&mut source, &mut pose, &AtomicBool::new(false), None)?;

    // Onset on frame 1; frames 2-4 suppressed (frame 3 had nobody, channel frozen);
    // frame 5 lowers the arms and resets; frame 6 is a fresh onset.
    assert_eq!(summary.stats.gesture_alerts, 2);
    assert_eq!(summary.stats.no_pose_frames, 1);
    assert_eq!(summary.stats.low_light_alerts, 0);
    assert_eq!(
        recorder.sent.lock().unwrap().as_slice(),
        &[
            AlertKind::DistressGesture.title().to_string(),
            AlertKind::DistressGesture.title().to_string()
        ]
    );
    Ok(())
}

#[test]
fn stop_flag_and_frame_limit_end_the_loop() -> Result<()> {
    let mut pose = StubBackend::new();
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));

    let mut source = SyntheticSource::with_schedule(source_config(), LumaSchedule::constant(100));
    let stopped = pipeline.run(&mut source, &mut pose, &AtomicBool::new(true), None)?;
    assert_eq!(stopped.stop_reason, StopReason::StopRequested);
    assert_eq!(stopped.stats.frames_processed, 0);

    let limited = pipeline.run(&mut source, &mut pose, &AtomicBool::new(false), Some(7))?;
    assert_eq!(limited.stop_reason, StopReason::FrameLimit);
    assert_eq!(limited.stats.frames_processed, 7);
    assert_eq!(pose.frames_seen(), 7);
    Ok(())
}

struct FailingSource {
    frames_left: u32,
}

impl FrameSource for FailingSource {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frames_left == 0 {
            return Err(anyhow!("camera unplugged"));
        }
        self.frames_left -= 1;
        Ok(Some(Frame::uniform(4, 4, PixelFormat::Gray8, 10)?))
    }

    fn is_healthy(&self) -> bool {
        self.frames_left > 0
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: 0,
            url: "test://failing".to_string(),
        }
    }
}

#[test]
fn acquisition_failure_is_fatal() {
    let mut source = FailingSource { frames_left: 2 };
    let mut pose = StubBackend::new();
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));

    let err = pipeline
        .run(&mut source, &mut pose, &AtomicBool::new(false), None)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("camera unplugged"));
    assert_eq!(pipeline.stats().frames_processed, 2);
    assert_eq!(pipeline.stats().low_light_alerts, 1);
}

struct FlakyPose {
    calls: u32,
}

impl PoseBackend for FlakyPose {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        self.calls += 1;
        if self.calls == 2 {
            return Err(anyhow!("inference timed out"));
        }
        Ok(Some(raised_arms()))
    }
}

#[test]
fn pose_errors_skip_the_frame_without_touching_the_channel() -> Result<()> {
    let mut source =
        SyntheticSource::with_schedule(source_config(), LumaSchedule::once(vec![(200, 3)]));
    let mut pose = FlakyPose { calls: 0 };
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));

    let summary = pipeline.run(&mut source, &mut pose, &AtomicBool::new(false), None)?;
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.stats.pose_errors, 1);
    assert_eq!(summary.stats.gesture_alerts, 1);
    assert!(pipeline.gesture_channel().is_active());
    Ok(())
}

#[test]
fn pose_errors_do_not_reset_the_channel_under_reset_policy() -> Result<()> {
    let mut source =
        SyntheticSource::with_schedule(source_config(), LumaSchedule::once(vec![(200, 3)]));
    let mut pose = FlakyPose { calls: 0 };
    let settings = PipelineSettings {
        no_pose_policy: NoPosePolicy::Reset,
        ..PipelineSettings::default()
    };
    let mut pipeline = MonitoringPipeline::new(settings, Box::new(Recorder::default()));

    let summary = pipeline.run(&mut source, &mut pose, &AtomicBool::new(false), None)?;
    assert_eq!(summary.stats.pose_errors, 1);
    assert_eq!(summary.stats.no_pose_frames, 0);
    assert_eq!(summary.stats.gesture_alerts, 1);
    assert!(pipeline.gesture_channel().is_active());
    Ok(())
}

/// Replays dark frames stamped with fixed capture times.
struct StampedSource {
    stamps: Vec<Instant>,
    next: usize,
}

impl FrameSource for StampedSource {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stamp) = self.stamps.get(self.next).copied() else {
            return Ok(None);
        };
        self.next += 1;
        let frame = Frame::uniform(4, 4, PixelFormat::Gray8, 5)?.with_captured_at(stamp);
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.next as u64,
            url: "test://stamped".to_string(),
        }
    }
}

#[test]
fn cooldown_is_measured_on_capture_timestamps() -> Result<()> {
    let t0 = Instant::now();
    let mut source = StampedSource {
        stamps: vec![
            t0,
            t0 + Duration::from_secs(5),
            t0 + Duration::from_secs(11),
            t0 + Duration::from_secs(15),
            t0 + Duration::from_secs(22),
        ],
        next: 0,
    };
    let mut pose = StubBackend::new();
    let mut pipeline =
        MonitoringPipeline::new(PipelineSettings::default(), Box::new(Recorder::default()));

    // The loop runs in microseconds; only the stamps can space these alerts out.
    let summary = pipeline.run(&mut source, &mut pose, &AtomicBool::new(false), None)?;
    assert_eq!(summary.stats.frames_processed, 5);
    assert_eq!(summary.stats.low_light_alerts, 3);
    assert_eq!(
        pipeline.low_light_channel().last_fired_at(),
        Some(t0 + Duration::from_secs(22))
    );
    Ok(())
}
