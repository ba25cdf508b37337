use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::alert::DEFAULT_ALERT_COOLDOWN;
use crate::brightness::DEFAULT_BRIGHTNESS_THRESHOLD;
use crate::ingest::SourceConfig;
use crate::pipeline::{NoPosePolicy, PipelineSettings};
use crate::pose::DEFAULT_MIN_DETECTION_CONFIDENCE;

const DEFAULT_POSE_BACKEND: &str = "none";
const DEFAULT_NOTIFIER: &str = "log";
const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    source: Option<SourceConfigFile>,
    pose: Option<PoseConfigFile>,
    alerts: Option<AlertConfigFile>,
    gesture: Option<GestureConfigFile>,
    notifier: Option<NotifierConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct PoseConfigFile {
    backend: Option<String>,
    min_detection_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    brightness_threshold: Option<f64>,
    cooldown_secs: Option<f64>,
    release_after: Option<u32>,
    no_pose_policy: Option<NoPosePolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct GestureConfigFile {
    min_visibility: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct NotifierConfigFile {
    kind: Option<String>,
    command: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    pub pose: PoseSettings,
    pub alerts: AlertSettings,
    pub gesture: GestureSettings,
    pub notifier: NotifierSettings,
}

#[derive(Debug, Clone)]
pub struct PoseSettings {
    /// `none` or `replay:<path>`.
    pub backend: String,
    pub min_detection_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub brightness_threshold: f64,
    pub cooldown: Duration,
    pub release_after: u32,
    pub no_pose_policy: NoPosePolicy,
}

#[derive(Debug, Clone)]
pub struct GestureSettings {
    pub min_visibility: f32,
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// `log` or `command`.
    pub kind: String,
    pub command: Vec<String>,
}

impl MonitorConfig {
    /// Load from the file named by `SOS_MONITOR_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SOS_MONITOR_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (or defaults), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let source_file = file.source.unwrap_or_default();
        let source = SourceConfig {
            url: source_file.url.unwrap_or(defaults.source.url),
            target_fps: source_file.target_fps.unwrap_or(defaults.source.target_fps),
            width: source_file.width.unwrap_or(defaults.source.width),
            height: source_file.height.unwrap_or(defaults.source.height),
        };

        let pose_file = file.pose.unwrap_or_default();
        let pose = PoseSettings {
            backend: pose_file.backend.unwrap_or(defaults.pose.backend),
            min_detection_confidence: pose_file
                .min_detection_confidence
                .unwrap_or(defaults.pose.min_detection_confidence),
        };

        let alerts_file = file.alerts.unwrap_or_default();
        let cooldown = match alerts_file.cooldown_secs {
            Some(secs) => duration_from_secs(secs, "alerts.cooldown_secs")?,
            None => defaults.alerts.cooldown,
        };
        let alerts = AlertSettings {
            brightness_threshold: alerts_file
                .brightness_threshold
                .unwrap_or(defaults.alerts.brightness_threshold),
            cooldown,
            release_after: alerts_file
                .release_after
                .unwrap_or(defaults.alerts.release_after),
            no_pose_policy: alerts_file
                .no_pose_policy
                .unwrap_or(defaults.alerts.no_pose_policy),
        };

        let gesture = GestureSettings {
            min_visibility: file
                .gesture
                .and_then(|gesture| gesture.min_visibility)
                .unwrap_or(defaults.gesture.min_visibility),
        };

        let notifier_file = file.notifier.unwrap_or_default();
        let notifier = NotifierSettings {
            kind: notifier_file.kind.unwrap_or(defaults.notifier.kind),
            command: notifier_file.command.unwrap_or(defaults.notifier.command),
        };

        Ok(Self {
            source,
            pose,
            alerts,
            gesture,
            notifier,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SOS_MONITOR_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("SOS_MONITOR_POSE_BACKEND") {
            if !backend.trim().is_empty() {
                self.pose.backend = backend;
            }
        }
        if let Ok(threshold) = std::env::var("SOS_MONITOR_BRIGHTNESS_THRESHOLD") {
            self.alerts.brightness_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("SOS_MONITOR_BRIGHTNESS_THRESHOLD must be a number"))?;
        }
        if let Ok(cooldown) = std::env::var("SOS_MONITOR_ALERT_COOLDOWN_SECS") {
            let secs: f64 = cooldown.trim().parse().map_err(|_| {
                anyhow!("SOS_MONITOR_ALERT_COOLDOWN_SECS must be a number of seconds")
            })?;
            self.set_cooldown_secs(secs, "SOS_MONITOR_ALERT_COOLDOWN_SECS")?;
        }
        if let Ok(visibility) = std::env::var("SOS_MONITOR_MIN_VISIBILITY") {
            self.gesture.min_visibility = visibility
                .trim()
                .parse()
                .map_err(|_| anyhow!("SOS_MONITOR_MIN_VISIBILITY must be a number"))?;
        }
        if let Ok(policy) = std::env::var("SOS_MONITOR_NO_POSE_POLICY") {
            self.alerts.no_pose_policy = policy.parse()?;
        }
        if let Ok(command) = std::env::var("SOS_MONITOR_NOTIFY_COMMAND") {
            let parsed: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if !parsed.is_empty() {
                self.notifier.kind = "command".to_string();
                self.notifier.command = parsed;
            }
        }
        Ok(())
    }

    /// Set the alert cooldown from seconds, rejecting negative, non-finite
    /// and overflowing values. `key` names the input in the error.
    pub fn set_cooldown_secs(&mut self, secs: f64, key: &str) -> Result<()> {
        self.alerts.cooldown = duration_from_secs(secs, key)?;
        Ok(())
    }

    /// Check ranges. Called by the loaders; call again after overriding fields by hand.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.alerts.brightness_threshold;
        if !(0.0..=255.0).contains(&threshold) {
            return Err(anyhow!(
                "brightness threshold must be within 0-255, got {}",
                threshold
            ));
        }
        if self.alerts.release_after == 0 {
            return Err(anyhow!("alerts.release_after must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.gesture.min_visibility) {
            return Err(anyhow!("gesture.min_visibility must be within 0-1"));
        }
        if !(0.0..=1.0).contains(&self.pose.min_detection_confidence) {
            return Err(anyhow!("pose.min_detection_confidence must be within 0-1"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source width and height must be greater than zero"));
        }
        match self.notifier.kind.as_str() {
            "log" => {}
            "command" if !self.notifier.command.is_empty() => {}
            "command" => return Err(anyhow!("notifier.command must name a program")),
            other => return Err(anyhow!("unknown notifier kind '{}'", other)),
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            brightness_threshold: self.alerts.brightness_threshold,
            cooldown: self.alerts.cooldown,
            release_after: self.alerts.release_after,
            min_visibility: self.gesture.min_visibility,
            no_pose_policy: self.alerts.no_pose_policy,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            pose: PoseSettings {
                backend: DEFAULT_POSE_BACKEND.to_string(),
                min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            },
            alerts: AlertSettings {
                brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
                cooldown: DEFAULT_ALERT_COOLDOWN,
                release_after: 1,
                no_pose_policy: NoPosePolicy::Freeze,
            },
            gesture: GestureSettings {
                min_visibility: 0.0,
            },
            notifier: NotifierSettings {
                kind: DEFAULT_NOTIFIER.to_string(),
                command: vec![DEFAULT_NOTIFY_COMMAND.to_string()],
            },
        }
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn duration_from_secs(secs: f64, key: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(anyhow!("{} must be a non-negative number of seconds", key));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("{} out of range: {}", key, e))
}
