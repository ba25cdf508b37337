//! SOS monitor
//!
//! Watches a live camera stream for two safety signals and alerts an operator:
//!
//! 1. **Low light**: mean frame luminance below a threshold.
//! 2. **Distress gesture**: both arms raised above the shoulders in a "Y".
//!
//! Each signal feeds its own debounced `AlertChannel`, which fires on onset,
//! repeats at the cooldown cadence while the condition persists, and resets
//! as soon as the condition is observed absent.
//!
//! # Module Structure
//!
//! - `frame`: validated frame container and pixel formats
//! - `ingest`: frame sources (synthetic, V4L2 camera, image directories)
//! - `pose`: landmark data and the pose model seam
//! - `brightness`, `gesture`: per-frame feature extraction
//! - `alert`: the debounce state machine
//! - `notify`: operator notification backends
//! - `overlay`: text annotations for display
//! - `pipeline`: per-frame orchestration and the monitoring loop
//! - `config`: file + env configuration

pub mod alert;
pub mod brightness;
pub mod config;
pub mod frame;
pub mod gesture;
pub mod ingest;
pub mod notify;
pub mod overlay;
pub mod pipeline;
pub mod pose;

pub use alert::{AlertChannel, AlertKind, ChannelState, DEFAULT_ALERT_COOLDOWN};
pub use brightness::{is_low_light, BrightnessEstimator, DEFAULT_BRIGHTNESS_THRESHOLD};
pub use config::MonitorConfig;
pub use frame::{Frame, PixelFormat};
pub use gesture::{GestureClassifier, GestureReading};
pub use ingest::{CameraSource, FrameSource, LumaSchedule, SourceConfig, SyntheticSource};
pub use notify::{build_notifier, CommandNotifier, LogNotifier, Notifier};
pub use pipeline::{
    FrameReport, GestureOutcome, MonitoringPipeline, NoPosePolicy, PipelineSettings,
    PipelineStats, PoseObservation, RunSummary, StopReason,
};
pub use pose::{open_backend, BodyPart, Keypoint, LandmarkSet, PoseBackend};
