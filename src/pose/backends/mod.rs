mod replay;
mod stub;

pub use replay::{ReplayBackend, DEFAULT_MIN_DETECTION_CONFIDENCE};
pub use stub::StubBackend;
