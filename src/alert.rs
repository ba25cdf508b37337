//! Debounced alert channels.
//!
//! One `AlertChannel` per monitored condition turns the per-frame
//! true/false stream into sparse fire events:
//!
//! - the first true sample after a false one (or the very first sample) fires
//!   immediately;
//! - while the condition stays true, it fires again only once strictly more
//!   than `cooldown` has passed since the last fire;
//! - a false sample resets the channel, so the next true sample fires at once.
//!
//! `release_after` optionally requires several consecutive false samples
//! before the reset. The default of 1 is the plain behaviour above.

use std::time::{Duration, Instant};

/// Default spacing between repeated alerts for a continuously true condition.
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(10);

/// The conditions the monitor alerts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertKind {
    LowLight,
    DistressGesture,
}

impl AlertKind {
    pub fn title(self) -> &'static str {
        match self {
            AlertKind::LowLight => "Environment alert",
            AlertKind::DistressGesture => "Emergency alert",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            AlertKind::LowLight => "Very low light detected!",
            AlertKind::DistressGesture => "SOS gesture detected!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Inactive,
    Active,
}

// Internal phase. An active channel always has a fire time; an inactive one
// keeps the last fire time, if any, for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Inactive { last_fired_at: Option<Instant> },
    Active { last_fired_at: Instant },
}

#[derive(Clone, Debug)]
pub struct AlertChannel {
    cooldown: Duration,
    release_after: u32,
    phase: Phase,
    false_streak: u32,
}

impl AlertChannel {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            release_after: 1,
            phase: Phase::Inactive {
                last_fired_at: None,
            },
            false_streak: 0,
        }
    }

    /// Require `samples` consecutive false samples before the channel resets.
    /// Values below 1 are treated as 1.
    pub fn with_release_after(mut self, samples: u32) -> Self {
        self.release_after = samples.max(1);
        self
    }

    /// Feed one sample. Returns true when an alert should be dispatched.
    ///
    /// `now` must be non-decreasing across calls.
    pub fn sample(&mut self, condition: bool, now: Instant) -> bool {
        if !condition {
            self.false_streak = self.false_streak.saturating_add(1);
            if let Phase::Active { last_fired_at } = self.phase {
                if self.false_streak >= self.release_after {
                    self.phase = Phase::Inactive {
                        last_fired_at: Some(last_fired_at),
                    };
                }
            }
            return false;
        }
        self.false_streak = 0;

        let fire = match self.phase {
            Phase::Inactive { .. } => true,
            Phase::Active { last_fired_at } => {
                now.saturating_duration_since(last_fired_at) > self.cooldown
            }
        };
        if fire {
            self.phase = Phase::Active { last_fired_at: now };
        }
        fire
    }

    pub fn state(&self) -> ChannelState {
        match self.phase {
            Phase::Inactive { .. } => ChannelState::Inactive,
            Phase::Active { .. } => ChannelState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ChannelState::Active
    }

    pub fn last_fired_at(&self) -> Option<Instant> {
        match self.phase {
            Phase::Inactive { last_fired_at } => last_fired_at,
            Phase::Active { last_fired_at } => Some(last_fired_at),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn release_after(&self) -> u32 {
        self.release_after
    }
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: Duration = Duration::from_millis(1);

    #[test]
    fn onset_fires_on_fresh_channel() {
        let mut channel = AlertChannel::default();
        assert_eq!(channel.state(), ChannelState::Inactive);
        assert!(channel.last_fired_at().is_none());

        let t0 = Instant::now();
        assert!(channel.sample(true, t0));
        assert!(channel.is_active());
        assert_eq!(channel.last_fired_at(), Some(t0));
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        assert!(channel.sample(true, t0));
        assert!(!channel.sample(true, t0 + DEFAULT_ALERT_COOLDOWN / 2));
        // Suppressed samples do not move the timestamp.
        assert_eq!(channel.last_fired_at(), Some(t0));
    }

    #[test]
    fn exactly_one_cooldown_later_is_still_suppressed() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        assert!(channel.sample(true, t0));
        assert!(!channel.sample(true, t0 + DEFAULT_ALERT_COOLDOWN));
    }

    #[test]
    fn repeat_after_cooldown_fires() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        assert!(channel.sample(true, t0));
        let t1 = t0 + DEFAULT_ALERT_COOLDOWN + EPSILON;
        assert!(channel.sample(true, t1));
        assert_eq!(channel.last_fired_at(), Some(t1));
    }

    #[test]
    fn false_sample_resets_and_next_true_fires_immediately() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        assert!(channel.sample(true, t0));
        assert!(!channel.sample(false, t1));
        assert!(!channel.is_active());
        // last_fired_at survives the reset but does not gate the onset.
        assert_eq!(channel.last_fired_at(), Some(t0));
        assert!(channel.sample(true, t1 + EPSILON));
    }

    #[test]
    fn cooldown_restarts_from_the_latest_onset() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        let at = |secs: u64| t0 + Duration::from_secs(secs);

        assert!(channel.sample(true, at(0)));
        assert!(!channel.sample(false, at(8)));
        assert_eq!(channel.state(), ChannelState::Inactive);
        assert!(channel.sample(true, at(9)));
        assert_eq!(channel.last_fired_at(), Some(at(9)));
        // 11 s after the first fire but only 2 s after the new onset.
        assert!(!channel.sample(true, at(11)));
        assert!(channel.sample(true, at(20)));
    }

    #[test]
    fn false_samples_never_fire() {
        let mut channel = AlertChannel::default();
        let t0 = Instant::now();
        for i in 0..5 {
            assert!(!channel.sample(false, t0 + Duration::from_secs(i)));
        }
        assert!(channel.last_fired_at().is_none());
    }

    #[test]
    fn release_after_rides_through_short_dropouts() {
        let mut channel = AlertChannel::default().with_release_after(3);
        let t0 = Instant::now();
        let at = |secs: u64| t0 + Duration::from_secs(secs);

        assert!(channel.sample(true, at(0)));
        assert!(!channel.sample(false, at(1)));
        assert!(!channel.sample(false, at(2)));
        assert!(channel.is_active());
        // Two-frame dropout: no new onset.
        assert!(!channel.sample(true, at(3)));

        assert!(!channel.sample(false, at(4)));
        assert!(!channel.sample(false, at(5)));
        assert!(!channel.sample(false, at(6)));
        assert!(!channel.is_active());
        assert!(channel.sample(true, at(7)));
    }

    #[test]
    fn release_after_zero_behaves_like_one() {
        let channel = AlertChannel::new(Duration::from_secs(1)).with_release_after(0);
        assert_eq!(channel.release_after(), 1);
    }

    #[test]
    fn continuous_condition_fires_at_cooldown_cadence() {
        let mut channel = AlertChannel::new(Duration::from_secs(10));
        let t0 = Instant::now();
        let fired: Vec<u64> = (0..25)
            .filter(|&s| channel.sample(true, t0 + Duration::from_secs(s)))
            .collect();
        assert_eq!(fired, vec![0, 11, 22]);
    }
}
