//! Operator notification.
//!
//! Delivery is fire-and-forget: a failed notification is logged by the
//! pipeline and never feeds back into alert state.
//!
//! Backends:
//! - `log`: a warn-level log line
//! - `command`: spawns a desktop notifier such as `notify-send`

use anyhow::{anyhow, Result};

mod command;

pub use command::CommandNotifier;

pub trait Notifier: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Deliver one notification. Must not block for long.
    fn notify(&mut self, title: &str, body: &str) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<()> {
        log::warn!("ALERT {}: {}", title, body);
        Ok(())
    }
}

/// Build the notifier named in configuration.
pub fn build_notifier(kind: &str, command: &[String]) -> Result<Box<dyn Notifier>> {
    match kind {
        "log" => Ok(Box::new(LogNotifier)),
        "command" => Ok(Box::new(CommandNotifier::new(command.to_vec())?)),
        other => Err(anyhow!(
            "unknown notifier '{}'; expected 'log' or 'command'",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_notifier_selects_backend() -> Result<()> {
        assert_eq!(build_notifier("log", &[])?.name(), "log");
        let cmd = vec!["notify-send".to_string()];
        assert_eq!(build_notifier("command", &cmd)?.name(), "command");
        Ok(())
    }

    #[test]
    fn build_notifier_rejects_unknown_or_empty_command() {
        assert!(build_notifier("toast", &[]).is_err());
        assert!(build_notifier("command", &[]).is_err());
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.notify("title", "body").is_ok());
    }
}
