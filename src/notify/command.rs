use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};

use super::Notifier;

/// Runs an external program per notification, e.g. `["notify-send", "-u", "critical"]`.
///
/// Title and body are appended as the last two arguments. The child is not
/// waited on by the caller; a detached thread reaps it.
#[derive(Debug)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(mut command: Vec<String>) -> Result<Self> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(anyhow!("command notifier requires a program to run"));
        }
        let program = command.remove(0);
        Ok(Self {
            program,
            args: command,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Notifier for CommandNotifier {
    fn name(&self) -> &'static str {
        "command"
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn notifier {}", self.program))?;

        let program = self.program.clone();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                log::warn!("notifier {} exited with {}", program, status);
            }
            Ok(_) => {}
            Err(e) => log::warn!("notifier {} wait failed: {}", program, e),
        });
        Ok(())
    }
}
