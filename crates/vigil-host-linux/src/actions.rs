//! Linux power action execution
//!
//! Each action maps to an ordered list of commands; the first one that exits
//! successfully wins. The lists cover systemd hosts first, then the older
//! fallbacks still found on non-systemd desktops.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};
use vigil_api::ActionKind;
use vigil_host_api::{ActionCapabilities, ActionError, ActionExecutor, ActionResult};

/// Command chains per action, in preference order
fn command_chain(action: ActionKind) -> &'static [&'static [&'static str]] {
    match action {
        ActionKind::Shutdown => &[
            &["systemctl", "poweroff"],
            &["shutdown", "-h", "now"],
        ],
        ActionKind::Sleep => &[
            &["systemctl", "suspend"],
            &["pm-suspend"],
        ],
        ActionKind::Lock => &[
            &["loginctl", "lock-session"],
            &["gnome-screensaver-command", "--lock"],
            &["xdg-screensaver", "lock"],
            &["dm-tool", "lock"],
        ],
    }
}

/// Power action executor for Linux desktops
pub struct LinuxActionExecutor {
    capabilities: ActionCapabilities,
}

impl LinuxActionExecutor {
    pub fn new() -> Self {
        Self {
            capabilities: ActionCapabilities::linux_full(),
        }
    }
}

impl Default for LinuxActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionExecutor for LinuxActionExecutor {
    fn capabilities(&self) -> &ActionCapabilities {
        &self.capabilities
    }

    async fn perform(&self, action: ActionKind) -> ActionResult<()> {
        if !self.capabilities.supports(action) {
            return Err(ActionError::Unsupported { action });
        }

        let mut failures = Vec::new();

        for argv in command_chain(action) {
            let (program, args) = (argv[0], &argv[1..]);
            debug!(action = %action, program, "Attempting power action command");

            let result = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            match result {
                Ok(status) if status.success() => {
                    debug!(action = %action, program, "Power action command succeeded");
                    return Ok(());
                }
                Ok(status) => {
                    warn!(action = %action, program, %status, "Power action command failed");
                    failures.push(format!("{program}: {status}"));
                }
                Err(e) => {
                    warn!(action = %action, program, error = %e, "Power action command not runnable");
                    failures.push(format!("{program}: {e}"));
                }
            }
        }

        Err(ActionError::AllCommandsFailed {
            action,
            detail: failures.join("; "),
        })
    }
}
