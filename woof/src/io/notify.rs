//! Fire-and-forget desktop notifications.

use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

pub const NOTIFICATION_TITLE: &str = "woof";

/// Receives notification requests. Implementations must never fail the caller.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Sends notifications through the platform's notification command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let Some(argv) = notification_command(title, message) else {
            debug!("no notification command for this platform");
            return;
        };
        let spawned = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                debug!(program = %argv[0], "notification dispatched");
                // Reap in the background; nobody waits on the result.
                thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(err) => debug!(program = %argv[0], err = %err, "notification failed"),
        }
    }
}

/// Platform command that shows a notification, if there is one.
pub fn notification_command(title: &str, message: &str) -> Option<Vec<String>> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            escape_applescript(message),
            escape_applescript(title)
        );
        Some(vec!["osascript".to_string(), "-e".to_string(), script])
    } else if cfg!(unix) {
        Some(vec![
            "notify-send".to_string(),
            title.to_string(),
            message.to_string(),
        ])
    } else {
        None
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
