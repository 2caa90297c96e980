//! Notifier implementations.
//!
//! # Invariants
//! - Reminder text reaches external programs only as a separate argument,
//!   never through a shell.

use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::Command;

/// Title shown on every reminder notification.
pub const NOTIFICATION_TITLE: &str = "Reminder";

#[derive(Debug)]
pub enum NotifyError {
    /// The notification program could not be started.
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },
    /// The notification program exited with a failure status.
    Failed {
        program: &'static str,
        status: Option<i32>,
        stderr: String,
    },
    /// No notification program is known for this platform.
    Unsupported,
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "failed to run {program}: {source}"),
            Self::Failed {
                program,
                status,
                stderr,
            } => match status {
                Some(code) => write!(f, "{program} exited with status {code}: {stderr}"),
                None => write!(f, "{program} was terminated by a signal: {stderr}"),
            },
            Self::Unsupported => write!(f, "desktop notifications are not supported here"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Delivers one notification to the user.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(title, body)
    }
}

/// Notifier backend chosen in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Native desktop notifications.
    #[default]
    Desktop,
    /// Log lines only.
    Log,
}

impl NotifierKind {
    pub fn build(self) -> Box<dyn Notifier> {
        match self {
            Self::Desktop => Box::new(CommandNotifier::for_current_platform()),
            Self::Log => Box::new(LogNotifier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    AppleScript,
    NotifySend,
    None,
}

/// Shells out to the platform notification tool.
#[derive(Debug, Clone, Copy)]
pub struct CommandNotifier {
    backend: Backend,
}

impl CommandNotifier {
    pub fn for_current_platform() -> Self {
        let backend = if cfg!(target_os = "macos") {
            Backend::AppleScript
        } else if cfg!(all(unix, not(target_os = "macos"))) {
            Backend::NotifySend
        } else {
            Backend::None
        };
        Self { backend }
    }

    fn command(&self, title: &str, body: &str) -> Result<(&'static str, Command), NotifyError> {
        match self.backend {
            Backend::AppleScript => {
                let mut command = Command::new("osascript");
                command.arg("-e").arg(format!(
                    "display notification \"{}\" with title \"{}\"",
                    escape_applescript(body),
                    escape_applescript(title)
                ));
                Ok(("osascript", command))
            }
            Backend::NotifySend => {
                let mut command = Command::new("notify-send");
                command.arg("--app-name=reminders").arg(title).arg(body);
                Ok(("notify-send", command))
            }
            Backend::None => Err(NotifyError::Unsupported),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let (program, mut command) = self.command(title, body)?;
        let output = command
            .output()
            .map_err(|source| NotifyError::Spawn { program, source })?;
        if !output.status.success() {
            return Err(NotifyError::Failed {
                program,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Records notifications in the log instead of showing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(
            "event=notification_deliver module=notify status=ok backend=log title_len={} body_len={}",
            title.chars().count(),
            body.chars().count()
        );
        Ok(())
    }
}

/// Escapes text for an AppleScript double-quoted string literal.
pub fn escape_applescript(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
