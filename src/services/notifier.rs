use std::fmt;

/// How a message should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

/// Channel for user-facing messages raised by the ticket workflows.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn info(&self, message: &str) {
        self.notify(Notification {
            message: message.to_string(),
            level: NotificationLevel::Info,
        });
    }

    fn success(&self, message: &str) {
        self.notify(Notification {
            message: message.to_string(),
            level: NotificationLevel::Success,
        });
    }

    fn warning(&self, message: &str) {
        self.notify(Notification {
            message: message.to_string(),
            level: NotificationLevel::Warning,
        });
    }

    fn danger(&self, message: &str) {
        self.notify(Notification {
            message: message.to_string(),
            level: NotificationLevel::Danger,
        });
    }
}
