#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            title: "Error".to_string(),
            message,
            severity: Severity::Error,
        }
    }
}

/// Presents mutation outcomes to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
