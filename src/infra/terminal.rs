use crate::services::{Notification, Notifier, Severity};

/// Prints notifications: confirmations to stdout, failures to stderr.
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn new() -> Self {
        Self
    }

    fn render(notification: &Notification) -> String {
        format!("{}: {}", notification.title, notification.message)
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => println!("{}", Self::render(&notification)),
            Severity::Error => eprintln!("{}", Self::render(&notification)),
        }
    }
}
