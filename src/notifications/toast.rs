use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

impl Toast {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { severity: Severity::Info, title: title.into(), body: body.into() }
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { severity: Severity::Success, title: title.into(), body: body.into() }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { severity: Severity::Error, title: title.into(), body: body.into() }
    }
}

/// Whether the user allowed OS-level notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not asked yet; treated like `Denied`.
    #[default]
    Default,
}

impl NotificationPermission {
    pub fn is_granted(self) -> bool {
        self == NotificationPermission::Granted
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn toast(&self, toast: Toast);

    /// OS-level notification. Callers check the permission first.
    fn system(&self, title: &str, body: &str);
}

/// Notifier for headless runs: everything goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, toast: Toast) {
        match toast.severity {
            Severity::Error => error!(title = %toast.title, body = %toast.body, "toast"),
            _ => info!(title = %toast.title, body = %toast.body, severity = ?toast.severity, "toast"),
        }
    }

    fn system(&self, title: &str, body: &str) {
        info!(title, body, "system notification");
    }
}
