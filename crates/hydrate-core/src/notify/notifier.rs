use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_TITLE: &str = "Water Reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// The host has no notification facility at all.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Outbound notification sink.
///
/// Delivery is fire-and-forget: `notify` has no return value and a failed
/// delivery is not retried.
pub trait Notifier {
    /// Current permission, without prompting.
    fn permission(&self) -> Permission;

    /// Ask for permission. May prompt the user.
    fn request_permission(&mut self) -> Permission;

    fn notify(&mut self, notification: &Notification);
}

/// Delivers notifications as `tracing` events.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    permission: Permission,
}

impl LogNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(Permission::Granted)
    }
}

impl Notifier for LogNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission
    }

    fn notify(&mut self, notification: &Notification) {
        info!(title = %notification.title, "{}", notification.body);
    }
}
