mod notifier;
mod scheduler;
mod timer;

pub use notifier::{LogNotifier, Notification, Notifier, Permission, DEFAULT_TITLE};
pub use scheduler::{ArmState, NotificationScheduler};
pub use timer::{ManualTimerHost, TimerFire, TimerHost, TimerId, TokioTimerHost};
