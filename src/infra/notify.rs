use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::services::{Notification, NotificationLevel, Notifier};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Prints notifications as they are raised.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Danger | NotificationLevel::Warning => {
                eprintln!("[{}] {}", notification.level, notification.message)
            }
            _ => println!("[{}] {}", notification.level, notification.message),
        }
    }
}

/// Keeps raised notifications around for a display window and drops them
/// once it has passed. For front ends that show transient notices on screen;
/// the CLI prints through [`ConsoleNotifier`] instead.
pub struct NotificationCenter {
    ttl: Duration,
    entries: Mutex<Vec<(Instant, Notification)>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Notifications still inside their display window, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        let Ok(mut entries) = self.entries.lock() else {
            return Vec::new();
        };
        let ttl = self.ttl;
        entries.retain(|(raised_at, _)| raised_at.elapsed() < ttl);
        entries.iter().map(|(_, n)| n.clone()).collect()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((Instant::now(), notification));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notifications_expire_after_ttl() {
        let center = NotificationCenter::default();
        center.success("Ticket eliminado exitosamente");
        tokio::time::advance(Duration::from_secs(2)).await;
        center.danger("Error al eliminar el ticket");

        let active = center.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].level, NotificationLevel::Success);

        tokio::time::advance(Duration::from_millis(1500)).await;
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Error al eliminar el ticket");

        tokio::time::advance(NOTIFICATION_TTL).await;
        assert!(center.active().is_empty());
    }
}
