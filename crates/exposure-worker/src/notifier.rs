//! Notifier that logs presentations and coalesces duplicates.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use exposure_core::Notification;

use crate::collaborators::Notifier;

/// Presents notifications through `tracing`.
///
/// A presentation whose identifier was presented inside the dedupe window
/// replaces that earlier one. Once the window has passed it is shown as a
/// separate notification.
pub struct LogNotifier {
    dedupe_window: Duration,
    visible: Mutex<Vec<(Notification, Instant)>>,
}

impl LogNotifier {
    /// Create a notifier with the given dedupe window.
    pub fn new(dedupe_window: Duration) -> Self {
        Self {
            dedupe_window,
            visible: Mutex::new(Vec::new()),
        }
    }

    /// Notifications currently visible, oldest first.
    pub async fn visible(&self) -> Vec<Notification> {
        self.visible
            .lock()
            .await
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn present(&self, notification: Notification) {
        let mut visible = self.visible.lock().await;
        let now = Instant::now();

        let recent = visible.iter_mut().rev().find(|(shown, at)| {
            shown.identifier == notification.identifier
                && now.duration_since(*at) < self.dedupe_window
        });

        info!(
            identifier = %notification.identifier,
            title = %notification.title,
            replaced = recent.is_some(),
            "Presenting notification"
        );

        match recent {
            Some(entry) => *entry = (notification, now),
            None => visible.push((notification, now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_same_identifier_coalesces_inside_window() {
        let notifier = LogNotifier::new(Duration::from_secs(60));

        notifier
            .present(Notification::new("first", "body", "task-1"))
            .await;
        tokio::time::advance(Duration::from_secs(30)).await;
        notifier
            .present(Notification::new("second", "body", "task-1"))
            .await;

        let visible = notifier.visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_identifier_after_window_is_kept_separately() {
        let notifier = LogNotifier::new(Duration::from_secs(60));

        notifier
            .present(Notification::new("first", "body", "task-1"))
            .await;
        tokio::time::advance(Duration::from_secs(61)).await;
        notifier
            .present(Notification::new("second", "body", "task-1"))
            .await;

        let titles: Vec<_> = notifier
            .visible()
            .await
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_distinct_identifiers_are_kept() {
        let notifier = LogNotifier::default();

        notifier.present(Notification::new("a", "b", "task-1")).await;
        notifier.present(Notification::new("a", "b", "task-2")).await;

        assert_eq!(notifier.visible().await.len(), 2);
    }
}
